use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analyzer::AnalysisKind;
use crate::classifier::ContentType;
use crate::error::AggregationError;
use crate::state::{PipelineState, Slot};

pub const ANALYSIS_VERSION: &str = "2.0";

const FAILED_REPORT: &str = "Failed to generate comprehensive final report";

/// A string list inside one slot's result.
type Source = (AnalysisKind, &'static [&'static str]);

const KEY_FINDINGS: [Source; 4] = [
    (AnalysisKind::Sentiment, &["recommendations", "content_strategy"]),
    (AnalysisKind::Video, &["recommendations", "content_optimization"]),
    (AnalysisKind::Document, &["recommendations", "content_improvements"]),
    (AnalysisKind::Trends, &["recommendations", "trend_optimization"]),
];

const IMMEDIATE: [Source; 2] = [
    (AnalysisKind::Sentiment, &["recommendations", "engagement_tactics"]),
    (AnalysisKind::Video, &["recommendations", "engagement_tactics"]),
];

/// Follows `categorization.reasoning`.
const SHORT_TERM: [Source; 1] = [(AnalysisKind::Trends, &["recommendations", "timing_strategy"])];

const LONG_TERM: [Source; 2] = [
    (AnalysisKind::MultiModal, &["optimizationRecommendations", "cross_modal_enhancement"]),
    (AnalysisKind::Trends, &["recommendations", "viral_enhancement"]),
];

// =============================================================================
// Report shape
// =============================================================================

/// The result of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Complete(Box<AnalysisReport>),
    /// The aggregator could not build a report from the collected slots.
    Failed(FailedReport),
}

impl Report {
    pub fn as_complete(&self) -> Option<&AnalysisReport> {
        match self {
            Report::Complete(report) => Some(report),
            Report::Failed(_) => None,
        }
    }

    pub fn overall_score(&self) -> Option<u32> {
        self.as_complete()
            .map(|r| r.insights.performance_metrics.overall_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedReport {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub summary: Summary,
    pub content_overview: ContentOverview,
    pub analysis: AnalysisSlots,
    pub insights: Insights,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub platform: String,
    pub content_type: ContentType,
    pub total_posts: Option<u64>,
    pub analyzed_at: DateTime<Utc>,
    pub has_errors: bool,
    pub analysis_completeness: Completeness,
}

/// Per-kind flag: the slot holds a real result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completeness {
    pub sentiment: bool,
    pub categorization: bool,
    pub video: bool,
    pub document: bool,
    pub multi_modal: bool,
    pub trends: bool,
    pub vibe: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentOverview {
    pub total_hashtags: usize,
    pub total_mentions: usize,
    pub media_count: usize,
    pub text_posts: usize,
    pub content_distribution: ContentDistribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDistribution {
    pub has_video: bool,
    pub has_document: bool,
    pub has_multi_modal: bool,
}

/// Verbatim copy of every slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSlots {
    pub sentiment: Slot,
    pub categorization: Slot,
    pub video: Slot,
    pub document: Slot,
    pub multi_modal: Slot,
    pub trends: Slot,
    pub vibe: Slot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub key_findings: Vec<String>,
    pub actionable_recommendations: ActionableRecommendations,
    pub performance_metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionableRecommendations {
    pub immediate: Vec<String>,
    pub short_term: Vec<String>,
    pub long_term: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub overall_score: u32,
    pub viral_potential: f64,
    pub engagement_prediction: f64,
    pub content_quality: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub run_id: Uuid,
    pub processing_time: DateTime<Utc>,
    pub analysis_version: &'static str,
    pub errors: Vec<String>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Build the report from everything the earlier stages left in `state`.
pub fn aggregate(state: &PipelineState) -> Result<AnalysisReport, AggregationError> {
    let slot = |kind| state.slot(kind);
    let content = state.preprocessed();
    let now = Utc::now();

    let summary = Summary {
        platform: state.platform_label().to_string(),
        content_type: state.content_type(),
        total_posts: content.map(|c| c.metadata.total_count),
        analyzed_at: now,
        has_errors: !state.errors().is_empty(),
        analysis_completeness: Completeness {
            sentiment: slot(AnalysisKind::Sentiment).is_complete(),
            categorization: slot(AnalysisKind::Categorization).is_complete(),
            video: slot(AnalysisKind::Video).is_complete(),
            document: slot(AnalysisKind::Document).is_complete(),
            multi_modal: slot(AnalysisKind::MultiModal).is_complete(),
            trends: slot(AnalysisKind::Trends).is_complete(),
            vibe: slot(AnalysisKind::Vibe).is_complete(),
        },
    };

    let content_overview = ContentOverview {
        total_hashtags: content.map_or(0, |c| c.hashtags.len()),
        total_mentions: content.map_or(0, |c| c.mentions.len()),
        media_count: content.map_or(0, |c| c.media_urls.len()),
        text_posts: content.map_or(0, |c| c.text_content.len()),
        content_distribution: ContentDistribution {
            has_video: slot(AnalysisKind::Video).is_complete(),
            has_document: slot(AnalysisKind::Document).is_complete(),
            has_multi_modal: slot(AnalysisKind::MultiModal).is_complete(),
        },
    };

    let key_findings = collect(state, &KEY_FINDINGS)?;

    let mut short_term = Vec::new();
    if let Some(reasoning) = string_at(slot(AnalysisKind::Categorization), "reasoning")? {
        short_term.push(reasoning);
    }
    short_term.extend(collect(state, &SHORT_TERM)?);

    let actionable_recommendations = ActionableRecommendations {
        immediate: collect(state, &IMMEDIATE)?,
        short_term,
        long_term: collect(state, &LONG_TERM)?,
    };

    let performance_metrics = PerformanceMetrics {
        overall_score: overall_score(state),
        viral_potential: number_or_zero(slot(AnalysisKind::Trends), &["viralPotential", "overall_score"]),
        engagement_prediction: number_or_zero(
            slot(AnalysisKind::MultiModal),
            &["engagementPrediction", "multi_modal_score"],
        ),
        content_quality: number_or_zero(
            slot(AnalysisKind::MultiModal),
            &["contentQuality", "production_quality"],
        ),
    };

    Ok(AnalysisReport {
        summary,
        content_overview,
        analysis: AnalysisSlots {
            sentiment: slot(AnalysisKind::Sentiment).clone(),
            categorization: slot(AnalysisKind::Categorization).clone(),
            video: slot(AnalysisKind::Video).clone(),
            document: slot(AnalysisKind::Document).clone(),
            multi_modal: slot(AnalysisKind::MultiModal).clone(),
            trends: slot(AnalysisKind::Trends).clone(),
            vibe: slot(AnalysisKind::Vibe).clone(),
        },
        insights: Insights {
            key_findings,
            actionable_recommendations,
            performance_metrics,
        },
        metadata: ReportMetadata {
            run_id: state.run_id(),
            processing_time: now,
            analysis_version: ANALYSIS_VERSION,
            errors: state.errors().to_vec(),
        },
    })
}

/// Average of the available score components on a 0-100 scale, rounded.
/// 0 when no component is available.
///
/// | slot       | path                                | range    | mapping      |
/// |------------|-------------------------------------|----------|--------------|
/// | sentiment  | `overallSentiment`                  | [-1, 1]  | `(x + 1) * 50` |
/// | video      | `viralPotential.score`              | [0, 100] | as-is        |
/// | document   | `relevanceScoring.curation_score`   | [0, 100] | as-is        |
/// | multiModal | `contentQuality.production_quality` | [0, 10]  | `x * 10`     |
/// | trends     | `viralPotential.overall_score`      | [0, 100] | as-is        |
pub fn overall_score(state: &PipelineState) -> u32 {
    const COMPONENTS: [(AnalysisKind, &[&str], f64, f64); 5] = [
        (AnalysisKind::Sentiment, &["overallSentiment"], -1.0, 1.0),
        (AnalysisKind::Video, &["viralPotential", "score"], 0.0, 100.0),
        (AnalysisKind::Document, &["relevanceScoring", "curation_score"], 0.0, 100.0),
        (AnalysisKind::MultiModal, &["contentQuality", "production_quality"], 0.0, 10.0),
        (AnalysisKind::Trends, &["viralPotential", "overall_score"], 0.0, 100.0),
    ];

    let scores: Vec<f64> = COMPONENTS
        .iter()
        .filter_map(|&(kind, path, min, max)| {
            let x = state.slot(kind).lookup(path)?.as_f64()?;
            if !x.is_finite() || x < min || x > max {
                return None;
            }
            Some(match kind {
                AnalysisKind::Sentiment => (x + 1.0) * 50.0,
                AnalysisKind::MultiModal => x * 10.0,
                _ => x,
            })
        })
        .collect();

    if scores.is_empty() {
        return 0;
    }
    (scores.iter().sum::<f64>() / scores.len() as f64).round() as u32
}

/// The terminal `report` stage.
pub(crate) fn run(state: &mut PipelineState) {
    match aggregate(state) {
        Ok(report) => {
            info!(
                overall_score = report.insights.performance_metrics.overall_score,
                has_errors = report.summary.has_errors,
                "Report generated"
            );
            state.set_report(Report::Complete(Box::new(report)));
        }
        Err(e) => {
            warn!(run_id = %state.run_id(), error = %e, "Final report generation failed");
            state.push_error(format!("Final report generation failed: {e}"));
            state.set_report(Report::Failed(FailedReport {
                error: FAILED_REPORT.to_string(),
            }));
        }
    }
}

/// Concatenate string lists found at each (slot, path), in order.
/// Missing or null lists contribute nothing.
fn collect(state: &PipelineState, sources: &[Source]) -> Result<Vec<String>, AggregationError> {
    let mut out = Vec::new();
    for &(kind, path) in sources {
        let Some(value) = state.slot(kind).lookup(path) else {
            continue;
        };
        let not_a_list = || AggregationError::NotStringList {
            field: field_name(kind, path),
        };
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    out.push(item.as_str().ok_or_else(not_a_list)?.to_string());
                }
            }
            _ => return Err(not_a_list()),
        }
    }
    Ok(out)
}

/// A non-empty string at `key`, if any.
fn string_at(slot: &Slot, key: &str) -> Result<Option<String>, AggregationError> {
    match slot.lookup(&[key]) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AggregationError::NotString {
            field: format!("categorization.{key}"),
        }),
    }
}

fn number_or_zero(slot: &Slot, path: &[&str]) -> f64 {
    slot.lookup(path)
        .and_then(Value::as_f64)
        .filter(|x| x.is_finite())
        .unwrap_or(0.0)
}

fn field_name(kind: AnalysisKind, path: &[&str]) -> String {
    let mut name = kind.as_str().to_string();
    for key in path {
        name.push('.');
        name.push_str(key);
    }
    name
}
