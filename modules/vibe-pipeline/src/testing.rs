// Test doubles for the pipeline.
//
// - MockAnalyzer (Analyzer): per-kind canned replies, forced errors and
//   panics, call recording
// - ScriptedPipeline (ContentPipeline): per-item delays and failures for
//   exercising the batch scheduler
//
// Plus raw post builders shaped like the Instagram and TikTok scrapers'
// output.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::analyzer::{AnalysisKind, Analyzer};
use crate::batch::ContentPipeline;
use crate::classifier::ContentType;
use crate::error::PipelineError;
use crate::report::{self, Report};
use crate::runner::RunOptions;
use crate::state::PipelineState;
use crate::types::RawContent;

// ---------------------------------------------------------------------------
// MockAnalyzer
// ---------------------------------------------------------------------------

/// Replies `{"kind": <kind>}` unless told otherwise.
/// Builder pattern: `.responding()`, `.failing()`, `.panicking()`.
#[derive(Default)]
pub struct MockAnalyzer {
    responses: HashMap<AnalysisKind, Value>,
    failures: HashMap<AnalysisKind, String>,
    panics: HashSet<AnalysisKind>,
    calls: Mutex<Vec<(AnalysisKind, Value)>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned replies for every kind, carrying the score and
    /// recommendation keys the report reads.
    pub fn typical() -> Self {
        AnalysisKind::ALL
            .into_iter()
            .fold(Self::new(), |mock, kind| mock.responding(kind, typical_response(kind)))
    }

    pub fn responding(mut self, kind: AnalysisKind, response: Value) -> Self {
        self.responses.insert(kind, response);
        self
    }

    pub fn failing(mut self, kind: AnalysisKind, message: &str) -> Self {
        self.failures.insert(kind, message.to_string());
        self
    }

    pub fn panicking(mut self, kind: AnalysisKind) -> Self {
        self.panics.insert(kind);
        self
    }

    /// Every call so far, in call order.
    pub fn calls(&self) -> Vec<(AnalysisKind, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, kind: AnalysisKind) -> bool {
        self.calls.lock().unwrap().iter().any(|(k, _)| *k == kind)
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(&self, kind: AnalysisKind, payload: Value) -> Result<Value> {
        self.calls.lock().unwrap().push((kind, payload));

        if self.panics.contains(&kind) {
            panic!("mock analyzer panic for {kind}");
        }
        if let Some(message) = self.failures.get(&kind) {
            bail!("{message}");
        }
        Ok(self
            .responses
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| json!({ "kind": kind.as_str() })))
    }
}

pub fn typical_response(kind: AnalysisKind) -> Value {
    match kind {
        AnalysisKind::Sentiment => json!({
            "overallSentiment": 0.6,
            "sentimentDistribution": { "positive": 0.7, "neutral": 0.2, "negative": 0.1 },
            "recommendations": {
                "content_strategy": ["Lean into behind-the-scenes clips"],
                "engagement_tactics": ["Answer comments within the first hour"]
            }
        }),
        AnalysisKind::Categorization => json!({
            "primaryCategory": "Food",
            "secondaryCategories": ["Travel"],
            "qualityScore": 8,
            "reasoning": "Street food walkthroughs aimed at weekend visitors"
        }),
        AnalysisKind::Video => json!({
            "viralPotential": { "score": 82 },
            "recommendations": {
                "content_optimization": ["Open on the finished dish"],
                "engagement_tactics": ["Pin a question as the first comment"]
            }
        }),
        AnalysisKind::Document => json!({
            "relevanceScoring": { "curation_score": 64 },
            "recommendations": { "content_improvements": ["Add a short summary up top"] }
        }),
        AnalysisKind::MultiModal => json!({
            "engagementPrediction": { "multi_modal_score": 71 },
            "contentQuality": { "production_quality": 7 },
            "optimizationRecommendations": {
                "cross_modal_enhancement": ["Match caption tone to the audio"]
            }
        }),
        AnalysisKind::Trends => json!({
            "viralPotential": { "overall_score": 75, "growth_prediction": "linear" },
            "recommendations": {
                "trend_optimization": ["Use the current night-market audio"],
                "viral_enhancement": ["Invite duets"],
                "timing_strategy": ["Post Friday evenings"]
            }
        }),
        AnalysisKind::Vibe => json!({
            "vibe": "cozy",
            "description": "Warm, unhurried food content",
            "keywords": ["warm", "local"]
        }),
    }
}

// ---------------------------------------------------------------------------
// ScriptedPipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum ScriptOutcome {
    Report,
    Error,
    Panic,
}

/// Behaviour for one batch item, keyed by the item's `platform` label.
#[derive(Debug, Clone)]
pub struct ItemScript {
    delay: Duration,
    content_type: ContentType,
    outcome: ScriptOutcome,
}

impl Default for ItemScript {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            content_type: ContentType::Mixed,
            outcome: ScriptOutcome::Report,
        }
    }
}

impl ItemScript {
    pub fn delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn classified(content_type: ContentType) -> Self {
        Self {
            content_type,
            ..Self::default()
        }
    }

    pub fn error() -> Self {
        Self {
            outcome: ScriptOutcome::Error,
            ..Self::default()
        }
    }

    /// Panics while classifying.
    pub fn panic() -> Self {
        Self {
            outcome: ScriptOutcome::Panic,
            ..Self::default()
        }
    }
}

#[derive(Default)]
pub struct ScriptedPipeline {
    scripts: HashMap<String, ItemScript>,
    started: Mutex<Vec<tokio::time::Instant>>,
    finished: Mutex<Vec<String>>,
    variants: Mutex<Vec<String>>,
}

impl ScriptedPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, label: &str, script: ItemScript) -> Self {
        self.scripts.insert(label.to_string(), script);
        self
    }

    /// Start instant of every `run`, in start order.
    pub fn started_at(&self) -> Vec<tokio::time::Instant> {
        self.started.lock().unwrap().clone()
    }

    /// Labels in completion order.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    /// `"<label>:<variant>"` for every `run`.
    pub fn variants(&self) -> Vec<String> {
        self.variants.lock().unwrap().clone()
    }

    fn script_for(&self, raw: &RawContent) -> (String, ItemScript) {
        let label = raw.platform.clone().unwrap_or_default();
        let script = self.scripts.get(&label).cloned().unwrap_or_default();
        (label, script)
    }
}

#[async_trait]
impl ContentPipeline for ScriptedPipeline {
    fn classify(&self, raw: &RawContent) -> ContentType {
        let (label, script) = self.script_for(raw);
        if matches!(script.outcome, ScriptOutcome::Panic) {
            panic!("classifier blew up on {label}");
        }
        script.content_type
    }

    async fn run(
        &self,
        variant: &str,
        raw: Arc<RawContent>,
        options: RunOptions,
    ) -> Result<Report, PipelineError> {
        let (label, script) = self.script_for(&raw);
        self.started.lock().unwrap().push(tokio::time::Instant::now());
        self.variants.lock().unwrap().push(format!("{label}:{variant}"));

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        self.finished.lock().unwrap().push(label.clone());

        if matches!(script.outcome, ScriptOutcome::Error) {
            return Err(PipelineError::InvalidArgument(format!("scripted failure for {label}")));
        }

        let mut state = PipelineState::new(
            raw,
            options.content_type.unwrap_or(script.content_type),
            options.platform,
        );
        report::run(&mut state);
        state
            .into_report()
            .ok_or_else(|| PipelineError::InvalidArgument(format!("no report for {label}")))
    }
}

// ---------------------------------------------------------------------------
// Raw content builders
// ---------------------------------------------------------------------------

/// TikTok video record with engagement counters.
pub fn tiktok_video_post() -> Value {
    json!({
        "videoUrl": "x",
        "diggCount": 10,
        "commentCount": 2,
        "shareCount": 1,
        "playCount": 100,
        "duration": 15
    })
}

pub fn instagram_photo_post(caption: &str) -> Value {
    json!({
        "caption": caption,
        "displayUrl": "https://cdn.example/photo.jpg",
        "hashtags": ["food", "weekend"],
        "likesCount": 120,
        "commentsCount": 8
    })
}

/// Blog-style record with a caption over the long-form threshold.
pub fn long_form_post() -> Value {
    json!({
        "caption": format!("Where to eat this weekend. {}", "Plenty to say here. ".repeat(40)),
        "hashtags": ["guide"]
    })
}

pub fn tiktok_content(posts: usize) -> RawContent {
    RawContent::new((0..posts).map(|_| tiktok_video_post()).collect()).with_platform("tiktok")
}

pub fn document_content(posts: usize) -> RawContent {
    RawContent::new((0..posts).map(|_| long_form_post()).collect()).with_platform("blog")
}

pub fn mixed_content() -> RawContent {
    RawContent::new(vec![
        tiktok_video_post(),
        instagram_photo_post("Night market with @sam"),
        long_form_post(),
    ])
    .with_platform("instagram")
}
