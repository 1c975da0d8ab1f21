use std::collections::BTreeSet;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::analyzer::AnalysisKind;
use crate::classifier::ContentType;
use crate::report::Report;
use crate::stages::StageOutcome;
use crate::types::{Post, RawContent};

// =============================================================================
// Slot
// =============================================================================

/// One analysis result slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Slot {
    /// The stage has not run (or is not part of the variant).
    #[default]
    Absent,
    /// A well-formed analyzer result. Always a JSON object.
    Ready(Value),
    Skipped(String),
    Errored(String),
}

impl Slot {
    /// Present, and neither a skip nor an error marker.
    pub fn is_complete(&self) -> bool {
        matches!(self, Slot::Ready(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Slot::Skipped(_))
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Slot::Errored(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Walk a key path into the result. `None` for non-ready slots.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self.result()?, |value, key| value.get(*key))
    }
}

/// absent → `null`, result → verbatim, skipped → `{"skipped": reason}`,
/// errored → `{"error": message}`.
impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Slot::Absent => serializer.serialize_none(),
            Slot::Ready(value) => value.serialize(serializer),
            Slot::Skipped(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("skipped", reason)?;
                map.end()
            }
            Slot::Errored(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

// =============================================================================
// Preprocessed content
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub platform: String,
    pub total_count: u64,
    pub scraped_at: String,
}

/// Canonical view of one scrape result, built by the preprocess stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessedContent {
    pub posts: Vec<Value>,
    pub metadata: ContentMetadata,
    pub text_content: Vec<String>,
    pub media_urls: Vec<String>,
    pub hashtags: BTreeSet<String>,
    pub mentions: BTreeSet<String>,
    /// Typed views of `posts`, index-aligned.
    #[serde(skip)]
    pub(crate) parsed: Vec<Post>,
}

// =============================================================================
// PipelineState
// =============================================================================

/// State threaded through the stages of one pipeline invocation.
///
/// Owned by exactly one invocation. Stages write only their own slot and
/// append to `errors`.
#[derive(Debug)]
pub struct PipelineState {
    run_id: Uuid,
    raw: Arc<RawContent>,
    content_type: ContentType,
    platform: Option<String>,
    preprocessed: Option<PreprocessedContent>,
    slots: [Slot; 7],
    errors: Vec<String>,
    final_report: Option<Report>,
}

impl PipelineState {
    pub fn new(raw: Arc<RawContent>, content_type: ContentType, platform: Option<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            raw,
            content_type,
            platform,
            preprocessed: None,
            slots: Default::default(),
            errors: Vec::new(),
            final_report: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn raw(&self) -> &RawContent {
        &self.raw
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Caller-supplied platform label, if any.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// The caller's label, else the scrape's, else `"unknown"`.
    pub fn platform_label(&self) -> &str {
        self.platform
            .as_deref()
            .or(self.raw.platform.as_deref())
            .unwrap_or("unknown")
    }

    pub fn preprocessed(&self) -> Option<&PreprocessedContent> {
        self.preprocessed.as_ref()
    }

    pub fn slot(&self, kind: AnalysisKind) -> &Slot {
        &self.slots[kind.index()]
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn final_report(&self) -> Option<&Report> {
        self.final_report.as_ref()
    }

    pub fn into_report(self) -> Option<Report> {
        self.final_report
    }

    pub(crate) fn set_preprocessed(&mut self, content: PreprocessedContent) {
        self.preprocessed = Some(content);
    }

    pub(crate) fn push_error(&mut self, message: String) {
        self.errors.push(message);
    }

    pub(crate) fn set_report(&mut self, report: Report) {
        self.final_report = Some(report);
    }

    /// Write a stage's outcome into its own slot. Failures are also
    /// appended to `errors` as "<label> failed: <message>".
    pub(crate) fn record(&mut self, kind: AnalysisKind, outcome: StageOutcome) {
        let slot = match outcome {
            StageOutcome::Completed(value) => Slot::Ready(value),
            StageOutcome::Skipped(reason) => Slot::Skipped(reason.to_string()),
            StageOutcome::Failed(err) => {
                let message = err.to_string();
                warn!(run_id = %self.run_id, stage = %kind, error = %message, "Stage failed");
                self.errors
                    .push(format!("{} failed: {}", kind.failure_label(), message));
                Slot::Errored(message)
            }
        };
        self.slots[kind.index()] = slot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use serde_json::json;

    fn state() -> PipelineState {
        PipelineState::new(Arc::new(RawContent::default()), ContentType::Mixed, None)
    }

    #[test]
    fn platform_label_prefers_caller_then_scrape() {
        assert_eq!(state().platform_label(), "unknown");

        let raw = Arc::new(RawContent::default().with_platform("tiktok"));
        let from_scrape = PipelineState::new(raw.clone(), ContentType::Mixed, None);
        assert_eq!(from_scrape.platform_label(), "tiktok");

        let from_caller = PipelineState::new(raw, ContentType::Mixed, Some("instagram".into()));
        assert_eq!(from_caller.platform_label(), "instagram");
    }

    #[test]
    fn slots_serialize_with_markers() {
        assert_eq!(serde_json::to_value(Slot::Absent).unwrap(), Value::Null);
        assert_eq!(
            serde_json::to_value(Slot::Ready(json!({ "score": 1 }))).unwrap(),
            json!({ "score": 1 })
        );
        assert_eq!(
            serde_json::to_value(Slot::Skipped("Not video content".into())).unwrap(),
            json!({ "skipped": "Not video content" })
        );
        assert_eq!(
            serde_json::to_value(Slot::Errored("boom".into())).unwrap(),
            json!({ "error": "boom" })
        );
    }

    #[test]
    fn lookup_walks_ready_results_only() {
        let slot = Slot::Ready(json!({ "viralPotential": { "score": 80 } }));
        assert_eq!(slot.lookup(&["viralPotential", "score"]), Some(&json!(80)));
        assert_eq!(slot.lookup(&["viralPotential", "missing"]), None);
        assert_eq!(Slot::Errored("x".into()).lookup(&["viralPotential"]), None);
    }

    #[test]
    fn failures_fill_own_slot_and_error_list() {
        let mut state = state();
        state.record(
            AnalysisKind::Sentiment,
            StageOutcome::Failed(StageError::Analyzer("rate limited".into())),
        );

        assert_eq!(
            state.slot(AnalysisKind::Sentiment),
            &Slot::Errored("rate limited".into())
        );
        assert_eq!(state.errors(), ["Sentiment analysis failed: rate limited"]);
        for kind in AnalysisKind::ALL.into_iter().skip(1) {
            assert_eq!(state.slot(kind), &Slot::Absent);
        }
    }

    #[test]
    fn skips_are_not_errors() {
        let mut state = state();
        state.record(AnalysisKind::Video, StageOutcome::Skipped("Not video content"));
        assert!(state.slot(AnalysisKind::Video).is_skipped());
        assert!(state.errors().is_empty());
    }

    #[test]
    fn calling_record_again_for_the_same_kind_replaces_the_slot() {
        let mut state = state();
        state.record(AnalysisKind::Trends, StageOutcome::Completed(json!({ "a": 1 })));
        state.record(AnalysisKind::Trends, StageOutcome::Completed(json!({ "a": 2 })));
        assert_eq!(state.slot(AnalysisKind::Trends).result(), Some(&json!({ "a": 2 })));
    }
}
