// The external analysis boundary.
//
// Every AI-backed stage goes through one `Analyzer`, injected once when the
// runner is built and shared by all concurrent invocations. Implementations
// hold no per-call mutable state.

mod llm;
mod prompts;

pub use llm::LlmAnalyzer;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// One kind of analysis, and the state slot that holds its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisKind {
    Sentiment,
    Categorization,
    Video,
    Document,
    MultiModal,
    Trends,
    Vibe,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 7] = [
        AnalysisKind::Sentiment,
        AnalysisKind::Categorization,
        AnalysisKind::Video,
        AnalysisKind::Document,
        AnalysisKind::MultiModal,
        AnalysisKind::Trends,
        AnalysisKind::Vibe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Sentiment => "sentiment",
            AnalysisKind::Categorization => "categorization",
            AnalysisKind::Video => "video",
            AnalysisKind::Document => "document",
            AnalysisKind::MultiModal => "multiModal",
            AnalysisKind::Trends => "trends",
            AnalysisKind::Vibe => "vibe",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    /// Prefix for entries in the state's error list.
    pub(crate) fn failure_label(&self) -> &'static str {
        match self {
            AnalysisKind::Sentiment => "Sentiment analysis",
            AnalysisKind::Categorization => "Content categorization",
            AnalysisKind::Video => "Video analysis",
            AnalysisKind::Document => "Document analysis",
            AnalysisKind::MultiModal => "Multi-modal analysis",
            AnalysisKind::Trends => "Trend analysis",
            AnalysisKind::Vibe => "Vibe analysis",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external analysis service.
///
/// Called concurrently from many pipeline invocations. May fail; the
/// pipeline never retries a call.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, kind: AnalysisKind, payload: Value) -> Result<Value>;
}
