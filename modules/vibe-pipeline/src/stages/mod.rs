// Stage identifiers and dispatch.
//
// Every stage takes the invocation's state by `&mut` and returns nothing:
// failures are written into the stage's own slot and the error list, so
// there is no error path back to the runner.

mod analysis;

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::analyzer::{AnalysisKind, Analyzer};
use crate::error::{PipelineError, StageError};
use crate::state::PipelineState;
use crate::{preprocess, report};

/// A named unit of work in a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageId {
    #[serde(rename = "preprocess")]
    Preprocess,
    #[serde(rename = "sentiment")]
    Sentiment,
    #[serde(rename = "categorize")]
    Categorize,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "multiModal")]
    MultiModal,
    #[serde(rename = "trends")]
    Trends,
    #[serde(rename = "vibe")]
    Vibe,
    #[serde(rename = "report")]
    Report,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Preprocess => "preprocess",
            StageId::Sentiment => "sentiment",
            StageId::Categorize => "categorize",
            StageId::Video => "video",
            StageId::Document => "document",
            StageId::MultiModal => "multiModal",
            StageId::Trends => "trends",
            StageId::Vibe => "vibe",
            StageId::Report => "report",
        }
    }

    /// The slot this stage writes, for analysis stages.
    pub fn slot(&self) -> Option<AnalysisKind> {
        match self {
            StageId::Preprocess | StageId::Report => None,
            StageId::Sentiment => Some(AnalysisKind::Sentiment),
            StageId::Categorize => Some(AnalysisKind::Categorization),
            StageId::Video => Some(AnalysisKind::Video),
            StageId::Document => Some(AnalysisKind::Document),
            StageId::MultiModal => Some(AnalysisKind::MultiModal),
            StageId::Trends => Some(AnalysisKind::Trends),
            StageId::Vibe => Some(AnalysisKind::Vibe),
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "preprocess" => StageId::Preprocess,
            "sentiment" => StageId::Sentiment,
            "categorize" => StageId::Categorize,
            "video" => StageId::Video,
            "document" => StageId::Document,
            "multiModal" | "multimodal" => StageId::MultiModal,
            "trends" => StageId::Trends,
            "vibe" => StageId::Vibe,
            "report" => StageId::Report,
            other => {
                return Err(PipelineError::InvalidArgument(format!(
                    "unknown stage '{other}'"
                )))
            }
        })
    }
}

/// What an analysis stage produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Completed(Value),
    Skipped(&'static str),
    Failed(StageError),
}

/// Run one stage against the state.
pub(crate) async fn execute(stage: StageId, state: &mut PipelineState, analyzer: &dyn Analyzer) {
    let span = tracing::info_span!("stage", stage = %stage);
    match stage.slot() {
        Some(kind) => analysis::run(kind, state, analyzer).instrument(span).await,
        None => span.in_scope(|| match stage {
            StageId::Preprocess => preprocess::run(state),
            _ => report::run(state),
        }),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stage_names() {
        assert_eq!("multiModal".parse::<StageId>().unwrap(), StageId::MultiModal);
        assert_eq!("multimodal".parse::<StageId>().unwrap(), StageId::MultiModal);
        assert_eq!("categorize".parse::<StageId>().unwrap(), StageId::Categorize);
        assert!("summarize".parse::<StageId>().is_err());
    }

    #[test]
    fn categorize_writes_the_categorization_slot() {
        assert_eq!(StageId::Categorize.slot(), Some(AnalysisKind::Categorization));
        assert_eq!(StageId::Report.slot(), None);
    }

    #[test]
    fn panic_messages_are_extracted() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
