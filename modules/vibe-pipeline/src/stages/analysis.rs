use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::{json, Value};
use tracing::debug;

use super::{panic_message, StageOutcome};
use crate::analyzer::{AnalysisKind, Analyzer};
use crate::classifier::{is_video_post, ContentType};
use crate::error::StageError;
use crate::state::{PipelineState, PreprocessedContent};
use crate::types::json_type;

/// What to do before any analyzer call.
enum Prepared {
    Call(Value),
    Skip(&'static str),
    Fail(StageError),
}

pub(super) async fn run(kind: AnalysisKind, state: &mut PipelineState, analyzer: &dyn Analyzer) {
    let outcome = match prepare(kind, state) {
        Prepared::Call(payload) => call(analyzer, kind, payload).await,
        Prepared::Skip(reason) => {
            debug!(stage = %kind, reason, "Stage skipped");
            StageOutcome::Skipped(reason)
        }
        Prepared::Fail(err) => StageOutcome::Failed(err),
    };
    state.record(kind, outcome);
}

/// Call the analyzer once. Errors, panics and non-object replies all
/// become `Failed`.
async fn call(analyzer: &dyn Analyzer, kind: AnalysisKind, payload: Value) -> StageOutcome {
    match AssertUnwindSafe(analyzer.analyze(kind, payload))
        .catch_unwind()
        .await
    {
        Ok(Ok(value)) if value.is_object() => StageOutcome::Completed(value),
        Ok(Ok(value)) => StageOutcome::Failed(StageError::Malformed(json_type(&value))),
        Ok(Err(e)) => StageOutcome::Failed(StageError::Analyzer(format!("{e:#}"))),
        Err(panic) => StageOutcome::Failed(StageError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn prepare(kind: AnalysisKind, state: &PipelineState) -> Prepared {
    let content = state.preprocessed();
    match kind {
        AnalysisKind::Sentiment => match content {
            Some(c) if !c.posts.is_empty() => Prepared::Call(Value::Array(c.posts.clone())),
            _ => Prepared::Fail(StageError::NoContent("No content to analyze")),
        },
        AnalysisKind::Categorization => match content {
            Some(c) => Prepared::Call(json!(c)),
            None => Prepared::Fail(StageError::NoContent("No preprocessed content available")),
        },
        AnalysisKind::Video => {
            if !matches!(state.content_type(), ContentType::Video | ContentType::Mixed) {
                return Prepared::Skip("Not video content");
            }
            match content {
                Some(c) if !c.posts.is_empty() => Prepared::Call(video_payload(c)),
                _ => Prepared::Fail(StageError::NoContent("No video content to analyze")),
            }
        }
        AnalysisKind::Document => {
            if !matches!(state.content_type(), ContentType::Document | ContentType::Mixed) {
                return Prepared::Skip("Not document content");
            }
            match content {
                Some(c) if !c.text_content.is_empty() => Prepared::Call(document_payload(c)),
                _ => Prepared::Fail(StageError::NoContent("No document content to analyze")),
            }
        }
        AnalysisKind::MultiModal => match content {
            Some(c) => Prepared::Call(multi_modal_payload(c, state)),
            None => Prepared::Fail(StageError::NoContent(
                "No content available for multi-modal analysis",
            )),
        },
        AnalysisKind::Trends => match content {
            Some(c) => Prepared::Call(json!({
                "content": c,
                "sentiment": state.slot(AnalysisKind::Sentiment),
                "video": state.slot(AnalysisKind::Video),
                "categories": state.slot(AnalysisKind::Categorization),
            })),
            None => Prepared::Fail(StageError::NoContent("No preprocessed content available")),
        },
        AnalysisKind::Vibe => match content {
            Some(c) => Prepared::Call(json!({
                "content": c,
                "sentiment": state.slot(AnalysisKind::Sentiment),
                "categories": state.slot(AnalysisKind::Categorization),
            })),
            None => Prepared::Fail(StageError::NoContent("No preprocessed content available")),
        },
    }
}

fn video_payload(content: &PreprocessedContent) -> Value {
    let video_posts: Vec<&Value> = content.posts.iter().filter(|p| is_video_post(p)).collect();
    let engagement: Vec<_> = content.parsed.iter().map(|p| p.engagement()).collect();
    json!({
        "posts": video_posts,
        "metadata": content.metadata,
        "hashtags": content.hashtags,
        "engagement": engagement,
    })
}

fn document_payload(content: &PreprocessedContent) -> Value {
    let texts = &content.text_content;
    let total_chars: usize = texts.iter().map(|t| t.chars().count()).sum();
    json!({
        "content": texts.join("\n\n"),
        "metadata": content.metadata,
        "hashtags": content.hashtags,
        "mentions": content.mentions,
        "structure": {
            "totalParagraphs": texts.len(),
            "averageLength": total_chars as f64 / texts.len() as f64,
        },
    })
}

fn multi_modal_payload(content: &PreprocessedContent, state: &PipelineState) -> Value {
    let video = state.slot(AnalysisKind::Video);
    let document = state.slot(AnalysisKind::Document);
    json!({
        "textContent": content.text_content,
        "mediaUrls": content.media_urls,
        "metadata": content.metadata,
        "sentiment": state.slot(AnalysisKind::Sentiment),
        "videoInsights": video,
        "documentInsights": document,
        "crossModalElements": {
            "hasText": !content.text_content.is_empty(),
            "hasMedia": !content.media_urls.is_empty(),
            "hasVideo": video.is_complete(),
            "hasDocument": document.is_complete(),
        },
    })
}
