use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClassifierConfig;
use crate::error::PipelineError;

/// Coarse label for a scrape result, used by the video and document stages
/// to decide whether they apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Document,
    Mixed,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Document => "document",
            ContentType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(ContentType::Video),
            "document" => Ok(ContentType::Document),
            "mixed" => Ok(ContentType::Mixed),
            other => Err(PipelineError::InvalidArgument(format!(
                "unknown content type '{other}' (expected video, document or mixed)"
            ))),
        }
    }
}

/// Ratio heuristic over raw post records.
///
/// Reads fields straight from the JSON so that a malformed record only
/// fails to count as video or document; it never makes classification fail.
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    video_threshold: f64,
    document_threshold: f64,
    document_min_chars: usize,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl ContentClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            video_threshold: config.video_threshold,
            document_threshold: config.document_threshold,
            document_min_chars: config.document_min_chars,
        }
    }

    /// `Video` when strictly more than the video threshold of posts carry
    /// video signals, else `Document` for long-form text, else `Mixed`.
    /// Missing or empty input is `Mixed`.
    pub fn classify(&self, posts: Option<&[Value]>) -> ContentType {
        let posts = match posts {
            Some(posts) if !posts.is_empty() => posts,
            _ => return ContentType::Mixed,
        };

        let (video_count, document_count) =
            posts.iter().fold((0usize, 0usize), |(video, document), post| {
                (
                    video + usize::from(is_video_post(post)),
                    document + usize::from(self.is_document_post(post)),
                )
            });

        let total = posts.len() as f64;
        let video_ratio = video_count as f64 / total;
        let document_ratio = document_count as f64 / total;

        if video_ratio > self.video_threshold {
            ContentType::Video
        } else if document_ratio > self.document_threshold {
            ContentType::Document
        } else {
            ContentType::Mixed
        }
    }

    fn is_document_post(&self, post: &Value) -> bool {
        let body = non_empty_str(post, "caption").or_else(|| non_empty_str(post, "text"));
        body.is_some_and(|text| text.chars().count() > self.document_min_chars)
    }
}

/// A video URL, a cover set, a play count or a duration marks a video post.
pub(crate) fn is_video_post(post: &Value) -> bool {
    non_empty_str(post, "videoUrl").is_some()
        || post.get("covers").is_some_and(|covers| !covers.is_null())
        || positive_number(post, "playCount")
        || positive_number(post, "duration")
}

fn non_empty_str<'a>(post: &'a Value, field: &str) -> Option<&'a str> {
    post.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn positive_number(post: &Value, field: &str) -> bool {
    post.get(field)
        .and_then(Value::as_f64)
        .is_some_and(|n| n > 0.0)
}
