use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::PreprocessError;
use crate::state::{ContentMetadata, PipelineState, PreprocessedContent};
use crate::types::{Post, RawContent};

static RE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").unwrap());

/// Normalize a scrape result.
///
/// Texts and media URLs keep post order. Hashtags and mentions are
/// deduplicated. A post that is not an object fails the whole scrape;
/// wrongly typed fields inside a post are ignored.
pub fn preprocess(raw: &RawContent) -> Result<PreprocessedContent, PreprocessError> {
    let posts = raw.posts();
    let parsed = posts
        .iter()
        .enumerate()
        .map(|(index, value)| {
            Post::parse(value).map_err(|source| PreprocessError::MalformedPost { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut text_content = Vec::new();
    let mut media_urls = Vec::new();
    let mut hashtags = BTreeSet::new();
    let mut mentions = BTreeSet::new();

    for post in &parsed {
        text_content.extend(post.texts().map(str::to_string));
        media_urls.extend(post.media_urls().map(str::to_string));
        hashtags.extend(post.hashtags.iter().cloned());
        if let Some(body) = post.body() {
            mentions.extend(
                RE_MENTION
                    .captures_iter(body)
                    .map(|caps| caps[1].to_string()),
            );
        }
    }

    let metadata = ContentMetadata {
        platform: raw.platform.clone().unwrap_or_else(|| "unknown".to_string()),
        total_count: raw.count.unwrap_or(posts.len() as u64),
        scraped_at: raw
            .scraped_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    };

    Ok(PreprocessedContent {
        posts: posts.to_vec(),
        metadata,
        text_content,
        media_urls,
        hashtags,
        mentions,
        parsed,
    })
}

/// The `preprocess` stage. On failure the content stays unset and the
/// error is recorded.
pub(crate) fn run(state: &mut PipelineState) {
    match preprocess(state.raw()) {
        Ok(content) => {
            debug!(
                posts = content.posts.len(),
                texts = content.text_content.len(),
                media = content.media_urls.len(),
                hashtags = content.hashtags.len(),
                mentions = content.mentions.len(),
                "Preprocessed content"
            );
            state.set_preprocessed(content);
        }
        Err(e) => {
            warn!(run_id = %state.run_id(), error = %e, "Preprocessing failed");
            state.push_error(format!("Preprocessing failed: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ContentType;
    use serde_json::json;
    use std::sync::Arc;

    fn sample() -> RawContent {
        RawContent::new(vec![
            json!({
                "caption": "Morning with @alice and @bob_2 #coffee",
                "displayUrl": "https://cdn.example/1.jpg",
                "hashtags": ["coffee", "morning"]
            }),
            json!({
                "text": "Reel from @alice",
                "videoUrl": "https://v.example/2.mp4",
                "covers": { "default": "https://cdn.example/2.jpg" },
                "hashtags": [{ "name": "coffee" }]
            }),
        ])
        .with_platform("instagram")
        .with_count(40)
    }

    #[test]
    fn extracts_texts_media_and_tags() {
        let content = preprocess(&sample()).unwrap();

        assert_eq!(
            content.text_content,
            vec!["Morning with @alice and @bob_2 #coffee", "Reel from @alice"]
        );
        assert_eq!(
            content.media_urls,
            vec![
                "https://cdn.example/1.jpg",
                "https://v.example/2.mp4",
                "https://cdn.example/2.jpg"
            ]
        );
        assert_eq!(
            content.hashtags,
            BTreeSet::from(["coffee".to_string(), "morning".to_string()])
        );
        assert_eq!(
            content.mentions,
            BTreeSet::from(["alice".to_string(), "bob_2".to_string()])
        );
        assert_eq!(content.metadata.platform, "instagram");
        assert_eq!(content.metadata.total_count, 40);
    }

    #[test]
    fn caption_and_text_both_count_as_text_but_mentions_use_caption_first() {
        let raw = RawContent::new(vec![json!({
            "caption": "hello @first",
            "text": "and @second"
        })]);
        let content = preprocess(&raw).unwrap();
        assert_eq!(content.text_content.len(), 2);
        assert_eq!(content.mentions, BTreeSet::from(["first".to_string()]));
    }

    #[test]
    fn empty_or_missing_data_yields_empty_content() {
        for raw in [RawContent::default(), RawContent::new(vec![])] {
            let content = preprocess(&raw).unwrap();
            assert!(content.posts.is_empty());
            assert!(content.text_content.is_empty());
            assert!(content.media_urls.is_empty());
            assert!(content.hashtags.is_empty());
            assert!(content.mentions.is_empty());
            assert_eq!(content.metadata.platform, "unknown");
            assert_eq!(content.metadata.total_count, 0);
        }
    }

    #[test]
    fn preprocessing_is_stable() {
        let raw = sample();
        let first = preprocess(&raw).unwrap();
        let second = preprocess(&raw).unwrap();
        assert_eq!(first.text_content, second.text_content);
        assert_eq!(first.media_urls, second.media_urls);
        assert_eq!(first.hashtags, second.hashtags);
        assert_eq!(first.mentions, second.mentions);
    }

    #[test]
    fn malformed_post_names_its_index() {
        let raw = RawContent::new(vec![json!({ "caption": "ok" }), json!(null)]);
        let err = preprocess(&raw).unwrap_err();
        assert!(matches!(err, PreprocessError::MalformedPost { index: 1, .. }));
    }

    #[test]
    fn loosely_typed_post_is_kept() {
        let raw = RawContent::new(vec![json!({
            "caption": "hi @maria",
            "displayUrl": 9,
            "videoUrl": "x",
            "likesCount": "12",
            "hashtags": "food"
        })]);
        let content = preprocess(&raw).unwrap();

        assert_eq!(content.text_content, vec!["hi @maria"]);
        assert_eq!(content.media_urls, vec!["x"]);
        assert!(content.hashtags.is_empty());
        assert!(content.mentions.contains("maria"));
    }

    #[test]
    fn stage_records_failure_and_leaves_content_unset() {
        let raw = RawContent::new(vec![json!(42)]);
        let mut state = PipelineState::new(Arc::new(raw), ContentType::Mixed, None);
        run(&mut state);

        assert!(state.preprocessed().is_none());
        assert_eq!(state.errors().len(), 1);
        assert!(state.errors()[0].starts_with("Preprocessing failed: post 0 is malformed"));
    }
}
