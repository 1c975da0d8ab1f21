use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Raw scraper output ---

/// One scrape result as handed to the pipeline: a list of raw post records
/// plus whatever run metadata the scraper attached.
///
/// Posts stay as raw JSON. Instagram, TikTok and the blog scrapers all use
/// different record shapes, and the analyzers receive them verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContent {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub scraped_at: Option<String>,
}

impl RawContent {
    pub fn new(posts: Vec<Value>) -> Self {
        Self {
            data: Some(posts),
            ..Self::default()
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_scraped_at(mut self, scraped_at: impl Into<String>) -> Self {
        self.scraped_at = Some(scraped_at.into());
        self
    }

    /// The post records, empty when `data` is missing.
    pub fn posts(&self) -> &[Value] {
        self.data.as_deref().unwrap_or(&[])
    }
}

// --- Typed post view ---

/// The subset of post fields the pipeline reads.
///
/// Field names follow the Apify dataset schemas: Instagram uses
/// `likesCount`/`commentsCount`/`displayUrl`, TikTok uses
/// `diggCount`/`commentCount`/`playCount`/`covers`.
///
/// Scrapers are loose about types (counters arrive as `"12"`, captions as
/// numbers). A field with an unexpected type reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    #[serde(deserialize_with = "lenient")]
    pub caption: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub display_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub video_url: Option<String>,
    pub covers: Option<Value>,
    #[serde(deserialize_with = "deserialize_hashtags")]
    pub hashtags: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub likes_count: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub digg_count: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub comments_count: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub comment_count: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub share_count: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub play_count: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub view_count: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub duration: Option<f64>,
}

/// Engagement numbers normalized across platforms. Missing counters are 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Engagement {
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub views: f64,
    pub duration: f64,
}

impl Post {
    /// Parse a raw post record. Fails only when the record is not an object.
    pub fn parse(value: &Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom(format!(
                "expected a post object, got {}",
                json_type(value)
            )));
        }
        Post::deserialize(value)
    }

    /// Caption and text, in that order, skipping empty ones.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        [self.caption.as_deref(), self.text.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
    }

    /// The primary body of the post: caption, falling back to text.
    pub fn body(&self) -> Option<&str> {
        self.texts().next()
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.covers
            .as_ref()
            .and_then(|c| c.get("default"))
            .and_then(Value::as_str)
    }

    /// Display, video and cover URLs, in that order.
    pub fn media_urls(&self) -> impl Iterator<Item = &str> {
        [
            self.display_url.as_deref(),
            self.video_url.as_deref(),
            self.cover_url(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
    }

    pub fn engagement(&self) -> Engagement {
        Engagement {
            likes: self.likes_count.or(self.digg_count).unwrap_or(0.0),
            comments: self.comments_count.or(self.comment_count).unwrap_or(0.0),
            shares: self.share_count.unwrap_or(0.0),
            views: self.play_count.or(self.view_count).unwrap_or(0.0),
            duration: self.duration.unwrap_or(0.0),
        }
    }
}

/// Read a field as `T`, or `None` when it has some other shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Instagram sends hashtags as strings, TikTok as `{ "name": ... }` objects.
/// Anything else in the list is dropped.
fn deserialize_hashtags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(tag) => Some(tag.as_str()),
            Value::Object(_) => entry.get("name").and_then(Value::as_str),
            _ => None,
        })
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect())
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_instagram_post() {
        let post = Post::parse(&json!({
            "caption": "Sunset at the pier",
            "displayUrl": "https://cdn.example/1.jpg",
            "hashtags": ["sunset", "pier"],
            "likesCount": 42,
            "commentsCount": 3
        }))
        .unwrap();

        assert_eq!(post.body(), Some("Sunset at the pier"));
        assert_eq!(post.hashtags, vec!["sunset", "pier"]);
        let engagement = post.engagement();
        assert_eq!(engagement.likes, 42.0);
        assert_eq!(engagement.comments, 3.0);
        assert_eq!(engagement.views, 0.0);
    }

    #[test]
    fn parses_tiktok_post_with_named_hashtags() {
        let post = Post::parse(&json!({
            "text": "street food tour",
            "videoUrl": "https://v.example/1.mp4",
            "covers": { "default": "https://cdn.example/cover.jpg" },
            "hashtags": [{ "name": "food" }, { "name": "" }],
            "diggCount": 10,
            "commentCount": 2,
            "shareCount": 1,
            "playCount": 100,
            "duration": 15
        }))
        .unwrap();

        assert_eq!(post.hashtags, vec!["food"]);
        assert_eq!(
            post.media_urls().collect::<Vec<_>>(),
            vec!["https://v.example/1.mp4", "https://cdn.example/cover.jpg"]
        );
        let engagement = post.engagement();
        assert_eq!(engagement.likes, 10.0);
        assert_eq!(engagement.comments, 2.0);
        assert_eq!(engagement.shares, 1.0);
        assert_eq!(engagement.views, 100.0);
        assert_eq!(engagement.duration, 15.0);
    }

    #[test]
    fn rejects_non_object_post() {
        let err = Post::parse(&json!("just a string")).unwrap_err();
        assert_eq!(err.to_string(), "expected a post object, got a string");
        assert!(Post::parse(&json!([])).is_err());
        assert!(Post::parse(&Value::Null).is_err());
    }

    #[test]
    fn wrongly_typed_fields_read_as_absent() {
        let post = Post::parse(&json!({
            "caption": 12,
            "text": "still here",
            "videoUrl": "x",
            "likesCount": "12",
            "diggCount": 7,
            "playCount": { "total": 100 },
            "hashtags": ["ok", 3, { "name": "named" }, { "id": 1 }]
        }))
        .unwrap();

        assert_eq!(post.caption, None);
        assert_eq!(post.body(), Some("still here"));
        assert_eq!(post.video_url.as_deref(), Some("x"));
        assert_eq!(post.hashtags, vec!["ok", "named"]);
        let engagement = post.engagement();
        assert_eq!(engagement.likes, 7.0);
        assert_eq!(engagement.views, 0.0);
    }

    #[test]
    fn non_list_hashtags_are_empty() {
        let post = Post::parse(&json!({ "hashtags": "sunset" })).unwrap();
        assert!(post.hashtags.is_empty());
    }

    #[test]
    fn null_hashtags_are_empty() {
        let post = Post::parse(&json!({ "hashtags": null })).unwrap();
        assert!(post.hashtags.is_empty());
    }

    #[test]
    fn raw_content_defaults_missing_fields() {
        let raw: RawContent = serde_json::from_value(json!({})).unwrap();
        assert!(raw.posts().is_empty());
        assert!(raw.platform.is_none());

        let raw: RawContent =
            serde_json::from_value(json!({ "data": [{}], "scrapedAt": "2026-01-01T00:00:00Z" }))
                .unwrap();
        assert_eq!(raw.posts().len(), 1);
        assert_eq!(raw.scraped_at.as_deref(), Some("2026-01-01T00:00:00Z"));
    }
}
