use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// TOML-backed pipeline configuration. Every section is optional; a missing
/// file section falls back to the defaults below.
/// Secrets (API keys) stay as env vars.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub classifier: ClassifierConfig,
    pub batch: BatchConfig,
    pub models: ModelsConfig,
    /// Additional named variants, keyed by variant name.
    pub variants: BTreeMap<String, VariantConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Video share above which content is labelled video.
    pub video_threshold: f64,
    /// Long-form share above which content is labelled document.
    pub document_threshold: f64,
    /// Caption length (in chars) above which a post counts as long-form.
    pub document_min_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            video_threshold: 0.7,
            document_threshold: 0.7,
            document_min_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub chunk_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            chunk_delay_ms: 1000,
        }
    }
}

impl BatchConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelsConfig {
    pub analysis: String,
    pub temperature: f32,
    /// Upper bound on the serialized payload sent per analyzer call, in bytes.
    pub max_payload_bytes: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            analysis: "gpt-4o".to_string(),
            temperature: 0.3,
            max_payload_bytes: 60_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantConfig {
    pub stages: Vec<String>,
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.classifier.video_threshold, 0.7);
        assert_eq!(config.classifier.document_min_chars, 500);
        assert_eq!(config.batch.batch_size, 5);
        assert_eq!(config.batch.chunk_delay(), Duration::from_millis(1000));
        assert!(config.variants.is_empty());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse_config(
            r#"
            [batch]
            batch_size = 2

            [variants.quick-video]
            stages = ["preprocess", "video", "report"]
            "#,
        )
        .unwrap();
        assert_eq!(config.batch.batch_size, 2);
        assert_eq!(config.batch.chunk_delay_ms, 1000);
        assert_eq!(
            config.variants["quick-video"].stages,
            vec!["preprocess", "video", "report"]
        );
    }

    #[test]
    fn sample_config_parses() {
        let config = parse_config(include_str!("../../../config/vibe.toml")).unwrap();
        assert_eq!(config.models.analysis, "gpt-4o");
        assert_eq!(config.batch.batch_size, 5);
        assert!(config.variants.contains_key("quick-video"));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(parse_config("[batch]\nbatchsize = 3\n").is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[classifier]\nvideo_threshold = 0.5").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.classifier.video_threshold, 0.5);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/vibe.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vibe.toml"));
    }
}
