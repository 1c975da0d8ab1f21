use std::collections::{BTreeMap, HashSet};

use crate::classifier::ContentType;
use crate::config::VariantConfig;
use crate::error::PipelineError;
use crate::stages::StageId;

pub const FULL: &str = "full";
pub const VIDEO_ONLY: &str = "video-only";
pub const DOCUMENT_ONLY: &str = "document-only";
pub const FAST: &str = "fast";

/// A named, ordered list of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    name: String,
    stages: Vec<StageId>,
}

impl Variant {
    /// Validates that the chain starts with `preprocess`, ends with
    /// `report` and runs no stage twice.
    pub fn new(name: impl Into<String>, stages: Vec<StageId>) -> Result<Self, PipelineError> {
        let name = name.into();
        let invalid = |reason: String| PipelineError::InvalidVariant {
            name: name.clone(),
            reason,
        };

        match (stages.first(), stages.last()) {
            (None, _) => return Err(invalid("no stages".into())),
            (Some(first), _) if *first != StageId::Preprocess => {
                return Err(invalid(format!("first stage must be preprocess, got {first}")))
            }
            (_, Some(last)) if *last != StageId::Report => {
                return Err(invalid(format!("last stage must be report, got {last}")))
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        if let Some(dup) = stages.iter().find(|s| !seen.insert(**s)) {
            return Err(invalid(format!("stage {dup} appears more than once")));
        }

        Ok(Self { name, stages })
    }

    /// Build from stage names, as found in config files.
    pub fn from_names(name: impl Into<String>, names: &[String]) -> Result<Self, PipelineError> {
        let name = name.into();
        let stages = names
            .iter()
            .map(|s| {
                s.parse::<StageId>()
                    .map_err(|_| PipelineError::InvalidVariant {
                        name: name.clone(),
                        reason: format!("unknown stage '{s}'"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, stages)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[StageId] {
        &self.stages
    }

    pub fn full() -> Self {
        use StageId::*;
        Self::builtin(
            FULL,
            &[Preprocess, Sentiment, Categorize, Video, Document, MultiModal, Trends, Vibe, Report],
        )
    }

    pub fn video_only() -> Self {
        use StageId::*;
        Self::builtin(
            VIDEO_ONLY,
            &[Preprocess, Sentiment, Categorize, Video, MultiModal, Trends, Report],
        )
    }

    pub fn document_only() -> Self {
        use StageId::*;
        Self::builtin(
            DOCUMENT_ONLY,
            &[Preprocess, Sentiment, Categorize, Document, Trends, Report],
        )
    }

    pub fn fast() -> Self {
        use StageId::*;
        Self::builtin(FAST, &[Preprocess, Sentiment, Report])
    }

    fn builtin(name: &str, stages: &[StageId]) -> Self {
        Self {
            name: name.to_string(),
            stages: stages.to_vec(),
        }
    }
}

/// The variant a batch item is dispatched to for its content type.
pub fn name_for(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Video => VIDEO_ONLY,
        ContentType::Document => DOCUMENT_ONLY,
        ContentType::Mixed => FULL,
    }
}

/// Variants by name: the four built-ins plus any from config.
#[derive(Debug, Clone)]
pub struct VariantRegistry {
    variants: BTreeMap<String, Variant>,
}

impl Default for VariantRegistry {
    fn default() -> Self {
        let variants = [
            Variant::full(),
            Variant::video_only(),
            Variant::document_only(),
            Variant::fast(),
        ]
        .into_iter()
        .map(|v| (v.name.clone(), v))
        .collect();
        Self { variants }
    }
}

impl VariantRegistry {
    /// Built-ins plus config-defined variants. A config variant may not
    /// reuse a built-in name.
    pub fn from_config(configs: &BTreeMap<String, VariantConfig>) -> Result<Self, PipelineError> {
        let mut registry = Self::default();
        for (name, config) in configs {
            if registry.variants.contains_key(name) {
                return Err(PipelineError::InvalidVariant {
                    name: name.clone(),
                    reason: "name is reserved for a built-in variant".into(),
                });
            }
            let variant = Variant::from_names(name.clone(), &config.stages)?;
            registry.variants.insert(name.clone(), variant);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Result<&Variant, PipelineError> {
        self.variants
            .get(name)
            .ok_or_else(|| PipelineError::UnknownVariant(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }
}
