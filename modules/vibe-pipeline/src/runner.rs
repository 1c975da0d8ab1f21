use std::sync::Arc;
use std::time::Instant;

use tracing::{info, Instrument};
use typed_builder::TypedBuilder;

use crate::analyzer::Analyzer;
use crate::classifier::{ContentClassifier, ContentType};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::report::Report;
use crate::stages;
use crate::state::PipelineState;
use crate::types::RawContent;
use crate::variants::{Variant, VariantRegistry};

/// Per-invocation options.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct RunOptions {
    /// Skip classification and use this content type.
    #[builder(default, setter(strip_option))]
    pub content_type: Option<ContentType>,
    /// Platform label for the report summary.
    #[builder(default, setter(strip_option, into))]
    pub platform: Option<String>,
}

/// Runs variants over raw content.
///
/// Holds the shared analyzer; each `run` owns a fresh `PipelineState`, so
/// one runner serves any number of concurrent invocations.
pub struct PipelineRunner {
    analyzer: Arc<dyn Analyzer>,
    classifier: ContentClassifier,
    variants: VariantRegistry,
}

impl PipelineRunner {
    pub fn new(analyzer: Arc<dyn Analyzer>, config: &PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            analyzer,
            classifier: ContentClassifier::new(&config.classifier),
            variants: VariantRegistry::from_config(&config.variants)?,
        })
    }

    /// Built-in variants and default classifier thresholds.
    pub fn with_defaults(analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            analyzer,
            classifier: ContentClassifier::default(),
            variants: VariantRegistry::default(),
        }
    }

    pub fn classifier(&self) -> &ContentClassifier {
        &self.classifier
    }

    pub fn variants(&self) -> &VariantRegistry {
        &self.variants
    }

    /// Run the named variant. Only an unknown variant name is an error;
    /// every data or analyzer failure ends up inside the report.
    pub async fn run(
        &self,
        variant: &str,
        raw: Arc<RawContent>,
        options: RunOptions,
    ) -> Result<Report, PipelineError> {
        let variant = self.variants.get(variant)?;
        let state = self.run_variant(variant, raw, options).await;
        state.into_report().ok_or_else(|| PipelineError::InvalidVariant {
            name: variant.name().to_string(),
            reason: "variant produced no report".into(),
        })
    }

    /// Run every stage of `variant` in order and return the final state.
    pub async fn run_variant(
        &self,
        variant: &Variant,
        raw: Arc<RawContent>,
        options: RunOptions,
    ) -> PipelineState {
        let content_type = options
            .content_type
            .unwrap_or_else(|| self.classifier.classify(raw.data.as_deref()));
        let mut state = PipelineState::new(raw, content_type, options.platform);

        let span = tracing::info_span!(
            "pipeline",
            variant = variant.name(),
            content_type = %content_type,
            platform = state.platform_label(),
            run_id = %state.run_id(),
        );

        async {
            let started = Instant::now();
            for &stage in variant.stages() {
                stages::execute(stage, &mut state, self.analyzer.as_ref()).await;
            }
            info!(
                errors = state.errors().len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pipeline complete"
            );
        }
        .instrument(span)
        .await;

        state
    }
}
