use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::classifier::ContentType;
use crate::config::BatchConfig;
use crate::error::PipelineError;
use crate::report::Report;
use crate::runner::{PipelineRunner, RunOptions};
use crate::stages::panic_message;
use crate::types::RawContent;
use crate::variants;

/// What the scheduler needs from a pipeline.
#[async_trait]
pub trait ContentPipeline: Send + Sync {
    fn classify(&self, raw: &RawContent) -> ContentType;

    async fn run(
        &self,
        variant: &str,
        raw: Arc<RawContent>,
        options: RunOptions,
    ) -> Result<Report, PipelineError>;
}

#[async_trait]
impl ContentPipeline for PipelineRunner {
    fn classify(&self, raw: &RawContent) -> ContentType {
        self.classifier().classify(raw.data.as_deref())
    }

    async fn run(
        &self,
        variant: &str,
        raw: Arc<RawContent>,
        options: RunOptions,
    ) -> Result<Report, PipelineError> {
        PipelineRunner::run(self, variant, raw, options).await
    }
}

#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct BatchOptions {
    /// Items per chunk. Falls back to the configured batch size.
    #[builder(default, setter(strip_option))]
    pub batch_size: Option<usize>,
    /// Applied to every item instead of classifying each one.
    #[builder(default, setter(strip_option))]
    pub content_type: Option<ContentType>,
    #[builder(default, setter(strip_option, into))]
    pub platform: Option<String>,
}

/// Outcome for one input item, tagged with its input position.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
}

impl BatchItemResult {
    fn succeeded(index: usize, report: Report) -> Self {
        Self {
            index,
            result: Some(report),
            error: None,
            success: true,
        }
    }

    fn failed(index: usize, error: String) -> Self {
        Self {
            index,
            result: None,
            error: Some(error),
            success: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn from_results(results: &[BatchItemResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} successful", self.succeeded, self.total)
    }
}

/// Runs many pipeline invocations in sequential chunks.
///
/// Items within a chunk run concurrently; the next chunk starts only after
/// every item in the current one has settled and the chunk delay has
/// passed.
pub struct BatchScheduler {
    pipeline: Arc<dyn ContentPipeline>,
    config: BatchConfig,
}

impl BatchScheduler {
    pub fn new(pipeline: Arc<dyn ContentPipeline>, config: BatchConfig) -> Self {
        Self { pipeline, config }
    }

    /// Results come back ordered by input index. Fails only on a zero
    /// batch size.
    pub async fn run_batch(
        &self,
        items: Vec<RawContent>,
        options: BatchOptions,
    ) -> Result<Vec<BatchItemResult>, PipelineError> {
        let batch_size = options.batch_size.unwrap_or(self.config.batch_size);
        if batch_size == 0 {
            return Err(PipelineError::InvalidArgument(
                "batch size must be at least 1".into(),
            ));
        }

        let total = items.len();
        let chunk_count = total.div_ceil(batch_size);
        let items: Vec<(usize, Arc<RawContent>)> =
            items.into_iter().map(Arc::new).enumerate().collect();

        info!(items = total, chunks = chunk_count, batch_size, "Starting batch");

        let mut results = Vec::with_capacity(total);
        for (chunk_index, chunk) in items.chunks(batch_size).enumerate() {
            if chunk_index > 0 {
                tokio::time::sleep(self.config.chunk_delay()).await;
            }

            let settled = join_all(
                chunk
                    .iter()
                    .map(|(index, raw)| self.run_item(*index, raw.clone(), &options)),
            )
            .await;

            let stats = BatchStats::from_results(&settled);
            info!(
                chunk = chunk_index + 1,
                of = chunk_count,
                succeeded = stats.succeeded,
                failed = stats.failed,
                "Chunk settled"
            );
            results.extend(settled);
        }

        results.sort_by_key(|r| r.index);
        info!(stats = %BatchStats::from_results(&results), "Batch complete");
        Ok(results)
    }

    /// One item, classified and dispatched to the variant for its type.
    /// Errors and panics become a failed result.
    async fn run_item(
        &self,
        index: usize,
        raw: Arc<RawContent>,
        options: &BatchOptions,
    ) -> BatchItemResult {
        let pipeline = self.pipeline.as_ref();
        let attempt = async {
            let content_type = options
                .content_type
                .unwrap_or_else(|| pipeline.classify(&raw));
            let run_options = RunOptions {
                content_type: Some(content_type),
                platform: options.platform.clone(),
            };
            pipeline
                .run(variants::name_for(content_type), raw.clone(), run_options)
                .await
        };

        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(Ok(report)) => BatchItemResult::succeeded(index, report),
            Ok(Err(e)) => {
                warn!(index, error = %e, "Batch item failed");
                BatchItemResult::failed(index, e.to_string())
            }
            Err(panic) => {
                let message = format!("pipeline panicked: {}", panic_message(panic.as_ref()));
                warn!(index, error = %message, "Batch item failed");
                BatchItemResult::failed(index, message)
            }
        }
    }
}
