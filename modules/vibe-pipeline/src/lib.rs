pub mod analyzer;
pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod preprocess;
pub mod report;
pub mod runner;
pub mod stages;
pub mod state;
pub mod template;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;
pub mod variants;

pub use analyzer::{AnalysisKind, Analyzer, LlmAnalyzer};
pub use batch::{BatchItemResult, BatchOptions, BatchScheduler, BatchStats, ContentPipeline};
pub use classifier::{ContentClassifier, ContentType};
pub use config::{load_config, PipelineConfig};
pub use error::{PipelineError, StageError};
pub use report::{AnalysisReport, Report};
pub use runner::{PipelineRunner, RunOptions};
pub use state::{PipelineState, PreprocessedContent, Slot};
pub use types::{Post, RawContent};
pub use variants::{Variant, VariantRegistry};
