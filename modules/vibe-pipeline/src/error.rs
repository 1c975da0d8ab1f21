use thiserror::Error;

/// Errors that reach the caller of `run` / `run_batch`.
///
/// Only configuration and argument problems propagate; data and analyzer
/// failures are folded into the report instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown pipeline variant: {0}")]
    UnknownVariant(String),

    #[error("Invalid variant '{name}': {reason}")]
    InvalidVariant { name: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// A stage-local failure. Recorded in the stage's own slot and in the
/// state's error list, never returned to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("{0}")]
    NoContent(&'static str),

    #[error("{0}")]
    Analyzer(String),

    #[error("analyzer returned malformed data: expected a JSON object, got {0}")]
    Malformed(&'static str),

    #[error("analyzer panicked: {0}")]
    Panicked(String),
}

/// Preprocessing failure. Leaves `preprocessed_content` unset.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("post {index} is malformed: {source}")]
    MalformedPost {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Terminal-stage failure. Replaced by a minimal error report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("{field} must be a list of strings")]
    NotStringList { field: String },

    #[error("{field} must be a string")]
    NotString { field: String },
}
