//! Typed errors for the pipeline library.
//!
//! Only unrecoverable failures end up here. Remote classifier trouble is
//! absorbed by the stages and surfaces as `RecoverableError` entries in the
//! stage reports instead.

use thiserror::Error;

use crate::types::Stage;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage could not produce its output at all
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: BoxError,
    },

    /// Cancellation was requested between stages
    #[error("pipeline cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Job store rejected an operation
    #[error("storage error: {0}")]
    Store(#[source] BoxError),

    /// Postings and classifier results could not be paired up
    #[error("length mismatch: {postings} postings, {results} results")]
    LengthMismatch { postings: usize, results: usize },
}

impl PipelineError {
    pub fn stage(stage: Stage, source: impl Into<BoxError>) -> Self {
        PipelineError::Stage {
            stage,
            source: source.into(),
        }
    }

    pub fn store(source: impl Into<BoxError>) -> Self {
        PipelineError::Store(source.into())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
