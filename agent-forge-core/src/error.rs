//! Errors raised outside a pipeline run
//!
//! Problems found while a run is in progress are [`crate::progress::ErrorRecord`]
//! values on the state. These are the failures that happen before a state
//! exists or after it is finished: reading the input document and writing
//! the generated project.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input document not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to read input document {path}: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input document: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to write outside the output directory: {0}")]
    UnsafePath(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
