//! Core functionality for agent-forge
//!
//! This crate holds the generation pipeline, its validators and the LLM
//! client used by the `agent-forge` binary and HTTP service.

pub mod config;
pub mod error;
pub mod layout;
pub mod llm;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod state;
pub mod templates;
pub mod validators;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::{ConfigError, ForgeConfig};
pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineDeps, RetryPolicy};
pub use state::{PipelineInput, PipelineOutput, PipelineState, Status};
