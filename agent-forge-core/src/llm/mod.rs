//! Text generation backends
//!
//! The pipeline treats the LLM as an opaque `(file path, prompt) -> text`
//! function behind the [`TextGenerator`] trait. Clients are created lazily
//! through a shared [`GeneratorCache`].

pub mod cache;
pub mod errors;
pub mod gemini;
pub mod prompts;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use cache::{GeneratorCache, GeneratorFactory};
pub use errors::LLMError;
pub use gemini::GeminiGenerator;

use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, LLMError>;

/// A backend that produces file content from a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Name of the backend, used in logs
    fn name(&self) -> &str;

    /// Generate content for `file_path`; a single attempt, never retried here
    async fn generate(&self, file_path: &str, prompt: &str) -> Result<String>;
}
