use super::{LLMError, Result, TextGenerator};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted generator for tests: canned content per path, optional failures
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    responses: Arc<Mutex<HashMap<String, String>>>,
    failures: Arc<Mutex<HashMap<String, String>>>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, path: &str, content: &str) -> Self {
        self.responses.lock().unwrap().insert(path.to_string(), content.to_string());
        self
    }

    pub fn fail(self, path: &str, message: &str) -> Self {
        self.failures.lock().unwrap().insert(path.to_string(), message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `(path, prompt)` pairs in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, file_path: &str, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push((file_path.to_string(), prompt.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failures.lock().unwrap().get(file_path) {
            return Err(LLMError::api(500, message.clone()));
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(file_path)
            .cloned()
            .unwrap_or_else(|| crate::testing::file_for(file_path)))
    }
}
