//! Memoized text-generator client shared across pipeline runs

use super::{GeminiGenerator, Result, TextGenerator};
use crate::config::LlmConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Builds a new client; called at most once per cache fill
pub type GeneratorFactory = Arc<dyn Fn() -> Result<Arc<dyn TextGenerator>> + Send + Sync>;

/// Get-or-initialize slot for a text generator.
///
/// The first caller pays the initialization cost while holding the lock, so
/// concurrent callers never build two clients. A failed initialization leaves
/// the slot empty and the next caller tries again.
pub struct GeneratorCache {
    factory: GeneratorFactory,
    slot: Mutex<Option<Arc<dyn TextGenerator>>>,
    initializations: AtomicUsize,
}

impl GeneratorCache {
    pub fn new(factory: GeneratorFactory) -> Self {
        Self { factory, slot: Mutex::new(None), initializations: AtomicUsize::new(0) }
    }

    /// Cache backed by the Gemini API
    pub fn gemini(config: LlmConfig) -> Self {
        Self::new(Arc::new(move || -> Result<Arc<dyn TextGenerator>> {
            Ok(Arc::new(GeminiGenerator::from_config(&config)?))
        }))
    }

    /// Cache that always hands out the given generator
    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self::new(Arc::new(move || -> Result<Arc<dyn TextGenerator>> { Ok(generator.clone()) }))
    }

    pub async fn get_or_init(&self) -> Result<Arc<dyn TextGenerator>> {
        let mut slot = self.slot.lock().await;
        if let Some(generator) = slot.as_ref() {
            debug!(generator = generator.name(), "reusing cached text generator");
            return Ok(generator.clone());
        }

        let generator = (self.factory)()?;
        self.initializations.fetch_add(1, Ordering::Relaxed);
        info!(generator = generator.name(), "initialized text generator");
        *slot = Some(generator.clone());
        Ok(generator)
    }

    /// Drop the cached client so the next call rebuilds it
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            info!("text generator cache invalidated");
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Number of successful initializations so far
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMError;
    use crate::llm::mock::ScriptedGenerator;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn test_initializes_once_under_concurrency() {
        let cache = Arc::new(GeneratorCache::with_generator(Arc::new(ScriptedGenerator::new())));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get_or_init().await.map(|_| ()) }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.initializations(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let cache = GeneratorCache::with_generator(Arc::new(ScriptedGenerator::new()));
        cache.get_or_init().await.unwrap();
        cache.invalidate().await;
        assert!(!cache.is_initialized().await);

        cache.get_or_init().await.unwrap();
        assert_eq!(cache.initializations(), 2);
    }

    #[tokio::test]
    async fn test_failed_init_is_not_cached() {
        let fail = Arc::new(AtomicBool::new(true));
        let flag = fail.clone();
        let cache = GeneratorCache::new(Arc::new(move || -> Result<Arc<dyn TextGenerator>> {
            if flag.load(Ordering::SeqCst) {
                return Err(LLMError::auth("missing key"));
            }
            Ok(Arc::new(ScriptedGenerator::new()))
        }));

        assert!(cache.get_or_init().await.is_err());
        fail.store(false, Ordering::SeqCst);
        assert!(cache.get_or_init().await.is_ok());
        assert_eq!(cache.initializations(), 1);
    }
}
