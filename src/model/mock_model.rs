//! # Mock Embedding Model for Testing
//!
//! Provides a `MockEmbeddingModel` that implements the `EmbeddingModel` trait
//! for use in tests. Texts are mapped to fixed vectors by substring rules, and
//! the model can be switched into a failing state to simulate provider errors
//! without making actual API calls.

use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MockState {
    /// (lower-case pattern, vector) rules, first match wins
    rules: Vec<(String, Vec<f64>)>,
    failure: Option<String>,
}

/// A mock embedding model for testing purposes.
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    dimensions: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockEmbeddingModel {
    /// Creates a mock that returns zero vectors of `dimensions` by default
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Texts containing `pattern` (case-insensitive) embed to `vector`
    pub async fn set_vector(&self, pattern: &str, vector: Vec<f32>) {
        let mut guard = self.state.lock().await;
        guard.rules.push((
            pattern.to_lowercase(),
            vector.into_iter().map(f64::from).collect(),
        ));
    }

    /// Every subsequent call fails with a provider error
    pub async fn fail_with(&self, message: &str) {
        let mut guard = self.state.lock().await;
        guard.failure = Some(message.to_string());
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    const MAX_DOCUMENTS: usize = 256;

    fn ndims(&self) -> usize {
        self.dimensions
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let guard = self.state.lock().await;
        if let Some(message) = &guard.failure {
            return Err(EmbeddingError::ProviderError(message.clone()));
        }

        Ok(texts
            .into_iter()
            .map(|text| {
                let lowered = text.to_lowercase();
                let vec = guard
                    .rules
                    .iter()
                    .find(|(pattern, _)| lowered.contains(pattern.as_str()))
                    .map(|(_, vector)| vector.clone())
                    .unwrap_or_else(|| vec![0.0; self.dimensions]);
                Embedding {
                    document: text,
                    vec,
                }
            })
            .collect())
    }
}
