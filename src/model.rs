//! # Embedding Service Module
//!
//! Optional semantic capability. Wraps a `rig` embedding model with rate
//! limiting and exposes plain `Vec<f32>` vectors to the scraper and the
//! semantic pillar coverage. Nothing downstream requires it: when no API key
//! is configured the pipeline runs on keyword heuristics only.
//!
//! ## Key Components
//!
//! - `EmbeddingService`: text-to-vector capability over any `EmbeddingModel`
//! - `RateLimitedEmbeddingModel`: a wrapper that adds rate limiting to any embedding model
//! - `EmbeddingConversion`: Utilities for converting between embedding formats
//! - `cosine_similarity`: vector comparison used for pillar matching

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use rig::{embeddings::EmbeddingModel, providers::gemini};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

pub mod embedding;
pub mod mock_model;
pub mod ratelimited_embedding;

pub use embedding::{EmbeddingConversion, cosine_similarity};
pub use ratelimited_embedding::RateLimitedEmbeddingModel;

/// Environment variables checked, in order, for a Gemini API key
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// The default embedding model type
pub type GeminiEmbeddingModel = RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>;

/// Turns text into embedding vectors
#[derive(Clone)]
pub struct EmbeddingService<E> {
    model: E,
}

impl EmbeddingService<GeminiEmbeddingModel> {
    /// Create a Gemini-backed service from `GOOGLE_API_KEY` or `GEMINI_API_KEY`
    pub fn new_gemini_from_env() -> Result<Self> {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|key| !key.is_empty()))
            .ok_or_else(|| {
                Error::Auth(format!("set one of {} to enable embeddings", API_KEY_VARS.join(", ")))
            })?;
        Ok(Self::new_gemini(gemini::Client::new(&api_key)))
    }

    pub fn new_gemini(gemini_client: gemini::Client) -> Self {
        let limiter = RateLimiter::direct(Quota::per_minute(
            NonZeroU32::new(1000).expect("must create rate limit"),
        ));
        let model = RateLimitedEmbeddingModel::new(
            gemini_client.embedding_model(gemini::embedding::EMBEDDING_004),
            limiter,
        );
        Self { model }
    }
}

impl<E> EmbeddingService<E>
where
    E: EmbeddingModel,
{
    /// Wrap an arbitrary embedding model
    pub fn new(model: E) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &E {
        &self.model
    }

    /// Vector dimensionality of the underlying model
    pub fn dimensions(&self) -> usize {
        self.model.ndims()
    }

    /// Embed a single text
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(vec![text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("provider returned no embedding".to_string()))
    }

    /// Embed several texts, preserving input order
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = texts.len();
        let embeddings = self
            .model
            .embed_texts(texts)
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if embeddings.len() != expected {
            return Err(Error::Embedding(format!(
                "expected {expected} embeddings, got {}",
                embeddings.len()
            )));
        }

        debug!("Embedded {} texts", expected);
        Ok(embeddings.iter().map(EmbeddingConversion::to_vec).collect())
    }
}
