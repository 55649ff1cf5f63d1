//! Similarity index: embedded resume chunks ranked by cosine similarity.
//!
//! One index is built per analysis run and never shared between runs.
//! `store` persists a bounded number of recent indexes for inspection only.

pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::llm_client::{Embedder, LlmError};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("Cannot build an index from zero chunks")]
    EmptyInput,

    #[error("Embedder returned {got} vectors for {expected} chunks")]
    EmbeddingCount { expected: usize, got: usize },

    #[error("Vector dimension mismatch: index has {expected}, query has {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Index storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A chunk returned by a query, with its cosine similarity to the query text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    id: String,
    dimension: usize,
    chunks: Vec<IndexedChunk>,
}

impl SimilarityIndex {
    /// Embeds every chunk and stores it. The index id is unique per build.
    pub async fn build(chunks: Vec<String>, embedder: &dyn Embedder) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyInput);
        }

        let embeddings = embedder.embed(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(IndexError::EmbeddingCount {
                expected: chunks.len(),
                got: embeddings.len(),
            });
        }

        let dimension = embeddings[0].len();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                got: bad.len(),
            });
        }

        let id = Uuid::new_v4().simple().to_string()[..8].to_string();
        let chunks: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexedChunk { text, embedding })
            .collect();

        info!(
            "Built similarity index {} with {} chunks (dim={})",
            id,
            chunks.len(),
            dimension
        );
        Ok(Self {
            id,
            dimension,
            chunks,
        })
    }

    /// Returns up to `k` chunks most similar to `text`, best first.
    /// Equal scores keep insertion order.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        embedder: &dyn Embedder,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let query_vector = embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(IndexError::EmbeddingCount {
                expected: 1,
                got: 0,
            })?;

        if query_vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: query_vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                text: chunk.text.clone(),
                score: cosine_similarity(&query_vector, &chunk.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);

        debug!("Index {} query returned {} chunks", self.id, scored.len());
        Ok(scored)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }
}

/// Cosine similarity in [-1, 1]. Zero-norm vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
