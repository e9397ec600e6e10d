//! Deterministic hash embeddings
//!
//! Produces a pair of fixed-length vectors from a piece of text:
//!
//! - **primary**: SHA-256 digest bytes scaled to [0, 1]
//! - **obfuscated**: MD5 digest bytes scaled to [0, 1]
//!
//! Both digests are repeated cyclically until [`EMBEDDING_DIM`] values are
//! produced. The two vectors must come from different hash functions, since
//! similarity search compares obfuscated vectors against each other.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of every embedding vector.
pub const EMBEDDING_DIM: usize = 384;

/// Primary and obfuscated embedding of a single text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingPair {
    #[serde(rename = "embedding")]
    pub primary: Vec<f64>,
    #[serde(rename = "obfuscated_embedding")]
    pub obfuscated: Vec<f64>,
}

impl EmbeddingPair {
    /// Compute both vectors for `text`.
    pub fn compute(text: &str) -> Self {
        let sha = Sha256::digest(text.as_bytes());
        let md5 = md5::compute(text.as_bytes());

        Self {
            primary: expand_digest(sha.as_slice()),
            obfuscated: expand_digest(&md5.0),
        }
    }
}

/// Scale digest bytes into [0, 1] and repeat them up to [`EMBEDDING_DIM`].
fn expand_digest(digest: &[u8]) -> Vec<f64> {
    digest
        .iter()
        .cycle()
        .take(EMBEDDING_DIM)
        .map(|&b| f64::from(b) / 255.0)
        .collect()
}

/// Cosine similarity of two equal-length vectors.
///
/// Returns 0.0 for mismatched lengths or zero-norm input.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// Pairwise cosine similarity matrix: `result[i][j] = cos(left[i], right[j])`.
pub fn similarity_matrix(left: &[Vec<f64>], right: &[Vec<f64>]) -> Vec<Vec<f64>> {
    left.iter()
        .map(|l| right.iter().map(|r| cosine_similarity(l, r)).collect())
        .collect()
}
