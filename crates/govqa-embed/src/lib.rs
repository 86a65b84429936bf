//! govqa-embed
//!
//! Deterministic feature-hashing embedder. It stands in for the external
//! multilingual model in development, tests and offline indexing: texts
//! sharing normalized words or character trigrams land near each other.

use std::hash::{Hash, Hasher};

use anyhow::{anyhow, Result};
use govqa_core::settings::EmbeddingSettings;
use govqa_core::traits::Embedder;
use govqa_lexical::tokens;
use tracing::info;
use twox_hash::XxHash64;

const WORD_SEED: u64 = 0;
const TRIGRAM_SEED: u64 = 0x9E37_79B9;
const TRIGRAM_WEIGHT: f32 = 0.35;

pub struct HashingEmbedder {
    dim: usize,
    max_len: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize, max_len: usize) -> Result<Self> {
        if dim == 0 || max_len == 0 {
            return Err(anyhow!("hashing embedder needs positive dim and max_len (got {dim}, {max_len})"));
        }
        Ok(Self { dim, max_len })
    }

    fn bucket(&self, feature: &str, seed: u64) -> (usize, f32) {
        let mut hasher = XxHash64::with_seed(seed);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        // top bit is the sign
        let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text).iter().take(self.max_len) {
            let (idx, sign) = self.bucket(token, WORD_SEED);
            v[idx] += sign;
            let chars: Vec<char> = format!("#{token}#").chars().collect();
            for window in chars.windows(3) {
                let gram: String = window.iter().collect();
                let (idx, sign) = self.bucket(&gram, TRIGRAM_SEED);
                v[idx] += sign * TRIGRAM_WEIGHT;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let embedder = HashingEmbedder::new(settings.dim, settings.max_len)?;
    info!(dim = settings.dim, max_len = settings.max_len, "using hashing embedder");
    Ok(Box::new(embedder))
}
