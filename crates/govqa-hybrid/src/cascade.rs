//! Retrieve-then-rerank cascade.
//!
//! `CandidateRetrieval` produces a fused shortlist (done by the engine),
//! `ExternalRerank` asks the reranker to score it under a timeout, and
//! `Finalized` orders, truncates and ranks. A failed or slow reranker sends
//! the shortlist straight to `Finalized` on fused scores.

use std::sync::Arc;
use std::time::Duration;

use govqa_core::error::{Error, Result};
use govqa_core::traits::Reranker;
use govqa_core::types::{rank_order, RerankStatus, SearchResult};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CascadeState {
    CandidateRetrieval,
    ExternalRerank,
    Finalized,
}

pub struct RerankCascade {
    reranker: Option<Arc<dyn Reranker>>,
    timeout: Duration,
    final_k: usize,
}

impl RerankCascade {
    pub fn new(reranker: Option<Arc<dyn Reranker>>, timeout: Duration, final_k: usize) -> Self {
        Self { reranker, timeout, final_k }
    }

    /// Take a fused shortlist through `ExternalRerank` to `Finalized`.
    pub async fn run(&self, query: &str, candidates: Vec<SearchResult>) -> (Vec<SearchResult>, RerankStatus) {
        let Some(reranker) = self.reranker.clone() else {
            debug!(to = ?CascadeState::Finalized, "no reranker configured");
            return (finalize(candidates, self.final_k), RerankStatus::Skipped);
        };
        if candidates.is_empty() {
            return (candidates, RerankStatus::Skipped);
        }

        debug!(to = ?CascadeState::ExternalRerank, candidates = candidates.len(), model = reranker.model_id(), "cascade transition");
        let passages: Vec<String> = candidates.iter().map(|c| c.text.to_string()).collect();
        match rerank_scores(reranker, query, passages, self.timeout).await {
            Ok(scores) => {
                let mut candidates = candidates;
                for (candidate, score) in candidates.iter_mut().zip(scores) {
                    candidate.rerank_score = Some(score);
                }
                debug!(to = ?CascadeState::Finalized, "reranked");
                (finalize(candidates, self.final_k), RerankStatus::Reranked)
            }
            Err(err) => {
                warn!(%err, "falling back to fused ranking");
                debug!(to = ?CascadeState::Finalized, "unreranked");
                let reason = match err {
                    Error::RerankUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                (finalize(candidates, self.final_k), RerankStatus::Unreranked { reason })
            }
        }
    }
}

/// Score `(query, passage)` pairs on the blocking pool, bounded by `timeout`.
///
/// Every way this can go wrong (error, panic, timeout, wrong number of
/// scores, non-finite scores) is reported as `RerankUnavailable`.
///
/// A timeout abandons the result but not the call: blocking work cannot be
/// cancelled, so the reranker keeps its pool thread until it returns.
pub async fn rerank_scores(
    reranker: Arc<dyn Reranker>,
    query: &str,
    passages: Vec<String>,
    timeout: Duration,
) -> Result<Vec<f32>> {
    let expected = passages.len();
    let query = query.to_string();
    let task = tokio::task::spawn_blocking(move || reranker.score_pairs(&query, &passages));
    let scores = match tokio::time::timeout(timeout, task).await {
        Err(_) => return Err(Error::RerankUnavailable(format!("timed out after {}ms", timeout.as_millis()))),
        Ok(Err(join)) => return Err(Error::RerankUnavailable(format!("reranker task failed: {join}"))),
        Ok(Ok(Err(e))) => return Err(Error::RerankUnavailable(format!("{e:#}"))),
        Ok(Ok(Ok(scores))) => scores,
    };
    if scores.len() != expected {
        return Err(Error::RerankUnavailable(format!("expected {expected} scores, got {}", scores.len())));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(Error::RerankUnavailable("non-finite rerank score".into()));
    }
    Ok(scores)
}

/// Order by rerank score when present, else fused score, ties by lower
/// chunk id; keep `final_k`; assign 1-based ranks.
pub fn finalize(mut candidates: Vec<SearchResult>, final_k: usize) -> Vec<SearchResult> {
    candidates.sort_by(|a, b| rank_order((a.ranking_score(), a.chunk_id), (b.ranking_score(), b.chunk_id)));
    candidates.truncate(final_k);
    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank = i + 1;
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use govqa_core::types::Category;

    fn candidate(chunk_id: usize, fused: f32) -> SearchResult {
        SearchResult {
            rank: 0,
            chunk_id,
            semantic_score: fused,
            title_score: 0.0,
            keyword_score: 0.0,
            fused_score: fused,
            rerank_score: None,
            category: Category::from("health"),
            source_id: format!("doc{chunk_id}.txt"),
            text: Arc::from(format!("passage {chunk_id}")),
        }
    }

    struct Fixed(Vec<f32>);

    impl Reranker for Fixed {
        fn model_id(&self) -> &str {
            "fixed"
        }
        fn score_pairs(&self, _query: &str, _passages: &[String]) -> anyhow::Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn finalize_ranks_and_truncates() {
        let out = finalize(vec![candidate(3, 0.2), candidate(1, 0.9), candidate(2, 0.2)], 2);
        assert_eq!(out.iter().map(|c| (c.rank, c.chunk_id)).collect::<Vec<_>>(), vec![(1, 1), (2, 2)]);
    }

    #[tokio::test]
    async fn rerank_reorders() {
        let cascade = RerankCascade::new(Some(Arc::new(Fixed(vec![0.1, 0.9]))), Duration::from_secs(1), 5);
        let (out, status) = cascade.run("q", vec![candidate(0, 0.9), candidate(1, 0.5)]).await;
        assert_eq!(status, RerankStatus::Reranked);
        assert_eq!(out[0].chunk_id, 1);
        assert_eq!(out[0].rerank_score, Some(0.9));
    }

    #[tokio::test]
    async fn wrong_score_count_degrades() {
        let cascade = RerankCascade::new(Some(Arc::new(Fixed(vec![0.1]))), Duration::from_secs(1), 5);
        let (out, status) = cascade.run("q", vec![candidate(0, 0.4), candidate(1, 0.5)]).await;
        assert!(matches!(status, RerankStatus::Unreranked { .. }));
        assert_eq!(out.iter().map(|c| c.chunk_id).collect::<Vec<_>>(), vec![1, 0]);
        assert!(out.iter().all(|c| c.rerank_score.is_none()));
    }

    struct Gated {
        release: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
        finished: Arc<std::sync::atomic::AtomicBool>,
    }

    impl Reranker for Gated {
        fn model_id(&self) -> &str {
            "gated"
        }
        fn score_pairs(&self, _query: &str, passages: &[String]) -> anyhow::Result<Vec<f32>> {
            if let Ok(release) = self.release.lock() {
                let _ = release.recv();
            }
            self.finished.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(vec![1.0; passages.len()])
        }
    }

    #[tokio::test]
    async fn timed_out_call_finishes_in_background() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let (tx, rx) = std::sync::mpsc::channel();
        let finished = Arc::new(AtomicBool::new(false));
        let reranker = Arc::new(Gated { release: std::sync::Mutex::new(rx), finished: finished.clone() });
        let err = rerank_scores(reranker, "q", vec!["p".into()], Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, Error::RerankUnavailable(_)));
        assert!(!finished.load(Ordering::SeqCst));

        tx.send(()).unwrap();
        for _ in 0..200 {
            if finished.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn without_reranker_is_skipped() {
        let cascade = RerankCascade::new(None, Duration::from_secs(1), 1);
        let (out, status) = cascade.run("q", vec![candidate(0, 0.4), candidate(1, 0.5)]).await;
        assert_eq!(status, RerankStatus::Skipped);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chunk_id, 1);
    }
}
