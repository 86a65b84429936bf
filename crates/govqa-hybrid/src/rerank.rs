use std::collections::HashSet;

use govqa_core::traits::Reranker;
use govqa_lexical::tokens;

/// Scores a passage by the fraction of distinct query terms it contains.
///
/// A local stand-in for a cross-encoder: no model, no network, and good
/// enough to tell "transcript request" from "university admission".
#[derive(Debug, Clone, Copy, Default)]
pub struct TermOverlapReranker;

impl Reranker for TermOverlapReranker {
    fn model_id(&self) -> &str {
        "term-overlap"
    }

    fn score_pairs(&self, query: &str, passages: &[String]) -> anyhow::Result<Vec<f32>> {
        let terms: HashSet<String> = tokens(query).into_iter().collect();
        if terms.is_empty() {
            return Ok(vec![0.0; passages.len()]);
        }
        Ok(passages
            .iter()
            .map(|p| {
                let words: HashSet<String> = tokens(p).into_iter().collect();
                terms.iter().filter(|t| words.contains(*t)).count() as f32 / terms.len() as f32
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_of_terms_present() {
        let scores = TermOverlapReranker
            .score_pairs(
                "transcript request",
                &["Transcript Request\nOrder online.".to_string(), "University Admission".to_string()],
            )
            .unwrap();
        assert_eq!(scores, vec![1.0, 0.0]);
    }

    #[test]
    fn normalizes_arabic() {
        let scores = TermOverlapReranker.score_pairs("أحصل رخصة", &["كيف احصل على رخصة".to_string()]).unwrap();
        assert_eq!(scores, vec![1.0]);
    }

    #[test]
    fn empty_query_scores_zero() {
        assert_eq!(TermOverlapReranker.score_pairs(" ", &["x".to_string()]).unwrap(), vec![0.0]);
    }
}
