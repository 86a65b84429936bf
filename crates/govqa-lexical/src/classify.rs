use std::collections::BTreeMap;

use govqa_core::error::{Error, Result};
use govqa_core::tables::CuratedTables;
use govqa_core::types::Category;
use serde::Serialize;
use tracing::debug;

use crate::normalize::fold;

/// Outcome of scoring a query against every category's keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    NoMatch,
    Category { category: Category, score: usize },
    Ambiguous { tied: Vec<Category>, score: usize },
}

impl Classification {
    pub fn category(&self) -> Option<&Category> {
        match self {
            Self::Category { category, .. } => Some(category),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }
}

/// Keyword-count category guesser.
///
/// A category's score is the number of its keywords occurring in the query
/// (case-insensitive substring). Only a strict winner is returned.
#[derive(Debug, Clone, Default)]
pub struct CategoryClassifier {
    keywords: BTreeMap<Category, Vec<String>>,
}

impl CategoryClassifier {
    pub fn new(tables: &CuratedTables) -> Self {
        let mut keywords: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for entry in &tables.classifier {
            let list = keywords.entry(entry.category.clone()).or_default();
            for keyword in entry.keywords.iter().map(|k| fold(k)) {
                if !keyword.is_empty() && !list.contains(&keyword) {
                    list.push(keyword);
                }
            }
        }
        Self { keywords }
    }

    /// Per-category keyword hit counts, in category order.
    pub fn scores(&self, query: &str) -> Vec<(Category, usize)> {
        let query = fold(query);
        self.keywords
            .iter()
            .map(|(category, keywords)| {
                let hits = keywords.iter().filter(|k| query.contains(k.as_str())).count();
                (category.clone(), hits)
            })
            .collect()
    }

    pub fn classify_detailed(&self, query: &str) -> Classification {
        let scores = self.scores(query);
        let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        let outcome = if best == 0 {
            Classification::NoMatch
        } else {
            let mut tied: Vec<Category> = scores.into_iter().filter(|(_, s)| *s == best).map(|(c, _)| c).collect();
            if tied.len() == 1 {
                Classification::Category { category: tied.remove(0), score: best }
            } else {
                Classification::Ambiguous { tied, score: best }
            }
        };
        debug!(query, ?outcome, "classified query");
        outcome
    }

    /// The strictly top-scoring category, or `None` when nothing matched or
    /// the top score is shared.
    pub fn classify(&self, query: &str) -> Option<Category> {
        self.classify_detailed(query).category().cloned()
    }

    /// Like [`classify`](Self::classify) but a shared top score is an `AmbiguousCategory` error.
    pub fn classify_strict(&self, query: &str) -> Result<Option<Category>> {
        match self.classify_detailed(query) {
            Classification::NoMatch => Ok(None),
            Classification::Category { category, .. } => Ok(Some(category)),
            Classification::Ambiguous { tied, .. } => {
                Err(Error::AmbiguousCategory(tied.iter().map(ToString::to_string).collect()))
            }
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.keywords.keys()
    }
}
