//! Title, keyword and direct-match signals.

use std::collections::{BTreeMap, HashSet};

use govqa_core::tables::CuratedTables;
use govqa_core::types::{Category, Chunk, ChunkId};
use serde::Serialize;
use tracing::debug;

use crate::normalize::{fold, tokens};

/// 1.0 when either folded string contains the other, otherwise the Jaccard
/// overlap of their token sets. 0.0 when either side is empty.
pub fn title_score(query: &str, title: &str) -> f32 {
    let q = fold(query);
    let t = fold(title);
    if q.is_empty() || t.is_empty() {
        return 0.0;
    }
    if q.contains(t.as_str()) || t.contains(q.as_str()) {
        return 1.0;
    }
    let qs: HashSet<String> = tokens(&q).into_iter().collect();
    let ts: HashSet<String> = tokens(&t).into_iter().collect();
    if qs.is_empty() || ts.is_empty() {
        return 0.0;
    }
    let inter = qs.intersection(&ts).count();
    let union = qs.union(&ts).count();
    inter as f32 / union as f32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordMatch {
    pub phrase: String,
    pub category: Category,
    pub boost: f32,
}

#[derive(Debug, Clone)]
struct Phrase {
    text: String,
    category: Category,
    boost: f32,
}

/// Curated phrase -> (category, boost) matcher.
///
/// Phrases are tried longest first. An occurrence lying entirely inside an
/// already matched longer phrase does not fire, so `driving` stays silent
/// inside a matched `driving license`. Occurrences that only overlap a match
/// still count.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    phrases: Vec<Phrase>,
}

impl KeywordMatcher {
    pub fn new(tables: &CuratedTables) -> Self {
        let mut phrases: Vec<Phrase> = tables
            .keywords
            .iter()
            .map(|k| Phrase { text: fold(&k.phrase), category: k.category.clone(), boost: k.boost })
            .filter(|p| !p.text.is_empty())
            .collect();
        phrases.sort_by(|a, b| b.text.chars().count().cmp(&a.text.chars().count()));
        Self { phrases }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn matches(&self, query: &str) -> Vec<KeywordMatch> {
        let folded = fold(query);
        let mut accepted: Vec<(usize, usize)> = Vec::new();
        let mut found = Vec::new();
        for phrase in &self.phrases {
            let fresh: Vec<(usize, usize)> = folded
                .match_indices(phrase.text.as_str())
                .map(|(start, text)| (start, start + text.len()))
                .filter(|&(start, end)| !accepted.iter().any(|&(s, e)| s <= start && end <= e))
                .collect();
            if !fresh.is_empty() {
                accepted.extend(fresh);
                found.push(KeywordMatch {
                    phrase: phrase.text.clone(),
                    category: phrase.category.clone(),
                    boost: phrase.boost,
                });
            }
        }
        found
    }
}

/// Highest boost per category across a set of matches.
pub fn category_boosts<'a, I>(matches: I) -> BTreeMap<Category, f32>
where
    I: IntoIterator<Item = &'a KeywordMatch>,
{
    let mut boosts: BTreeMap<Category, f32> = BTreeMap::new();
    for m in matches {
        let slot = boosts.entry(m.category.clone()).or_insert(0.0);
        *slot = slot.max(m.boost);
    }
    boosts
}

#[derive(Debug, Clone)]
struct DirectPattern {
    pattern: String,
    source_fragment: String,
}

/// Query patterns that name one specific source document.
#[derive(Debug, Clone, Default)]
pub struct DirectMatcher {
    patterns: Vec<DirectPattern>,
}

impl DirectMatcher {
    pub fn new(tables: &CuratedTables) -> Self {
        let patterns = tables
            .direct_matches
            .iter()
            .map(|d| DirectPattern { pattern: fold(&d.pattern), source_fragment: d.source_fragment.to_lowercase() })
            .filter(|d| !d.pattern.is_empty())
            .collect();
        Self { patterns }
    }

    /// Source fragments whose pattern occurs in the query, in table order, deduplicated.
    pub fn fragments(&self, query: &str) -> Vec<String> {
        let query = fold(query);
        let mut out: Vec<String> = Vec::new();
        for p in &self.patterns {
            if query.contains(p.pattern.as_str()) && !out.contains(&p.source_fragment) {
                out.push(p.source_fragment.clone());
            }
        }
        out
    }
}

/// Signals for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChunkSignals {
    pub chunk_id: ChunkId,
    pub title: f32,
    pub keyword: f32,
    pub direct_match: bool,
}

/// Compiled lexical tables.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    keywords: KeywordMatcher,
    direct: DirectMatcher,
    direct_match_boost: f32,
}

impl LexicalScorer {
    pub fn new(tables: &CuratedTables, direct_match_boost: f32) -> Self {
        Self {
            keywords: KeywordMatcher::new(tables),
            direct: DirectMatcher::new(tables),
            direct_match_boost,
        }
    }

    pub fn keywords(&self) -> &KeywordMatcher {
        &self.keywords
    }

    /// Resolve a query, given in one or more forms (original, translated,
    /// ...), into the per-category boosts and direct-match fragments that
    /// apply to it. Keyword matches are the union across forms.
    pub fn prepare<S: AsRef<str>>(&self, forms: &[S]) -> QuerySignals {
        let folded: Vec<String> = forms.iter().map(|f| fold(f.as_ref())).filter(|f| !f.is_empty()).collect();
        let mut matches = Vec::new();
        let mut fragments: Vec<String> = Vec::new();
        for form in &folded {
            matches.extend(self.keywords.matches(form));
            for fragment in self.direct.fragments(form) {
                if !fragments.contains(&fragment) {
                    fragments.push(fragment);
                }
            }
        }
        if !matches.is_empty() || !fragments.is_empty() {
            debug!(
                phrases = ?matches.iter().map(|m| m.phrase.as_str()).collect::<Vec<_>>(),
                direct = ?fragments,
                "lexical matches"
            );
        }
        QuerySignals {
            boosts: category_boosts(&matches),
            matches,
            fragments,
            forms: folded,
            direct_match_boost: self.direct_match_boost,
        }
    }
}

/// A query resolved against the lexical tables, ready to score chunks.
#[derive(Debug, Clone)]
pub struct QuerySignals {
    forms: Vec<String>,
    matches: Vec<KeywordMatch>,
    boosts: BTreeMap<Category, f32>,
    fragments: Vec<String>,
    direct_match_boost: f32,
}

impl QuerySignals {
    pub fn matches(&self) -> &[KeywordMatch] {
        &self.matches
    }

    pub fn category_boost(&self, category: &Category) -> f32 {
        self.boosts.get(category).copied().unwrap_or(0.0)
    }

    pub fn direct_fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Best title score over the query forms.
    pub fn title_score(&self, title: &str) -> f32 {
        self.forms.iter().map(|f| title_score(f, title)).fold(0.0, f32::max)
    }

    /// Score `chunks`. For each direct-match fragment, the lowest-id chunk
    /// whose source id contains it has its keyword score forced to the
    /// direct-match boost.
    pub fn score_chunks<'a, I>(&self, chunks: I) -> Vec<ChunkSignals>
    where
        I: IntoIterator<Item = &'a Chunk>,
    {
        let mut direct: Vec<Option<ChunkId>> = vec![None; self.fragments.len()];
        let mut out: Vec<ChunkSignals> = Vec::new();
        for chunk in chunks {
            if !self.fragments.is_empty() {
                let source = chunk.source_id.to_lowercase();
                for (slot, fragment) in direct.iter_mut().zip(&self.fragments) {
                    if source.contains(fragment.as_str()) && slot.map_or(true, |id| chunk.id < id) {
                        *slot = Some(chunk.id);
                    }
                }
            }
            out.push(ChunkSignals {
                chunk_id: chunk.id,
                title: self.title_score(&chunk.title),
                keyword: self.category_boost(&chunk.category),
                direct_match: false,
            });
        }
        for id in direct.into_iter().flatten() {
            if let Some(s) = out.iter_mut().find(|s| s.chunk_id == id) {
                debug!(chunk_id = id, "direct source match");
                s.keyword = self.direct_match_boost;
                s.direct_match = true;
            }
        }
        out
    }
}
