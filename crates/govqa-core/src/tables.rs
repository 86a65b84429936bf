//! Curated, versioned lookup tables supplied at startup.
//!
//! The tables are data, not code: the classifier keyword lists, the
//! phrase -> (category, boost) map, direct document matches, synonym pairs
//! and the short-query context words all come from one TOML document.
//!
//! ```toml
//! version = "2024-06"
//! categories = ["health", "transportation"]
//!
//! [[classifier]]
//! category = "health"
//! keywords = ["صحة", "طبيب"]
//!
//! [[keywords]]
//! phrase = "driving license"
//! category = "transportation"
//! boost = 2.0
//! ```

use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Category, CategorySet};

fn default_boost() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierEntry {
    pub category: Category,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub phrase: String,
    pub category: Category,
    #[serde(default = "default_boost")]
    pub boost: f32,
}

/// A query pattern that names one specific source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMatchEntry {
    pub pattern: String,
    pub source_fragment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymEntry {
    pub term: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CuratedTables {
    pub version: String,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub classifier: Vec<ClassifierEntry>,
    #[serde(default)]
    pub keywords: Vec<KeywordEntry>,
    #[serde(default)]
    pub direct_matches: Vec<DirectMatchEntry>,
    #[serde(default)]
    pub synonyms: Vec<SynonymEntry>,
    /// Context words interleaved with terse queries to form a repetition variant.
    #[serde(default)]
    pub short_query_context: Vec<String>,
}

impl CuratedTables {
    pub fn new<I, C>(version: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Category>,
    {
        Self {
            version: version.into(),
            categories: categories.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("curated tables at {}", path.display())).into());
        }
        let tables: Self = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to parse tables {}: {}", path.display(), e))?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        let tables: Self = Figment::new()
            .merge(Toml::string(source))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to parse tables: {}", e))?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn category_set(&self) -> CategorySet {
        CategorySet::new(self.categories.iter().cloned())
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::InvalidConfig("tables declare no categories".into()));
        }
        let known: HashSet<&Category> = self.categories.iter().collect();
        let check = |category: &Category, what: &str| {
            if known.contains(category) {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{what} refers to undeclared category '{category}'")))
            }
        };
        for entry in &self.classifier {
            check(&entry.category, "classifier entry")?;
            if entry.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(Error::InvalidConfig(format!("empty classifier keyword for '{}'", entry.category)));
            }
        }
        for entry in &self.keywords {
            check(&entry.category, &format!("keyword '{}'", entry.phrase))?;
            if entry.phrase.trim().is_empty() {
                return Err(Error::InvalidConfig("empty keyword phrase".into()));
            }
            if !entry.boost.is_finite() || entry.boost <= 0.0 {
                return Err(Error::InvalidConfig(format!("keyword '{}' has non-positive boost", entry.phrase)));
            }
        }
        for entry in &self.direct_matches {
            if entry.pattern.trim().is_empty() || entry.source_fragment.trim().is_empty() {
                return Err(Error::InvalidConfig("direct match entries need a pattern and a fragment".into()));
            }
        }
        for entry in &self.synonyms {
            if entry.term.trim().is_empty() {
                return Err(Error::InvalidConfig("empty synonym term".into()));
            }
        }
        Ok(())
    }

    pub fn with_classifier<I, S>(mut self, category: impl Into<Category>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classifier.push(ClassifierEntry {
            category: category.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_keyword(mut self, phrase: impl Into<String>, category: impl Into<Category>, boost: f32) -> Self {
        self.keywords.push(KeywordEntry { phrase: phrase.into(), category: category.into(), boost });
        self
    }

    pub fn with_direct_match(mut self, pattern: impl Into<String>, source_fragment: impl Into<String>) -> Self {
        self.direct_matches
            .push(DirectMatchEntry { pattern: pattern.into(), source_fragment: source_fragment.into() });
        self
    }

    pub fn with_synonyms<I, S>(mut self, term: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms.push(SynonymEntry {
            term: term.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_short_query_context<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.short_query_context = words.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = "test-1"
categories = ["transportation", "education"]

[[classifier]]
category = "education"
keywords = ["جامعة", "مدرسة"]

[[keywords]]
phrase = "driving license"
category = "transportation"
boost = 2.0

[[keywords]]
phrase = "transcript"
category = "education"

[[direct_matches]]
pattern = "transcript"
source_fragment = "transcript"

[[synonyms]]
term = "رخصة"
variants = ["ترخيص", "تصريح"]
"#;

    #[test]
    fn parses_and_defaults_boost() {
        let tables = CuratedTables::from_toml_str(SAMPLE).unwrap();
        assert_eq!(tables.version, "test-1");
        assert_eq!(tables.keywords.len(), 2);
        assert_eq!(tables.keywords[1].boost, 1.0);
        assert_eq!(tables.category_set().len(), 2);
        assert!(tables.short_query_context.is_empty());
    }

    #[test]
    fn undeclared_category_rejected() {
        let tables = CuratedTables::new("v", ["health"]).with_keyword("court", "justice", 1.5);
        assert!(matches!(tables.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn non_positive_boost_rejected() {
        let tables = CuratedTables::new("v", ["health"]).with_keyword("doctor", "health", 0.0);
        assert!(tables.validate().is_err());
    }
}
