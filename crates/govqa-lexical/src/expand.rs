use govqa_core::tables::CuratedTables;
use tracing::debug;

use crate::normalize::normalize;

/// Synonym variants added on top of the original query.
pub const MAX_SYNONYM_VARIANTS: usize = 2;
/// Queries with at most this many tokens also get a repetition variant.
pub const SHORT_QUERY_TOKENS: usize = 2;

#[derive(Debug, Clone)]
struct SynonymGroup {
    term: String,
    variants: Vec<String>,
}

/// Generates query variants to help recall on terse or paraphrased queries.
///
/// Output is the original text first, then at most
/// [`MAX_SYNONYM_VARIANTS`] synonym substitutions, then one repetition
/// variant for short queries. No two entries are equal.
#[derive(Debug, Clone, Default)]
pub struct QueryExpander {
    synonyms: Vec<SynonymGroup>,
    context: Vec<String>,
}

impl QueryExpander {
    pub fn new(tables: &CuratedTables) -> Self {
        let synonyms = tables
            .synonyms
            .iter()
            .map(|entry| {
                let term = normalize(&entry.term);
                let mut variants: Vec<String> = Vec::new();
                for v in entry.variants.iter().map(|v| normalize(v)) {
                    if !v.is_empty() && v != term && !variants.contains(&v) {
                        variants.push(v);
                    }
                }
                SynonymGroup { term, variants }
            })
            .filter(|g| !g.term.is_empty() && !g.variants.is_empty())
            .collect();
        let context = tables.short_query_context.iter().map(|w| normalize(w)).filter(|w| !w.is_empty()).collect();
        Self { synonyms, context }
    }

    pub fn is_short(text: &str) -> bool {
        text.split_whitespace().count() <= SHORT_QUERY_TOKENS
    }

    pub fn expand(&self, text: &str) -> Vec<String> {
        let mut out = vec![text.to_string()];
        let base = normalize(text);
        if base.is_empty() {
            return out;
        }

        let mut added = 0;
        'groups: for group in &self.synonyms {
            if !base.contains(group.term.as_str()) {
                continue;
            }
            for variant in &group.variants {
                if added == MAX_SYNONYM_VARIANTS {
                    break 'groups;
                }
                let candidate = base.replace(group.term.as_str(), variant);
                if !out.contains(&candidate) {
                    out.push(candidate);
                    added += 1;
                }
            }
        }

        if Self::is_short(&base) {
            let repeated = self.repetition_variant(&base);
            if !out.contains(&repeated) {
                out.push(repeated);
            }
        }
        debug!(query = text, variants = out.len(), "expanded query");
        out
    }

    fn repetition_variant(&self, base: &str) -> String {
        if self.context.is_empty() {
            return format!("{base} {base}");
        }
        self.context.iter().map(|word| format!("{word} {base}")).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> CuratedTables {
        CuratedTables::new("t", ["transportation"])
            .with_synonyms("رخصة", ["ترخيص", "تصريح"])
            .with_synonyms("طلب", ["تقديم", "استخراج"])
            .with_synonyms("أحصل", ["احصل", "اتقدم"])
            .with_short_query_context(["طلب", "خدمة", "ترخيص"])
    }

    #[test]
    fn synonym_variants_are_capped() {
        let expander = QueryExpander::new(&tables());
        let out = expander.expand("طلب رخصة قيادة جديدة");
        assert_eq!(out.len(), 1 + MAX_SYNONYM_VARIANTS);
        assert_eq!(out[0], "طلب رخصة قيادة جديدة");
        assert_eq!(out[1], "طلب ترخيص قيادة جديدة");
        assert_eq!(out[2], "طلب تصريح قيادة جديدة");
    }

    #[test]
    fn variant_equal_to_term_after_normalizing_is_dropped() {
        let expander = QueryExpander::new(&tables());
        let out = expander.expand("كيف أحصل على شهادة ميلاد");
        assert_eq!(out, vec!["كيف أحصل على شهادة ميلاد".to_string(), "كيف اتقدم على شهادة ميلاد".to_string()]);
    }

    #[test]
    fn short_query_gets_context_variant() {
        let expander = QueryExpander::new(&tables());
        let out = expander.expand("ليموزين");
        assert_eq!(out, vec!["ليموزين".to_string(), "طلب ليموزين خدمة ليموزين ترخيص ليموزين".to_string()]);
    }

    #[test]
    fn short_query_without_context_repeats() {
        let expander = QueryExpander::default();
        assert_eq!(expander.expand("transcript"), vec!["transcript".to_string(), "transcript transcript".to_string()]);
    }

    #[test]
    fn empty_query_expands_to_itself() {
        assert_eq!(QueryExpander::new(&tables()).expand("  "), vec!["  ".to_string()]);
    }
}
