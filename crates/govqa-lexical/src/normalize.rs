//! Text normalization for matching and embedding.
//!
//! `normalize` is the light form applied to every query: Arabic diacritics
//! and tatweel are dropped, alef variants collapse to bare alef and runs of
//! whitespace become one space. Ta marbuta and alef maqsura are kept since
//! they distinguish words. `fold` additionally lowercases and is what all
//! lexical comparisons run on.

const TATWEEL: char = '\u{0640}';
const SUPERSCRIPT_ALEF: char = '\u{0670}';

fn is_diacritic(c: char) -> bool {
    ('\u{064B}'..='\u{065F}').contains(&c) || c == SUPERSCRIPT_ALEF
}

fn unify_letter(c: char) -> char {
    match c {
        'إ' | 'أ' | 'آ' | 'ٱ' => 'ا',
        other => other,
    }
}

/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let stripped: String =
        text.chars().filter(|&c| !is_diacritic(c) && c != TATWEEL).map(unify_letter).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized and lowercased.
pub fn fold(text: &str) -> String {
    normalize(text).to_lowercase()
}

fn is_edge_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '؟' | '،' | '؛' | '«' | '»' | '“' | '”')
}

/// Whitespace tokens of the folded text with edge punctuation trimmed.
pub fn tokens(text: &str) -> Vec<String> {
    fold(text)
        .split_whitespace()
        .map(|t| t.trim_matches(is_edge_punctuation))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_unifies_alef() {
        assert_eq!(normalize("أَحْصُلُ"), "احصل");
        assert_eq!(normalize("إسكان آمن"), "اسكان امن");
        assert_eq!(normalize("مـــدرسة"), "مدرسة");
    }

    #[test]
    fn keeps_ta_marbuta_and_alef_maqsura() {
        assert_eq!(normalize("مدرسة على"), "مدرسة على");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  driving \t\n license  "), "driving license");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn diacritic_between_spaces_leaves_one_space() {
        assert_eq!(normalize("a \u{064E} b"), "a b");
    }

    #[test]
    fn fold_lowercases() {
        assert_eq!(fold("Driving LICENSE"), "driving license");
    }

    #[test]
    fn tokens_trim_punctuation() {
        assert_eq!(tokens("كيف أحصل على رخصة؟"), vec!["كيف", "احصل", "على", "رخصة"]);
        assert_eq!(tokens("Transcript, please!"), vec!["transcript", "please"]);
    }
}
