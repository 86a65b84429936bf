use govqa_core::types::Language;

fn is_arabic(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

/// Arabic when the text contains any Arabic-script code point, English otherwise.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(is_arabic) {
        Language::Arabic
    } else {
        Language::English
    }
}

/// Language of the majority of letters: Arabic only when Arabic-script
/// letters outnumber Latin ones. Suited to longer prose that may quote a
/// name or term in the other script.
pub fn dominant_language(text: &str) -> Language {
    let (arabic, latin) = text.chars().fold((0usize, 0usize), |(a, l), c| {
        if is_arabic(c) && c.is_alphabetic() {
            (a + 1, l)
        } else if c.is_ascii_alphabetic() {
            (a, l + 1)
        } else {
            (a, l)
        }
    });
    if arabic > latin { Language::Arabic } else { Language::English }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_script() {
        assert_eq!(detect_language("كيف أحصل على رخصة قيادة"), Language::Arabic);
        assert_eq!(detect_language("How do I renew my license?"), Language::English);
        assert_eq!(detect_language("qfc العيادة"), Language::Arabic);
        assert_eq!(detect_language(""), Language::English);
    }

    #[test]
    fn dominant_language_counts_letters() {
        assert_eq!(dominant_language("Apply through the العيادة portal"), Language::English);
        assert_eq!(dominant_language("قدم الطلب عبر بوابة QFC الالكترونية"), Language::Arabic);
        assert_eq!(dominant_language("١٢٣ 456"), Language::English);
    }
}
