use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalizes raw extracted text: NFKC folding, whitespace-run collapse,
/// control-character removal, and trimming, in that order.
///
/// Total over all inputs and idempotent: `clean(clean(x)) == clean(x)`.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let folded: String = text.nfkc().collect();
    let collapsed = WHITESPACE_RUN.replace_all(&folded, " ");
    let stripped: String = collapsed.chars().filter(|ch| !ch.is_control()).collect();

    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_mixed_whitespace_and_strips_controls() {
        assert_eq!(clean("Hello   World! \u{0000}"), "Hello World!");
        assert_eq!(clean("a\t\tb\n\nc"), "a b c");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "Hello   World! \u{0000}",
            "  spaced\tout\n text \u{0007} ",
            "ﬁle ﬂow ①",
            "",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "clean not idempotent for {input:?}");
        }
    }

    #[test]
    fn folds_compatibility_characters() {
        // NFKC maps the ligature and the circled digit to plain forms.
        assert_eq!(clean("ﬁle ①"), "file 1");
    }

    #[test]
    fn empty_and_whitespace_only_become_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean(" \t\n "), "");
    }
}
