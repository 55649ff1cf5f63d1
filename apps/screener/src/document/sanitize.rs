//! Text sanitizer: normalizes arbitrary input into an ASCII-biased character stream
//! that is safe to hand to the LLM transport.
//!
//! Rules, per character:
//! - ASCII printable or ASCII whitespace: kept.
//! - Other ASCII (control characters): dropped.
//! - Non-ASCII alphanumeric or allow-listed typographic punctuation: kept verbatim.
//! - Anything else: replaced by a single space so word boundaries survive.

/// Non-ASCII punctuation common in resumes that is safe to keep.
const PUNCTUATION_ALLOW_LIST: &[char] = &[
    '\u{2013}', // en dash
    '\u{2014}', // em dash
    '\u{2018}', // left single quote
    '\u{2019}', // right single quote
    '\u{201C}', // left double quote
    '\u{201D}', // right double quote
    '\u{2026}', // ellipsis
];

pub fn sanitize(text: &str) -> String {
    text.chars().filter_map(sanitize_char).collect()
}

/// Decodes raw bytes as UTF-8 (invalid sequences become U+FFFD) and sanitizes the result.
pub fn sanitize_bytes(bytes: &[u8]) -> String {
    sanitize(&String::from_utf8_lossy(bytes))
}

fn sanitize_char(c: char) -> Option<char> {
    if c.is_ascii() {
        if c.is_ascii_graphic() || is_ascii_space(c) {
            Some(c)
        } else {
            None
        }
    } else if c.is_alphanumeric() || PUNCTUATION_ALLOW_LIST.contains(&c) {
        Some(c)
    } else {
        Some(' ')
    }
}

fn is_ascii_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_empty() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_plain_ascii_unchanged() {
        let text = "Senior Engineer\n\t- Built CI/CD pipelines (40% faster) & more!";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_ascii_control_characters_dropped() {
        assert_eq!(sanitize("a\x07b\x00c\x1bd"), "abcd");
    }

    #[test]
    fn test_non_ascii_letters_kept() {
        assert_eq!(sanitize("José Müller, Zürich"), "José Müller, Zürich");
    }

    #[test]
    fn test_symbols_replaced_with_space() {
        assert_eq!(sanitize("Python\u{2022}Docker"), "Python Docker");
        assert_eq!(sanitize("go\u{1F680}fast"), "go fast");
        assert_eq!(sanitize("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_allow_listed_punctuation_kept() {
        assert_eq!(sanitize("2019\u{2013}2023"), "2019\u{2013}2023");
        assert_eq!(sanitize("\u{201C}lead\u{201D}"), "\u{201C}lead\u{201D}");
    }

    #[test]
    fn test_invalid_utf8_bytes_become_space() {
        let bytes = b"Rust \xff\xfe developer";
        assert_eq!(sanitize_bytes(bytes), "Rust    developer");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "plain ascii text 123",
            "mixed \u{2022} ünïcödé \u{1F600} \x07 text\u{00A0}here",
            "\u{200B}\u{FEFF}zero width",
            "日本語の履歴書 \u{3000} Kubernetes",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }
}
