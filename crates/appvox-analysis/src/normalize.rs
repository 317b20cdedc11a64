//! Canonical text normalization used by every downstream stage.
//!
//! The step order is load-bearing: HTML stripping runs before transliteration
//! so entity-decoded characters get folded to ASCII, and transliteration runs
//! before the regex cleanup so the character-class replacement only ever sees
//! ASCII input.

use std::sync::LazyLock;

use regex::Regex;

static SPECIALS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?-]").expect("valid specials regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Normalize arbitrary review text into the canonical plain-text form.
///
/// Steps, in fixed order:
/// 1. strip HTML tags and decode entities (best effort, never fails),
/// 2. transliterate Unicode to closest ASCII (emoji vanish, accents fold),
/// 3. lowercase,
/// 4. replace everything outside `[\w\s.,!?-]` with a space,
/// 5. collapse whitespace runs to a single space,
/// 6. trim.
///
/// Empty input short-circuits to an empty string. The function is total and
/// idempotent: a markup-only or emoji-only review legitimately normalizes to
/// the empty string rather than producing an error.
#[must_use]
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = strip_html(text);
    let text = transliterate(&text);
    let text = text.to_lowercase();
    let text = SPECIALS_RE.replace_all(&text, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Fold non-ASCII letters and digits to their closest ASCII equivalents.
///
/// Only alphanumeric characters are transliterated ("é" → "e", "中" → "Zhong").
/// Emoji and symbols have no meaningful ASCII equivalent for review analysis
/// and are dropped outright — `deunicode` would otherwise expand "😀" into a
/// word, which must not resurrect an emoji-only review that the mapper is
/// required to filter out.
fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else if ch.is_alphanumeric() {
            if let Some(ascii) = deunicode::deunicode_char(ch) {
                out.push_str(ascii);
            }
        }
        // Non-ASCII symbols and emoji fall through and disappear.
    }
    out
}

/// Strip HTML tags with a character scanner and decode entities.
///
/// Malformed markup cannot make this fail: an unterminated tag simply drops
/// the trailing characters, and an undecodable entity falls back to the
/// tag-stripped text as-is.
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                // Tags act as word boundaries: "<p>a</p><p>b</p>" must not
                // fuse into "ab".
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    match quick_xml::escape::unescape(&out) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn whitespace_only_returns_empty() {
        assert_eq!(normalize("  \t\n "), "");
    }

    #[test]
    fn strips_html_tags() {
        assert_eq!(normalize("<b>Great</b> app"), "great app");
    }

    #[test]
    fn tags_act_as_word_boundaries() {
        assert_eq!(normalize("<p>first</p><p>second</p>"), "first second");
    }

    #[test]
    fn decodes_html_entities() {
        assert_eq!(normalize("fun &amp; games"), "fun games");
        assert_eq!(normalize("a &lt; b"), "a b");
    }

    #[test]
    fn malformed_html_does_not_panic() {
        // Unterminated tag: scanner drops the tail, no error.
        assert_eq!(normalize("good <b unfinished"), "good");
        // Stray ampersand: unescape fails, falls back to stripped text.
        assert_eq!(normalize("tom & jerry"), "tom jerry");
    }

    #[test]
    fn transliterates_accents() {
        assert_eq!(normalize("très café"), "tres cafe");
    }

    #[test]
    fn emoji_only_normalizes_to_empty() {
        assert_eq!(normalize("😀😀"), "");
        assert_eq!(normalize("<b>😀😀</b>"), "");
    }

    #[test]
    fn lowercases() {
        assert_eq!(normalize("LOVE It"), "love it");
    }

    #[test]
    fn keeps_basic_punctuation() {
        assert_eq!(
            normalize("Crashes constantly, very buggy!"),
            "crashes constantly, very buggy!"
        );
        assert_eq!(normalize("why? well - ok."), "why? well - ok.");
    }

    #[test]
    fn replaces_specials_with_space() {
        assert_eq!(normalize("50% off @ launch"), "50 off launch");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("a \t b\n\nc"), "a b c");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "<p>Ça c'est&nbsp;GÉNIAL&hellip;</p>",
            "plain text already",
            "Crashes constantly, very buggy",
            "  spaced\tout  ",
            "😀 mixed ASCII 😀 and emoji!",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }
}
