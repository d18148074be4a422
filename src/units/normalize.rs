//! # Unit Text Normalization
//!
//! Rewrites unit strings into a form a conversion backend can digest:
//!
//! - micro-prefixed units (`µm`) become bracketed custom tokens
//!   (`<microfrogm>`) and back again;
//! - bracketed custom tokens can be listed and unwrapped;
//! - whole-word custom units can be wrapped in brackets;
//! - reciprocal notation (`1/bar`, `1/(1/s)`) becomes explicit negative
//!   exponents (`(bar)**(-1)`).
//!
//! ```rust
//! use equationer::units::normalize::{convert_inverse_units, tag_micro_units, untag_micro_units};
//!
//! let tagged = tag_micro_units("µm/s");
//! assert_eq!(tagged, "<microfrogm>/s");
//! assert_eq!(untag_micro_units(&tagged), "µm/s");
//!
//! assert_eq!(convert_inverse_units("1/bar", 100), "(bar)**(-1)");
//! ```

use itertools::Itertools;
use log::trace;

/// Characters recognised as the metric micro prefix.
///
/// The first entry (MICRO SIGN) is the canonical form; the rest are GREEK
/// SMALL LETTER MU and the bold and italic mathematical mu.
pub const MICRO_SIGNS: [char; 4] = ['\u{00B5}', '\u{03BC}', '\u{1D6CD}', '\u{1D707}'];

const MICRO_TAG: &str = "microfrog";

/// Default iteration bound for [`convert_inverse_units`].
pub const DEFAULT_INVERSE_DEPTH: usize = 100;

fn micro_variant(c: char) -> Option<usize> {
    MICRO_SIGNS.iter().position(|&m| m == c)
}

/// Replaces every micro sign variant with the canonical MICRO SIGN.
pub fn canonicalize_micro_signs(units: &str) -> String {
    units
        .chars()
        .map(|c| if micro_variant(c).is_some() { MICRO_SIGNS[0] } else { c })
        .collect()
}

/// Finds each micro sign immediately followed by one or more ASCII letters.
fn micro_matches(units: &str) -> Vec<(usize, &str)> {
    let mut found = Vec::new();
    let mut chars = units.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let Some(variant) = micro_variant(c) else {
            continue;
        };
        let letters_start = start + c.len_utf8();
        let letters = units[letters_start..]
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        if letters == 0 {
            continue;
        }

        let end = letters_start + letters;
        found.push((variant, &units[start..end]));
        while chars.peek().is_some_and(|(i, _)| *i < end) {
            chars.next();
        }
    }

    found
}

fn micro_tag(variant: usize, letters: &str) -> String {
    match variant {
        0 => format!("<{}{}>", MICRO_TAG, letters),
        v => format!("<{}{}{}>", MICRO_TAG, v, letters),
    }
}

/// Rewrites micro-prefixed units to bracketed `microfrog` tokens.
///
/// The canonical MICRO SIGN maps to `<microfrogX>`. The other variants
/// carry their index (`<microfrog1X>`) so that [`untag_micro_units`] can
/// restore the exact glyph. Strings without a micro sign come back
/// unchanged.
pub fn tag_micro_units(units: &str) -> String {
    if !units.chars().any(|c| micro_variant(c).is_some()) {
        return units.to_string();
    }

    let matches = micro_matches(units)
        .into_iter()
        .unique_by(|(_, m)| *m)
        .sorted_by(|(_, a), (_, b)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
        .collect::<Vec<_>>();

    let mut tagged = units.to_string();
    for (variant, matched) in matches {
        let letters = matched.trim_start_matches(MICRO_SIGNS);
        tagged = tagged.replace(matched, &micro_tag(variant, letters));
    }

    trace!("Tagged micro units: '{}' -> '{}'", units, tagged);
    tagged
}

/// Restores micro signs from tokens produced by [`tag_micro_units`].
pub fn untag_micro_units(units: &str) -> String {
    let opener = format!("<{}", MICRO_TAG);
    if !units.contains(&opener) {
        return units.to_string();
    }

    let mut out = String::with_capacity(units.len());
    let mut rest = units;
    while let Some(at) = rest.find(&opener) {
        out.push_str(&rest[..at]);
        let after = &rest[at + opener.len()..];
        match parse_micro_tag_body(after) {
            Some((sign, letters, consumed)) => {
                out.push(sign);
                out.push_str(letters);
                rest = &after[consumed..];
            }
            None => {
                out.push_str(&opener);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses `[digit]letters>` after the tag opener.
fn parse_micro_tag_body(body: &str) -> Option<(char, &str, usize)> {
    let (sign, digits) = match body.as_bytes().first() {
        Some(d @ b'1'..=b'3') => (MICRO_SIGNS[usize::from(d - b'0')], 1),
        _ => (MICRO_SIGNS[0], 0),
    };
    let letters = body[digits..]
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    if letters == 0 || body.as_bytes().get(digits + letters) != Some(&b'>') {
        return None;
    }
    Some((sign, &body[digits..digits + letters], digits + letters + 1))
}

/// Spans of `<...>` tags: `(start of '<', end after '>')`.
fn tag_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    while let Some(open) = text[offset..].find('<') {
        let open = offset + open;
        let Some(rel) = text[open + 1..].find('>') else {
            break;
        };
        let end = open + 1 + rel + 1;
        spans.push((open, end));
        offset = end;
    }
    spans
}

/// Lists the unique tag names (`X` for each `<X>`) in `text`, longest
/// first so that no tag is substituted before a longer one containing it.
pub fn extract_tagged_strings(text: &str) -> Vec<String> {
    tag_spans(text)
        .into_iter()
        .map(|(start, end)| &text[start + 1..end - 1])
        .unique()
        .sorted_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
        .map(str::to_string)
        .collect()
}

/// Strips tag delimiters: `<X>` becomes `X`.
pub fn remove_tagged_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in tag_spans(text) {
        out.push_str(&text[last..start]);
        out.push_str(&text[start + 1..end - 1]);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

fn is_word_char(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_boundary(text: &str, at: usize) -> bool {
    let before = text[..at].chars().next_back();
    let after = text[at..].chars().next();
    is_word_char(before) != is_word_char(after)
}

fn wrap_whole_words(text: &str, token: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut search = 0;

    while let Some(rel) = text[search..].find(token) {
        let start = search + rel;
        let end = start + token.len();
        if is_boundary(text, start) && is_boundary(text, end) {
            out.push_str(&text[last..start]);
            out.push('<');
            out.push_str(token);
            out.push('>');
            last = end;
            search = end;
        } else {
            search = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
    }

    out.push_str(&text[last..]);
    out
}

/// Wraps every whole-word occurrence of each custom unit in `<...>`.
///
/// Longer tokens are processed first, and the word-boundary check keeps a
/// short token such as `m` from matching inside `mm`.
pub fn return_custom_units_markup<S: AsRef<str>>(units: &str, custom_units: &[S]) -> String {
    custom_units
        .iter()
        .map(AsRef::as_ref)
        .filter(|token| !token.is_empty())
        .sorted_by(|a, b| b.len().cmp(&a.len()))
        .fold(units.to_string(), |text, token| wrap_whole_words(&text, token))
}

/// `1/(1/X)` becomes `(1/X)**(-1)`, using the first `)` after the inner
/// `1/` as the closing parenthesis.
fn replace_nested_inverse(text: &str) -> String {
    const OPEN: &str = "1/(1/";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(OPEN) {
        let inner_start = at + 3;
        let close = rest[at + OPEN.len()..]
            .find([')', '\n'])
            .map(|rel| at + OPEN.len() + rel)
            .filter(|&i| rest.as_bytes()[i] == b')');

        match close {
            Some(close) => {
                out.push_str(&rest[..at]);
                out.push('(');
                out.push_str(&rest[inner_start..close]);
                out.push_str(")**(-1)");
                rest = &rest[close + 1..];
            }
            None => {
                out.push_str(&rest[..at + 1]);
                rest = &rest[at + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// `1/X` with `X` a run of ASCII letters becomes `(X)**(-1)`.
fn replace_simple_inverse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find("1/") {
        let letters = rest[at + 2..]
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        if letters == 0 {
            out.push_str(&rest[..at + 1]);
            rest = &rest[at + 1..];
            continue;
        }

        out.push_str(&rest[..at]);
        out.push('(');
        out.push_str(&rest[at + 2..at + 2 + letters]);
        out.push_str(")**(-1)");
        rest = &rest[at + 2 + letters..];
    }
    out.push_str(rest);
    out
}

/// Rewrites reciprocal units to negative exponents, repeating until the
/// text stops changing or `depth` passes have run.
pub fn convert_inverse_units(expression: &str, depth: usize) -> String {
    let mut current = expression.to_string();
    for _ in 0..depth {
        let next = replace_simple_inverse(&replace_nested_inverse(&current));
        if next == current {
            break;
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tag_micro_longest_first() {
        assert_eq!(
            tag_micro_units("µmol/µm"),
            "<microfrogmol>/<microfrogm>"
        );
    }

    #[test]
    fn test_tag_without_micro_is_identity() {
        assert_eq!(tag_micro_units("kg*m/s**2"), "kg*m/s**2");
        assert_eq!(untag_micro_units("kg*m/s**2"), "kg*m/s**2");
    }

    #[test]
    fn test_micro_variants_round_trip() {
        for input in ["\u{03BC}m", "\u{1D6CD}s*µg", "\u{1D707}L/min", "µ alone"] {
            assert_eq!(untag_micro_units(&tag_micro_units(input)), input);
        }
        assert_eq!(tag_micro_units("\u{03BC}m"), "<microfrog1m>");
    }

    #[test]
    fn test_canonical_micro_sign() {
        assert_eq!(canonicalize_micro_signs("\u{03BC}m/\u{1D707}s"), "µm/µs");
    }

    #[test]
    fn test_extract_tagged_strings() {
        assert_eq!(
            extract_tagged_strings("<frog>*<frogs>/<frog>"),
            vec!["frogs".to_string(), "frog".to_string()]
        );
        assert!(extract_tagged_strings("kg/m").is_empty());
    }

    #[test]
    fn test_remove_tagged_strings() {
        assert_eq!(remove_tagged_strings("<microfrogm>/<frog>*s"), "microfrogm/frog*s");
        assert_eq!(remove_tagged_strings("a < b"), "a < b");
    }

    #[test]
    fn test_custom_markup_respects_word_boundaries() {
        assert_eq!(
            return_custom_units_markup("mm*m/frog", &["m", "mm", "frog"]),
            "<mm>*<m>/<frog>"
        );
        assert_eq!(return_custom_units_markup("frogs", &["frog"]), "frogs");
    }

    #[test]
    fn test_convert_inverse_units() {
        assert_eq!(convert_inverse_units("1/bar", 100), "(bar)**(-1)");
        assert_eq!(convert_inverse_units("1/(1/s)", 100), "((s)**(-1))**(-1)");
        assert_eq!(convert_inverse_units("kg*m", 100), "kg*m");
        assert_eq!(convert_inverse_units("1/(1/s)", 1), "((s)**(-1))**(-1)");
        assert_eq!(convert_inverse_units("1/(1/s)", 0), "1/(1/s)");
    }
}
