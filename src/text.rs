//! Small helpers for the HTML-ish text character records carry.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Replace every HTML tag with a space.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, " ").into_owned()
}

/// Decode the handful of entities that show up in dice and stat text.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace('\u{a0}', " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace into one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Decode entities, then collapse whitespace.
///
/// ```rust
/// use charstat::text::normalize;
///
/// assert_eq!(normalize(" 1d8&nbsp;+ 3 \n slashing "), "1d8 + 3 slashing");
/// ```
pub fn normalize(text: &str) -> String {
    collapse_whitespace(&decode_entities(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            collapse_whitespace(&strip_tags("<p><strong>Armor Class</strong> 13</p>")),
            "Armor Class 13"
        );
    }

    #[test]
    fn test_amp_decoded_last() {
        assert_eq!(decode_entities("&amp;nbsp;"), "&nbsp;");
        assert_eq!(decode_entities("Fire &amp; Cold"), "Fire & Cold");
    }
}
