//! Text normalization for ingested dataset fields.
//!
//! SQuAD titles and contexts carry wiki-style artifacts: URL-encoded
//! characters and underscores standing in for spaces.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

fn blank_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n+").expect("valid regex"))
}

/// Decode URL encodings, replace underscores with spaces, and collapse runs
/// of blank lines. Invalid percent sequences are kept as-is rather than
/// failing the record.
pub fn normalize(value: &str) -> String {
    let decoded = match urlencoding::decode(value) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(value),
    };

    let spaced = decoded.replace('_', " ");
    blank_runs().replace_all(&spaced, "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_url_encodings() {
        assert_eq!(normalize("New%20York%20City"), "New York City");
    }

    #[test]
    fn replaces_underscores_with_spaces() {
        assert_eq!(normalize("University_of_Notre_Dame"), "University of Notre Dame");
    }

    #[test]
    fn collapses_blank_lines_and_trims() {
        assert_eq!(normalize("  first\n\n\nsecond \n"), "first\nsecond");
    }

    #[test]
    fn keeps_invalid_percent_sequences() {
        assert_eq!(normalize("50% of cases"), "50% of cases");
    }
}
