//! ISBN canonicalisation
//!
//! Every identifier the engine compares goes through [`normalize`] first, so
//! that `978-0-14-017593-6`, `9780140175936` and a spreadsheet's
//! `9.780140175936E+12` all meet as the same 13-digit key.

use serde_json::Value;

use crate::core::fields::{value_text, RawRow, REPO_ISBN};

/// Length of a canonical identifier
pub const IDENTIFIER_LEN: usize = 13;

/// Shortest digit run accepted as an identifier (ISBN-10)
pub const MIN_IDENTIFIER_DIGITS: usize = 10;

/// Canonicalise a raw ISBN-like string
///
/// Scientific notation is repaired first, then every non-digit is dropped.
/// Runs of 10-12 digits are left-padded with zeros to 13; anything else is
/// returned as-is and will fail [`is_valid_identifier`].
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let repaired;
    let source = if trimmed.contains(['e', 'E']) {
        repaired = repair_scientific(trimmed);
        repaired.as_str()
    } else {
        trimmed
    };

    let digits: String = source.chars().filter(|c| c.is_ascii_digit()).collect();
    if (MIN_IDENTIFIER_DIGITS..IDENTIFIER_LEN).contains(&digits.len()) {
        format!("{:0>width$}", digits, width = IDENTIFIER_LEN)
    } else {
        digits
    }
}

/// Canonicalise a raw cell (string or number)
pub fn normalize_value(value: &Value) -> String {
    normalize(&value_text(value))
}

/// Whether a string holds between 10 and 13 digits once separators are removed
pub fn is_valid_identifier(raw: &str) -> bool {
    let count = raw.chars().filter(|c| c.is_ascii_digit()).count();
    (MIN_IDENTIFIER_DIGITS..=IDENTIFIER_LEN).contains(&count)
}

/// Canonical 13-digit identifier, or `None` when the input cannot be one
pub fn canonical(raw: &str) -> Option<String> {
    let normalized = normalize(raw);
    (normalized.len() == IDENTIFIER_LEN).then_some(normalized)
}

/// Pull the identifier out of a repository record using the alias table
///
/// Returns an empty string when no identifier column is present.
pub fn extract_identifier(row: &RawRow) -> String {
    REPO_ISBN.get(row).map(normalize_value).unwrap_or_default()
}

/// Re-render `9.78014E+12` style text as a fixed-point integer
///
/// Unparseable text yields an empty string rather than its stray digits.
fn repair_scientific(text: &str) -> String {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{:.0}", value),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_passes_thirteen_digits() {
        assert_eq!(normalize("9780140175936"), "9780140175936");
    }

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize(" 978-0-14-017593-6 "), "9780140175936");
    }

    #[test]
    fn test_normalize_pads_short_runs() {
        assert_eq!(normalize("0140175938"), "0000140175938");
        assert_eq!(normalize("123456789012"), "0123456789012");
        for len in 10..=12 {
            let digits = "7".repeat(len);
            let normalized = normalize(&digits);
            assert_eq!(normalized.len(), IDENTIFIER_LEN);
            assert!(normalized.ends_with(&digits));
        }
    }

    #[test]
    fn test_normalize_keeps_out_of_range_lengths() {
        assert_eq!(normalize("12345"), "12345");
        assert_eq!(normalize("97801401759361"), "97801401759361");
        assert!(!is_valid_identifier(&normalize("12345")));
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(canonical(""), None);
    }

    #[test]
    fn test_normalize_repairs_scientific_notation() {
        assert_eq!(normalize("1E+12"), "1000000000000");
        assert_eq!(normalize("9.78014e+12"), "9780140000000");
        assert_eq!(normalize("9.780140175936E12"), "9780140175936");
    }

    #[test]
    fn test_normalize_unparseable_exponent_is_empty() {
        assert_eq!(normalize("ean 978"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["9780140175936", "0-14-017593-8", "1E+12", "12345678901"] {
            let once = normalize(raw);
            assert!(is_valid_identifier(&once));
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_value_number() {
        assert_eq!(normalize_value(&json!(9780140175936_i64)), "9780140175936");
        assert_eq!(normalize_value(&json!(140175938)), "140175938");
    }

    #[test]
    fn test_canonical() {
        assert_eq!(canonical("0140175938").as_deref(), Some("0000140175938"));
        assert_eq!(canonical("140175938"), None);
    }

    #[test]
    fn test_extract_identifier_priority() {
        let row = json!({"EAN": "9780000000002", "isbn-13": "9780140175936"});
        assert_eq!(
            extract_identifier(row.as_object().unwrap()),
            "9780140175936"
        );

        let row = json!({"Title": "No identifier"});
        assert_eq!(extract_identifier(row.as_object().unwrap()), "");
    }
}
