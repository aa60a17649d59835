//! Best-effort field extraction from certificate text
//!
//! Used only to pre-fill the calibration form. Nothing here is validated:
//! the first pattern that matches wins and absence is an empty string.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WhiteoutError};

lazy_static! {
    /// Plate number label variants, tried in order.
    static ref PLATE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)Prøvemærke\s+nummer\s+(\d+)").unwrap(),
        Regex::new(r"(?i)A:\s*Prøvemærke\s+nummer\s+(\d+)").unwrap(),
        Regex::new(r"(?i)[Pp]røvemærke\s*:?\s*(\d+)").unwrap(),
    ];

    /// `<d>-<m>-<yyyy> til <d>-<m>-<yyyy>`
    static ref DATE_RANGE: Regex =
        Regex::new(r"(?i)(\d{1,2}-\d{1,2}-\d{4})\s*til\s*(\d{1,2})-(\d{1,2})-(\d{4})").unwrap();
}

/// Suggested form defaults pulled from a source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub plate_number: String,
    pub date_range: String,
}

/// First plate number matched by the label patterns, or `""`.
pub fn extract_plate_number(text: &str) -> String {
    PLATE_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| {
            debug!("Found plate number: {}", m.as_str());
            m.as_str().to_string()
        })
        .unwrap_or_default()
}

/// First date range with the right-hand day and month masked, or `""`.
///
/// `"20-12-2025 til 26-12-2025"` becomes `"20-12-2025 til ??-??-2025"`.
pub fn extract_date_range(text: &str) -> String {
    let Some(caps) = DATE_RANGE.captures(text) else {
        return String::new();
    };
    let range = format!("{} til ??-??-{}", &caps[1], &caps[4]);
    debug!("Found date range: {}", range);
    range
}

pub fn extract_fields(full_text: &str) -> ExtractedFields {
    ExtractedFields {
        plate_number: extract_plate_number(full_text),
        date_range: extract_date_range(full_text),
    }
}

/// Text of every page, in page order.
///
/// pdf-extract panics on some malformed inputs; that is reported as an
/// ordinary extraction error.
pub fn extract_document_text(bytes: &[u8]) -> Result<String> {
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| WhiteoutError::ExtractionError("extractor panicked".to_string()))?
        .map_err(|e| WhiteoutError::ExtractionError(e.to_string()))?;
    debug!(
        "PDF text extracted (first 500 chars): {}",
        text.chars().take(500).collect::<String>()
    );
    Ok(text)
}

/// Extract text and fields; any extraction failure yields empty fields.
pub fn extract_fields_from_pdf(bytes: &[u8]) -> ExtractedFields {
    match extract_document_text(bytes) {
        Ok(text) => extract_fields(&text),
        Err(e) => {
            tracing::warn!("{}; leaving fields empty", e);
            ExtractedFields::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plate_number_basic() {
        assert_eq!(extract_plate_number("Prøvemærke nummer 12345"), "12345");
    }

    #[test]
    fn test_plate_number_case_insensitive() {
        assert_eq!(extract_plate_number("PRØVEMÆRKE NUMMER 777"), "777");
    }

    #[test]
    fn test_plate_number_with_label_prefix() {
        assert_eq!(
            extract_plate_number("Side 1\nA: Prøvemærke nummer 90210\nB: Ejer"),
            "90210"
        );
    }

    #[test]
    fn test_plate_number_colon_form() {
        assert_eq!(extract_plate_number("Prøvemærke: 4321"), "4321");
        assert_eq!(extract_plate_number("prøvemærke 55"), "55");
    }

    #[test]
    fn test_first_pattern_wins_over_later_match() {
        // The colon form appears first in the text, but the "nummer"
        // pattern has priority.
        let text = "Prøvemærke: 111\nPrøvemærke nummer 222";
        assert_eq!(extract_plate_number(text), "222");
    }

    #[test]
    fn test_plate_number_missing() {
        assert_eq!(extract_plate_number("Ingen nummer her"), "");
        assert_eq!(extract_plate_number(""), "");
    }

    #[test]
    fn test_date_range_redacts_right_day_and_month() {
        assert_eq!(
            extract_date_range("20-12-2025 til 26-12-2025"),
            "20-12-2025 til ??-??-2025"
        );
    }

    #[test]
    fn test_date_range_single_digit_and_tight_spacing() {
        assert_eq!(
            extract_date_range("Gyldig 1-2-2024til3-4-2025."),
            "1-2-2024 til ??-??-2025"
        );
    }

    #[test]
    fn test_date_range_case_insensitive_and_first_match() {
        assert_eq!(
            extract_date_range("05-06-2024 TIL 07-08-2024 og 01-01-2030 til 02-02-2031"),
            "05-06-2024 til ??-??-2024"
        );
    }

    #[test]
    fn test_date_range_missing() {
        assert_eq!(extract_date_range("20-12-2025 - 26-12-2025"), "");
    }

    #[test]
    fn test_fields_are_independent() {
        let only_date = extract_fields("Periode 01-01-2025 til 31-01-2025");
        assert_eq!(only_date.plate_number, "");
        assert_eq!(only_date.date_range, "01-01-2025 til ??-??-2025");

        let both = extract_fields("Prøvemærke nummer 9 gælder 1-1-2025 til 2-2-2026");
        assert_eq!(
            both,
            ExtractedFields {
                plate_number: "9".into(),
                date_range: "1-1-2025 til ??-??-2026".into(),
            }
        );
    }

    #[test]
    fn test_unreadable_pdf_gives_empty_fields() {
        assert_eq!(extract_fields_from_pdf(b"not a pdf"), ExtractedFields::default());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn date_range_keeps_left_and_right_year(
            d1 in 1u32..=31, m1 in 1u32..=12, y1 in 1900u32..2100,
            d2 in 1u32..=31, m2 in 1u32..=12, y2 in 1900u32..2100,
        ) {
            let text = format!("{}-{}-{} til {}-{}-{}", d1, m1, y1, d2, m2, y2);
            let expected = format!("{}-{}-{} til ??-??-{}", d1, m1, y1, y2);
            prop_assert_eq!(extract_date_range(&text), expected);
        }

        #[test]
        fn plate_number_round_trips(n in 0u64..10_000_000_000) {
            let text = format!("A: Prøvemærke nummer {}", n);
            prop_assert_eq!(extract_plate_number(&text), n.to_string());
        }

        #[test]
        fn arbitrary_text_never_panics(text in "\\PC{0,200}") {
            let _ = extract_fields(&text);
        }
    }
}
