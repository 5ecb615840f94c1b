//! Property tests for the free-text parsers and money formatting.

use proptest::prelude::*;

use sprintboard::agents::extract_json;
use sprintboard::cli::output::dollars;
use sprintboard::lifecycle::io::parse_company_size;
use sprintboard::sprint::parse_budget;

proptest! {
    #[test]
    fn parse_budget_is_total_and_finite(text in "\\PC{0,40}") {
        let value = parse_budget(&text);
        prop_assert!(value.is_finite());
    }

    #[test]
    fn parse_budget_reads_plain_thousands(amount in 1u32..10_000) {
        let value = parse_budget(&format!("${amount}k"));
        prop_assert!((value - f64::from(amount) * 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn range_midpoint_lies_between_ends(low in 0u32..500, span in 0u32..500) {
        let high = low + span;
        let value = parse_budget(&format!("{low}k - {high}k"));
        prop_assert!(value >= f64::from(low) * 1_000.0);
        prop_assert!(value <= f64::from(high) * 1_000.0);
    }

    #[test]
    fn extract_json_never_panics(reply in "\\PC{0,80}") {
        let _ = extract_json(&reply);
    }

    #[test]
    fn extract_json_finds_object_in_prose(
        prefix in "[a-zA-Z .]{0,20}",
        suffix in "[a-zA-Z .]{0,20}",
        score in 0u8..=100,
    ) {
        let reply = format!("{prefix}{{\"score\": {score}}}{suffix}");
        let value = extract_json(&reply).unwrap();
        prop_assert_eq!(value["score"].as_u64(), Some(u64::from(score)));
    }

    #[test]
    fn company_size_is_non_negative(text in "[0-9]{0,5}(-[0-9]{1,5})?\\+?") {
        if let Some(size) = parse_company_size(&text) {
            prop_assert!(size >= 0.0);
        }
    }

    #[test]
    fn dollars_round_trips_digits(amount in 0i64..10_000_000_000) {
        #[allow(clippy::cast_precision_loss)]
        let formatted = dollars(amount as f64);
        prop_assert!(formatted.starts_with('$'));
        let digits: String = formatted.chars().filter(char::is_ascii_digit).collect();
        prop_assert_eq!(digits, amount.to_string());
    }
}
