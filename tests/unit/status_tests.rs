use sprintboard::SbError;
use sprintboard::model::{DealStatus, LifecycleStage};
use sprintboard::test_utils::{TestCase, run_table_tests};

#[test]
fn test_deal_status_parse_table() {
    let cases = vec![
        TestCase {
            name: "snake case",
            input: "qualified_delivery",
            expected: Some(DealStatus::QualifiedDelivery),
        },
        TestCase {
            name: "column title",
            input: "Qualified CSO",
            expected: Some(DealStatus::QualifiedCso),
        },
        TestCase {
            name: "hyphenated with padding",
            input: "  qualified-solution ",
            expected: Some(DealStatus::QualifiedSolution),
        },
        TestCase {
            name: "upper case",
            input: "PROJECT",
            expected: Some(DealStatus::Project),
        },
        TestCase {
            name: "unknown",
            input: "won",
            expected: None,
        },
    ];

    run_table_tests(cases, |raw| DealStatus::parse(raw).ok());
}

#[test]
fn test_invalid_status_lists_valid_values() {
    let err = DealStatus::parse("closed").unwrap_err();
    assert!(matches!(err, SbError::InvalidStatus(_)));
    let message = err.to_string();
    for status in DealStatus::ALL {
        assert!(message.contains(status.as_str()), "{message}");
    }
}

#[test]
fn test_column_titles() {
    let titles: Vec<String> = DealStatus::ALL.iter().map(|s| s.title()).collect();
    assert_eq!(
        titles,
        [
            "Lead",
            "Qualified Solution",
            "Qualified Delivery",
            "Qualified Cso",
            "Deal",
            "Project"
        ]
    );
}

#[test]
fn test_lifecycle_stage_parse_table() {
    let cases = vec![
        TestCase {
            name: "lower",
            input: "mql",
            expected: Some(LifecycleStage::Mql),
        },
        TestCase {
            name: "upper",
            input: "CHURNED",
            expected: Some(LifecycleStage::Churned),
        },
        TestCase {
            name: "unknown",
            input: "prospect",
            expected: None,
        },
    ];

    run_table_tests(cases, |raw| raw.parse::<LifecycleStage>().ok());
}
