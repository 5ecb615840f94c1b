use sprintboard::lifecycle::io::parse_company_size;
use sprintboard::sprint::parse_budget;
use sprintboard::test_utils::{TestCase, run_table_tests};

#[test]
fn test_parse_budget_table() {
    let cases = vec![
        TestCase {
            name: "empty",
            input: "",
            expected: 0.0,
        },
        TestCase {
            name: "plain dollars",
            input: "$150,000",
            expected: 150_000.0,
        },
        TestCase {
            name: "thousands suffix",
            input: "75k",
            expected: 75_000.0,
        },
        TestCase {
            name: "millions suffix upper case",
            input: "1.5M",
            expected: 1_500_000.0,
        },
        TestCase {
            name: "range midpoint",
            input: "$252k - $327k",
            expected: 289_500.0,
        },
        TestCase {
            name: "free text",
            input: "to be confirmed",
            expected: 0.0,
        },
    ];

    run_table_tests(cases, parse_budget);
}

#[test]
fn test_parse_company_size_table() {
    let cases = vec![
        TestCase {
            name: "plain",
            input: "250",
            expected: Some(250.0),
        },
        TestCase {
            name: "range",
            input: "1-10",
            expected: Some(5.5),
        },
        TestCase {
            name: "open ended",
            input: "500+",
            expected: Some(500.0),
        },
        TestCase {
            name: "with unit",
            input: "50-500 employees",
            expected: Some(275.0),
        },
        TestCase {
            name: "no digits",
            input: "enterprise",
            expected: None,
        },
    ];

    run_table_tests(cases, parse_company_size);
}
