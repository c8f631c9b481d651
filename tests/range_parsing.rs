//! Table-driven tests for the page-range parser's public surface

use pdfium_host::range::{parse, parse_expanded, PageRange, RangeError};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn ranges(pairs: &[(u32, u32)]) -> Vec<PageRange> {
    pairs
        .iter()
        .map(|&(start, end)| PageRange { start, end })
        .collect()
}

#[rstest]
#[case("1-5, 10, 15-20", &[(1, 5), (10, 10), (15, 20)])]
#[case("7", &[(7, 7)])]
#[case("3-3", &[(3, 3)])]
#[case(" 2 - 4 ", &[(2, 4)])]
#[case("1,,2,", &[(1, 1), (2, 2)])]
#[case("9-10,1-2", &[(9, 10), (1, 2)])]
fn parses_valid_specs(#[case] input: &str, #[case] expected: &[(u32, u32)]) {
    assert_eq!(parse(input).unwrap(), ranges(expected));
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t\n")]
fn rejects_blank_input(#[case] input: &str) {
    assert_eq!(parse(input).unwrap_err(), RangeError::Empty);
}

#[rstest]
#[case("5-1")]
#[case("1, 20-10")]
fn rejects_reverse_ranges(#[case] input: &str) {
    assert!(matches!(
        parse(input).unwrap_err(),
        RangeError::ReversedRange { .. }
    ));
}

#[rstest]
#[case("1--5")]
#[case("1-2-3")]
#[case("4-")]
fn rejects_malformed_pairs(#[case] input: &str) {
    assert!(matches!(
        parse(input).unwrap_err(),
        RangeError::MalformedPair { .. }
    ));
}

#[rstest]
#[case("0")]
#[case("-3")]
#[case("0-5")]
#[case("3-0")]
fn rejects_non_positive_pages(#[case] input: &str) {
    assert!(matches!(
        parse(input).unwrap_err(),
        RangeError::NonPositivePage { .. }
    ));
}

#[rstest]
#[case("abc")]
#[case("1, x-3")]
#[case("2.5")]
fn rejects_non_numeric_tokens(#[case] input: &str) {
    assert!(matches!(
        parse(input).unwrap_err(),
        RangeError::InvalidToken { .. }
    ));
}

#[test]
fn error_messages_carry_token_and_input() {
    let err = parse("1-3, oops, 9").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("oops"));
    assert!(message.contains("1-3, oops, 9"));
}

#[test]
fn expanded_form_matches_batch_caller_expectations() {
    assert_eq!(
        parse_expanded("1-3,5,7-9", 10).unwrap(),
        vec![1, 2, 3, 5, 7, 8, 9]
    );
    assert_eq!(parse_expanded("1,1,2,2", 10).unwrap(), vec![1, 2]);
    assert!(matches!(
        parse_expanded("1-15", 10).unwrap_err(),
        RangeError::PageOutOfBounds { total: 10, .. }
    ));
}
