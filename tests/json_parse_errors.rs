//! Purpose: Regression coverage for parse-failure category mapping.
//! Exports: Integration tests only.
//! Role: Verify stable category labels used by framing diagnostics.
//! Invariants: Tests avoid payload leakage; assertions target category/hint text only.
//! Notes: Uses source include to exercise internal helper logic without widening API surface.

#[allow(dead_code)]
#[path = "../src/json/parse.rs"]
mod parse;

use parse::ParseFailureCategory;
use serde_json::Value;

#[test]
fn category_mapping_handles_syntax_and_eof_errors() {
    let syntax_err = parse::from_str::<Value>(r#"{"a":}"#).unwrap_err();
    assert_eq!(
        parse::categorize_error(&syntax_err),
        ParseFailureCategory::Syntax
    );

    let eof_err = parse::from_str::<Value>(r#"{"a":[1,2"#).unwrap_err();
    assert_eq!(parse::categorize_error(&eof_err), ParseFailureCategory::Eof);
}

#[test]
fn category_mapping_handles_shape_errors() {
    let data_err = parse::from_str::<Vec<u32>>(r#"{"a":1}"#).unwrap_err();
    assert_eq!(
        parse::categorize_error(&data_err),
        ParseFailureCategory::Data
    );
}

#[test]
fn hint_contains_category_and_context() {
    let err = parse::from_str::<Value>(r#"{"n":"#).unwrap_err();
    let hint = parse::hint_for_error(&err, "chunk 1");
    assert!(hint.contains("parse category: unexpected-eof"));
    assert!(hint.contains("context: chunk 1"));
}

#[test]
fn hint_does_not_echo_payload() {
    let err = parse::from_str::<Value>(r#"{"secret":nope}"#).unwrap_err();
    let hint = parse::hint_for_error(&err, "chunk 0");
    assert!(!hint.contains("secret"));
}
