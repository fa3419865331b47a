//! Tests for the error payload constructors and serialisation contract.

use super::*;
use crate::domain::content::{SchemaViolation, ValidationReport};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn two_field_report() -> ValidationReport {
    let mut report = ValidationReport::default();
    report.push(SchemaViolation::required("title"));
    report.push(SchemaViolation::too_long("excerpt", 300));
    report
}

#[rstest]
fn not_found_constructor_sets_code() {
    let err = Error::not_found("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidArgument, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn validation_error_lists_every_field(two_field_report: ValidationReport) {
    let err = Error::validation(&two_field_report);

    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    let fields = err
        .details()
        .and_then(|details| details.get("fields"))
        .and_then(Value::as_array)
        .expect("validation details carry a field list");
    let names: Vec<&str> = fields
        .iter()
        .filter_map(|entry| entry.get("field").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["title", "excerpt"]);
}

#[rstest]
fn duplicate_key_reports_field_and_value() {
    let err = Error::duplicate_key("slug", "denial-management-101");

    assert_eq!(err.code(), ErrorCode::DuplicateKey);
    assert!(err.message().contains("denial-management-101"));
    assert_eq!(
        err.details(),
        Some(&json!({ "field": "slug", "value": "denial-management-101" }))
    );
}

#[rstest]
fn invalid_transition_names_state_and_action() {
    let err = Error::invalid_transition("archived", "publish");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    assert_eq!(err.message(), "cannot publish content in `archived` state");
}

#[rstest]
#[case(ErrorCode::ValidationFailed, "validation_failed")]
#[case(ErrorCode::DuplicateKey, "duplicate_key")]
#[case(ErrorCode::InvalidTransition, "invalid_transition")]
#[case(ErrorCode::ServiceUnavailable, "service_unavailable")]
fn error_codes_serialise_as_snake_case(#[case] code: ErrorCode, #[case] expected: &str) {
    let value = serde_json::to_value(code).expect("code serialises");
    assert_eq!(value, json!(expected));
}

#[rstest]
fn deserialising_rejects_blank_messages() {
    let payload = json!({ "code": "not_found", "message": " " });
    let result: Result<Error, _> = serde_json::from_value(payload);
    assert!(result.is_err());
}

#[rstest]
fn serialised_payload_round_trips_details() {
    let err = Error::invalid_argument("bad").with_details(json!({ "field": "at" }));
    let value = serde_json::to_value(&err).expect("error serialises");
    assert_eq!(value["code"], json!("invalid_argument"));

    let restored: Error = serde_json::from_value(value).expect("error deserialises");
    assert_eq!(restored, err);
}
