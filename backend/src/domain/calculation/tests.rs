//! Tests for calculation input validation and the calculation record.

use super::*;
use crate::domain::ErrorCode;
use chrono::TimeZone;
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};

#[fixture]
fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

#[rstest]
fn validate_create_accepts_valid_payload() {
    let input = validate_create(&json!(10.0), &json!(5.0), &json!("add")).expect("valid input");
    assert_eq!(input.a(), 10.0);
    assert_eq!(input.b(), 5.0);
    assert_eq!(input.calculation_type(), CalculationType::Add);
}

#[rstest]
fn validate_create_rejects_unknown_type() {
    let errors = validate_create(&json!(10.0), &json!(5.0), &json!("invalid"))
        .expect_err("unknown type");

    assert_eq!(
        errors.issues(),
        &[CalculationValidationError::InvalidType {
            value: "invalid".to_owned()
        }]
    );
    assert!(
        errors
            .to_string()
            .contains("input should be 'add', 'subtract', 'multiply' or 'divide'")
    );
}

#[rstest]
#[case("Add")]
#[case(" add")]
fn validate_create_is_strict_about_tag_spelling(#[case] tag: &str) {
    let result = validate_create(&json!(1), &json!(2), &json!(tag));
    assert!(result.is_err());
}

#[rstest]
fn validate_create_rejects_non_string_type() {
    let errors = validate_create(&json!(1), &json!(2), &json!(3)).expect_err("numeric tag");
    assert!(errors.contains(|issue| matches!(
        issue,
        CalculationValidationError::InvalidType { value } if value == "3"
    )));
}

#[rstest]
fn validate_create_rejects_divide_by_zero() {
    let errors =
        validate_create(&json!(10.0), &json!(0.0), &json!("divide")).expect_err("zero divisor");
    assert_eq!(errors.issues(), &[CalculationValidationError::DivisionByZero]);
    assert!(errors.to_string().contains("cannot divide by zero"));
}

#[rstest]
fn validate_create_rejects_negative_zero_divisor() {
    let result = CalculationCreate::new(10.0, -0.0, CalculationType::Divide);
    assert!(result.is_err());
}

#[rstest]
fn validate_create_rejects_non_numeric_operand() {
    let errors = validate_create(&json!("invalid"), &json!(5.0), &json!("add"))
        .expect_err("non-numeric operand");
    assert_eq!(
        errors.issues(),
        &[CalculationValidationError::InvalidNumber {
            field: CalculationField::A
        }]
    );
    assert_eq!(errors.to_string(), "a: input should be a valid number");
}

#[rstest]
#[case(json!(null))]
#[case(json!(true))]
#[case(json!([1]))]
#[case(json!("NaN"))]
#[case(json!("inf"))]
fn validate_create_rejects_values_that_are_not_finite_numbers(#[case] operand: Value) {
    let result = validate_create(&json!(1), &operand, &json!("multiply"));
    assert!(result.is_err());
}

#[rstest]
fn validate_create_accepts_numeric_strings() {
    let input = validate_create(&json!(" 2.5 "), &json!("4"), &json!("multiply"))
        .expect("numeric strings coerce");
    assert_eq!(input.a(), 2.5);
    assert_eq!(input.result(), 10.0);
}

#[rstest]
fn validate_create_reports_every_bad_field() {
    let errors = validate_create(&json!("x"), &json!({}), &json!("pow")).expect_err("all bad");
    let fields: Vec<CalculationField> = errors.issues().iter().map(|i| i.field()).collect();
    assert_eq!(
        fields,
        vec![CalculationField::A, CalculationField::B, CalculationField::Type]
    );
}

#[rstest]
fn validate_create_skips_zero_check_when_fields_are_invalid() {
    let errors =
        validate_create(&json!("x"), &json!(0), &json!("divide")).expect_err("invalid operand");
    assert!(!errors.contains(|issue| *issue == CalculationValidationError::DivisionByZero));
}

#[rstest]
fn validate_create_is_idempotent() {
    let first = validate_create(&json!(7), &json!(3), &json!("subtract")).expect("valid");
    let second = validate_create(&json!(7), &json!(3), &json!("subtract")).expect("valid");
    assert_eq!(first, second);
}

#[rstest]
fn calculation_create_deserialises_through_validation() {
    let input: CalculationCreate =
        serde_json::from_value(json!({"a": 10, "b": 5, "type": "divide"})).expect("valid JSON");
    assert_eq!(input.calculation_type(), CalculationType::Divide);

    let rejected: Result<CalculationCreate, _> =
        serde_json::from_value(json!({"a": 10, "b": 0, "type": "divide"}));
    let message = rejected.expect_err("zero divisor").to_string();
    assert!(message.contains("cannot divide by zero"));
}

#[rstest]
fn missing_fields_are_reported_as_invalid() {
    let rejected: Result<CalculationCreate, _> = serde_json::from_value(json!({"type": "add"}));
    let message = rejected.expect_err("missing operands").to_string();
    assert!(message.contains("a: input should be a valid number"));
    assert!(message.contains("b: input should be a valid number"));
}

#[rstest]
fn validation_errors_map_to_structured_domain_error() {
    let errors = validate_create(&json!(1), &json!(2), &json!("pow")).expect_err("bad type");
    let error = Error::from(errors);

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    let details = error.details().expect("details attached");
    assert_eq!(details["fields"][0]["field"], "type");
    assert_eq!(
        details["allowedTypes"],
        json!(["add", "subtract", "multiply", "divide"])
    );
}

#[rstest]
#[case(CalculationType::Add, 15.0)]
#[case(CalculationType::Subtract, 5.0)]
#[case(CalculationType::Multiply, 50.0)]
#[case(CalculationType::Divide, 2.0)]
fn calculation_type_applies_standard_arithmetic(
    #[case] calculation_type: CalculationType,
    #[case] expected: f64,
) {
    assert_eq!(calculation_type.apply(10.0, 5.0), expected);
}

#[rstest]
#[case("add", Some(CalculationType::Add))]
#[case("  SUBTRACT ", Some(CalculationType::Subtract))]
#[case("Multiply", Some(CalculationType::Multiply))]
#[case("modulo", None)]
#[case("", None)]
fn parse_normalised_trims_and_lowercases(
    #[case] raw: &str,
    #[case] expected: Option<CalculationType>,
) {
    assert_eq!(CalculationType::parse_normalised(raw), expected);
}

#[rstest]
fn calculation_type_round_trips_through_serde() {
    for kind in CalculationType::ALL {
        let value = serde_json::to_value(kind).expect("serialise type");
        assert_eq!(value, json!(kind.as_str()));
    }
}

#[rstest]
fn created_calculation_holds_computed_result(created_at: DateTime<Utc>) {
    let user_id = UserId::random();
    let input = CalculationCreate::new(10.0, 5.0, CalculationType::Multiply).expect("valid");
    let calculation = Calculation::create(user_id.clone(), input, created_at);

    assert_eq!(calculation.user_id(), &user_id);
    assert_eq!(calculation.result(), 50.0);
    assert_eq!(calculation.created_at(), created_at);
    assert_eq!(calculation.updated_at(), created_at);
}

#[rstest]
fn created_calculations_receive_distinct_ids(created_at: DateTime<Utc>) {
    let input = CalculationCreate::new(1.0, 1.0, CalculationType::Add).expect("valid");
    let first = Calculation::create(UserId::random(), input, created_at);
    let second = Calculation::create(UserId::random(), input, created_at);
    assert_ne!(first.id(), second.id());
}

#[rstest]
fn read_model_mirrors_calculation(created_at: DateTime<Utc>) {
    let input = CalculationCreate::new(10.0, 5.0, CalculationType::Subtract).expect("valid");
    let calculation = Calculation::create(UserId::random(), input, created_at);
    let read = CalculationRead::from(&calculation);

    assert_eq!(read.id, *calculation.id().as_uuid());
    assert_eq!(read.user_id, *calculation.user_id().as_uuid());
    assert_eq!(read.result, 5.0);

    let value = serde_json::to_value(&read).expect("serialise read model");
    assert_eq!(value["type"], "subtract");
}

#[rstest]
fn validate_read_passes_result_through() {
    let payload = json!({
        "id": Uuid::new_v4(),
        "user_id": Uuid::new_v4(),
        "a": 10.0,
        "b": 5.0,
        "type": "add",
        "result": 15.0,
        "created_at": "2026-03-01T09:00:00Z",
        "updated_at": "2026-03-01T09:00:00Z",
    });

    let read = validate_read(payload).expect("valid read payload");
    assert_eq!(read.a, 10.0);
    assert_eq!(read.b, 5.0);
    assert_eq!(read.calculation_type, CalculationType::Add);
    assert_eq!(read.result, 15.0);
}

#[rstest]
fn validate_read_rejects_unknown_type() {
    let payload = json!({
        "id": Uuid::new_v4(),
        "user_id": Uuid::new_v4(),
        "a": 1.0,
        "b": 1.0,
        "type": "pow",
        "result": 1.0,
        "created_at": "2026-03-01T09:00:00Z",
        "updated_at": "2026-03-01T09:00:00Z",
    });
    let error = validate_read(payload).expect_err("unknown type");
    assert!(error.to_string().starts_with("malformed calculation payload"));
}

#[given("a divide payload with a zero divisor")]
fn a_divide_payload_with_a_zero_divisor() -> (Value, Value, Value) {
    (json!(10.0), json!(0.0), json!("divide"))
}

#[when("the payload is validated")]
fn the_payload_is_validated(
    payload: (Value, Value, Value),
) -> Result<CalculationCreate, CalculationValidationErrors> {
    let (a, b, calculation_type) = payload;
    validate_create(&a, &b, &calculation_type)
}

#[then("validation reports a division by zero")]
fn validation_reports_a_division_by_zero(
    result: Result<CalculationCreate, CalculationValidationErrors>,
) {
    let errors = result.expect_err("zero divisor must be rejected");
    assert_eq!(errors.issues(), &[CalculationValidationError::DivisionByZero]);
}

#[rstest]
fn validating_a_zero_divisor_unhappy_path() {
    let payload = a_divide_payload_with_a_zero_divisor();
    let result = the_payload_is_validated(payload);
    validation_reports_a_division_by_zero(result);
}
