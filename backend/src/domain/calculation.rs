//! Calculation records and the input schema that guards them.
//!
//! Untrusted input enters through [`validate_create`] (or by deserialising
//! [`CalculationCreate`]), which yields operands and a closed
//! [`CalculationType`]. A [`Calculation`] can only be built from a validated
//! [`CalculationCreate`], so its `result` always matches its operands and a
//! division by zero is never constructed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Error, FieldIssue, UserId};

/// Arithmetic operation applied to the two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl CalculationType {
    /// Every supported operation, in canonical order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    /// Canonical lowercase tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    /// Parse a tag after trimming and lowercasing it.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::CalculationType;
    ///
    /// assert_eq!(CalculationType::parse_normalised(" Divide "), Some(CalculationType::Divide));
    /// assert_eq!(CalculationType::parse_normalised("modulo"), None);
    /// ```
    pub fn parse_normalised(raw: &str) -> Option<Self> {
        raw.trim().to_lowercase().parse().ok()
    }

    /// Apply the operation.
    ///
    /// Callers reject a zero divisor before reaching this point.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
        }
    }

    fn allowed_tags() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.as_str()).collect()
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalculationType {
    type Err = CalculationValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "add" => Ok(Self::Add),
            "subtract" => Ok(Self::Subtract),
            "multiply" => Ok(Self::Multiply),
            "divide" => Ok(Self::Divide),
            other => Err(CalculationValidationError::InvalidType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Input field a validation issue refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationField {
    A,
    B,
    Type,
}

impl CalculationField {
    /// Field name as it appears in payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::Type => "type",
        }
    }
}

impl fmt::Display for CalculationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reason why calculation input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalculationValidationError {
    /// An operand is missing, non-numeric or not finite.
    InvalidNumber { field: CalculationField },
    /// The operation tag is not one of the supported values.
    InvalidType { value: String },
    /// The operation is `divide` and `b` is zero.
    DivisionByZero,
}

impl CalculationValidationError {
    /// Field the issue is attached to.
    pub const fn field(&self) -> CalculationField {
        match self {
            Self::InvalidNumber { field } => *field,
            Self::InvalidType { .. } => CalculationField::Type,
            Self::DivisionByZero => CalculationField::B,
        }
    }

    /// Human readable description without the field prefix.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidNumber { .. } => "input should be a valid number".to_owned(),
            Self::InvalidType { .. } => {
                "input should be 'add', 'subtract', 'multiply' or 'divide'".to_owned()
            }
            Self::DivisionByZero => "cannot divide by zero".to_owned(),
        }
    }
}

impl fmt::Display for CalculationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field(), self.message())
    }
}

impl std::error::Error for CalculationValidationError {}

/// Every issue found while validating one payload. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationValidationErrors(Vec<CalculationValidationError>);

impl CalculationValidationErrors {
    fn single(issue: CalculationValidationError) -> Self {
        Self(vec![issue])
    }

    /// Individual issues in field order.
    pub fn issues(&self) -> &[CalculationValidationError] {
        &self.0
    }

    /// Whether any issue matches `predicate`.
    pub fn contains(&self, predicate: impl Fn(&CalculationValidationError) -> bool) -> bool {
        self.0.iter().any(predicate)
    }
}

impl fmt::Display for CalculationValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for issue in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for CalculationValidationErrors {}

impl From<CalculationValidationErrors> for Error {
    fn from(errors: CalculationValidationErrors) -> Self {
        let issues = errors
            .issues()
            .iter()
            .map(|issue| FieldIssue::new(issue.field().as_str(), issue.message()));
        Error::invalid_fields(errors.to_string(), issues)
            .with_detail("allowedTypes", json!(CalculationType::allowed_tags()))
    }
}

/// Validated input for a new calculation.
///
/// ## Invariants
/// - `a` and `b` are finite.
/// - `calculation_type` is divide only when `b` is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "CalculationCreateDto")]
pub struct CalculationCreate {
    a: f64,
    b: f64,
    #[serde(rename = "type")]
    calculation_type: CalculationType,
}

impl CalculationCreate {
    /// Validate already-typed operands.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{CalculationCreate, CalculationType};
    ///
    /// assert!(CalculationCreate::new(10.0, 0.0, CalculationType::Divide).is_err());
    /// assert!(CalculationCreate::new(10.0, 0.0, CalculationType::Add).is_ok());
    /// ```
    pub fn new(
        a: f64,
        b: f64,
        calculation_type: CalculationType,
    ) -> Result<Self, CalculationValidationErrors> {
        let mut issues = Vec::new();
        if !a.is_finite() {
            issues.push(CalculationValidationError::InvalidNumber {
                field: CalculationField::A,
            });
        }
        if !b.is_finite() {
            issues.push(CalculationValidationError::InvalidNumber {
                field: CalculationField::B,
            });
        }
        if !issues.is_empty() {
            return Err(CalculationValidationErrors(issues));
        }
        if calculation_type == CalculationType::Divide && b == 0.0 {
            return Err(CalculationValidationErrors::single(
                CalculationValidationError::DivisionByZero,
            ));
        }
        Ok(Self {
            a,
            b,
            calculation_type,
        })
    }

    /// First operand.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Second operand.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Operation to apply.
    pub fn calculation_type(&self) -> CalculationType {
        self.calculation_type
    }

    /// Result of applying the operation to the operands.
    pub fn result(&self) -> f64 {
        self.calculation_type.apply(self.a, self.b)
    }
}

#[derive(Debug, Deserialize)]
struct CalculationCreateDto {
    #[serde(default)]
    a: Value,
    #[serde(default)]
    b: Value,
    #[serde(default, rename = "type")]
    calculation_type: Value,
}

impl TryFrom<CalculationCreateDto> for CalculationCreate {
    type Error = CalculationValidationErrors;

    fn try_from(value: CalculationCreateDto) -> Result<Self, Self::Error> {
        validate_create(&value.a, &value.b, &value.calculation_type)
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn coerce_type(value: &Value) -> Result<CalculationType, CalculationValidationError> {
    match value {
        Value::String(raw) => raw.parse(),
        other => Err(CalculationValidationError::InvalidType {
            value: other.to_string(),
        }),
    }
}

/// Validate raw create input.
///
/// Operands may be JSON numbers or numeric strings. The operation tag must be
/// one of the exact lowercase tags. All field issues are reported together;
/// the divide-by-zero rule is only checked once every field is well formed.
///
/// # Examples
/// ```
/// use backend::domain::{CalculationType, validate_create};
/// use serde_json::json;
///
/// let input = validate_create(&json!(10.0), &json!("5"), &json!("add")).expect("valid");
/// assert_eq!(input.calculation_type(), CalculationType::Add);
/// assert_eq!(input.b(), 5.0);
/// ```
pub fn validate_create(
    a: &Value,
    b: &Value,
    calculation_type: &Value,
) -> Result<CalculationCreate, CalculationValidationErrors> {
    let mut issues = Vec::new();
    let a = coerce_number(a);
    if a.is_none() {
        issues.push(CalculationValidationError::InvalidNumber {
            field: CalculationField::A,
        });
    }
    let b = coerce_number(b);
    if b.is_none() {
        issues.push(CalculationValidationError::InvalidNumber {
            field: CalculationField::B,
        });
    }
    let calculation_type = match coerce_type(calculation_type) {
        Ok(kind) => Some(kind),
        Err(issue) => {
            issues.push(issue);
            None
        }
    };

    match (a, b, calculation_type) {
        (Some(a), Some(b), Some(calculation_type)) => {
            CalculationCreate::new(a, b, calculation_type)
        }
        _ => Err(CalculationValidationErrors(issues)),
    }
}

/// Unique calculation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalculationId(Uuid);

impl CalculationId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CalculationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Persisted calculation fields, passed through without recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCalculation {
    pub id: CalculationId,
    pub user_id: UserId,
    pub a: f64,
    pub b: f64,
    pub calculation_type: CalculationType,
    pub result: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A calculation owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    id: CalculationId,
    user_id: UserId,
    a: f64,
    b: f64,
    calculation_type: CalculationType,
    result: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Calculation {
    /// Compute a new calculation with a fresh identifier.
    pub fn create(user_id: UserId, input: CalculationCreate, now: DateTime<Utc>) -> Self {
        Self::create_with_id(CalculationId::random(), user_id, input, now)
    }

    /// Compute a new calculation with a caller-supplied identifier.
    pub fn create_with_id(
        id: CalculationId,
        user_id: UserId,
        input: CalculationCreate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            a: input.a(),
            b: input.b(),
            calculation_type: input.calculation_type(),
            result: input.result(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a calculation read back from storage.
    pub fn restore(stored: StoredCalculation) -> Self {
        let StoredCalculation {
            id,
            user_id,
            a,
            b,
            calculation_type,
            result,
            created_at,
            updated_at,
        } = stored;
        Self {
            id,
            user_id,
            a,
            b,
            calculation_type,
            result,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> CalculationId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn calculation_type(&self) -> CalculationType {
        self.calculation_type
    }

    pub fn result(&self) -> f64 {
        self.result
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Read-side representation of a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CalculationRead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub a: f64,
    pub b: f64,
    #[serde(rename = "type")]
    pub calculation_type: CalculationType,
    pub result: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Calculation> for CalculationRead {
    fn from(value: &Calculation) -> Self {
        Self {
            id: *value.id().as_uuid(),
            user_id: *value.user_id().as_uuid(),
            a: value.a(),
            b: value.b(),
            calculation_type: value.calculation_type(),
            result: value.result(),
            created_at: value.created_at(),
            updated_at: value.updated_at(),
        }
    }
}

/// Raised when a read payload has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed calculation payload: {message}")]
pub struct CalculationReadError {
    message: String,
}

/// Check the shape of a read payload.
///
/// Only types are checked; `result` is taken as given.
pub fn validate_read(payload: Value) -> Result<CalculationRead, CalculationReadError> {
    serde_json::from_value(payload).map_err(|err| CalculationReadError {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests;
