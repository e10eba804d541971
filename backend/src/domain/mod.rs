//! Domain primitives, services and ports.
//!
//! Purpose: define the calculation and user entities, the input schema that
//! guards calculation creation, and the service that computes and stages
//! calculations through the [`ports::CalculationStore`] port. Types here are
//! transport and storage agnostic.
//!
//! Public surface:
//! - Error / ErrorCode — transport-agnostic error payload.
//! - User, UserId — owners of calculations.
//! - CalculationCreate, validate_create, validate_read — input schema.
//! - Calculation, CalculationType — the persisted record and its operation.
//! - CalculationService, CalculationError — the creation entry point.

pub mod calculation;
pub mod calculation_service;
pub mod error;
pub mod ports;
pub mod user;

pub use self::calculation::{
    Calculation, CalculationCreate, CalculationField, CalculationId, CalculationRead,
    CalculationReadError, CalculationType, CalculationValidationError,
    CalculationValidationErrors, StoredCalculation, validate_create, validate_read,
};
pub use self::calculation_service::{CalculationError, CalculationService};
pub use self::error::{Error, ErrorCode, ErrorValidationError, FieldIssue};
pub use self::user::{
    EmailAddress, PasswordHash, PersonName, User, UserId, UserProfile, UserValidationError,
    Username,
};
