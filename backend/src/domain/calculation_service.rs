//! Calculation creation service.
//!
//! [`CalculationService`] is the single entry point for creating calculations.
//! It repeats the checks the input schema performs because callers may invoke
//! it with raw values, then stages the record in the caller's store. Nothing
//! is committed here.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{CalculationStore, CalculationStoreError};
use crate::domain::{
    Calculation, CalculationCreate, CalculationField, CalculationType, CalculationValidationError,
    Error, UserId,
};

/// Reasons a calculation could not be created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    /// An operand is not a finite number.
    #[error("{field} must be a valid number")]
    InvalidNumericInput { field: CalculationField },
    /// The operation tag is not recognised.
    #[error("invalid calculation type: {value}")]
    InvalidOperationType { value: String },
    /// Division with a zero divisor.
    #[error("cannot divide by zero")]
    DivisionByZero,
    /// The referenced user does not exist.
    #[error("invalid user id: {user_id}")]
    UnknownUser { user_id: UserId },
    /// The store failed while looking up the user.
    #[error(transparent)]
    Persistence(#[from] CalculationStoreError),
}

impl From<&CalculationValidationError> for CalculationError {
    fn from(issue: &CalculationValidationError) -> Self {
        match issue {
            CalculationValidationError::InvalidNumber { field } => {
                Self::InvalidNumericInput { field: *field }
            }
            CalculationValidationError::InvalidType { value } => Self::InvalidOperationType {
                value: value.clone(),
            },
            CalculationValidationError::DivisionByZero => Self::DivisionByZero,
        }
    }
}

impl From<CalculationError> for Error {
    fn from(error: CalculationError) -> Self {
        let message = error.to_string();
        match error {
            CalculationError::InvalidNumericInput { .. }
            | CalculationError::InvalidOperationType { .. }
            | CalculationError::DivisionByZero => Error::invalid_request(message),
            CalculationError::UnknownUser { .. } => Error::not_found(message),
            CalculationError::Persistence(CalculationStoreError::UserNotFound { .. }) => {
                Error::not_found(message)
            }
            CalculationError::Persistence(CalculationStoreError::Connection { message }) => {
                Error::service_unavailable(format!("calculation store unavailable: {message}"))
            }
            CalculationError::Persistence(CalculationStoreError::Query { message }) => {
                Error::internal(format!("calculation store error: {message}"))
            }
        }
    }
}

/// Creates calculations and stages them in a [`CalculationStore`].
#[derive(Clone)]
pub struct CalculationService {
    clock: Arc<dyn Clock>,
}

impl CalculationService {
    /// Create a service that timestamps records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Validate raw inputs, compute the result and stage the record.
    ///
    /// Checks run in order: user existence, operation tag, operand
    /// finiteness, divisor. The tag is trimmed and lowercased first. The
    /// first failure is returned and nothing is staged.
    pub async fn create_calculation<S>(
        &self,
        store: &mut S,
        user_id: &UserId,
        a: f64,
        b: f64,
        calc_type: &str,
    ) -> Result<Calculation, CalculationError>
    where
        S: CalculationStore + ?Sized,
    {
        ensure_user_exists(store, user_id).await?;

        let calculation_type = CalculationType::parse_normalised(calc_type).ok_or_else(|| {
            warn!(%user_id, value = calc_type, "rejected calculation with unknown type");
            CalculationError::InvalidOperationType {
                value: calc_type.to_owned(),
            }
        })?;

        let input = CalculationCreate::new(a, b, calculation_type).map_err(|errors| {
            let error = errors
                .issues()
                .first()
                .map_or(CalculationError::DivisionByZero, CalculationError::from);
            warn!(%user_id, %error, "rejected calculation input");
            error
        })?;
        Ok(self.stage(store, user_id, input))
    }

    /// Stage a calculation from input that already passed the schema.
    pub async fn create_validated<S>(
        &self,
        store: &mut S,
        user_id: &UserId,
        input: CalculationCreate,
    ) -> Result<Calculation, CalculationError>
    where
        S: CalculationStore + ?Sized,
    {
        ensure_user_exists(store, user_id).await?;
        Ok(self.stage(store, user_id, input))
    }

    fn stage<S>(&self, store: &mut S, user_id: &UserId, input: CalculationCreate) -> Calculation
    where
        S: CalculationStore + ?Sized,
    {
        let calculation = Calculation::create(user_id.clone(), input, self.clock.utc());
        debug!(
            calculation_id = %calculation.id(),
            %user_id,
            calculation_type = %calculation.calculation_type(),
            "staging calculation"
        );
        store.stage(calculation.clone());
        calculation
    }
}

async fn ensure_user_exists<S>(store: &mut S, user_id: &UserId) -> Result<(), CalculationError>
where
    S: CalculationStore + ?Sized,
{
    if store.find_user(user_id).await?.is_none() {
        warn!(%user_id, "rejected calculation for unknown user");
        return Err(CalculationError::UnknownUser {
            user_id: user_id.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "calculation_service_tests.rs"]
mod tests;
