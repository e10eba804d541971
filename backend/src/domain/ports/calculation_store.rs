//! Port for the unit of work that calculations are created through.
//!
//! A [`CalculationStore`] behaves like an ORM session: lookups observe
//! committed state, [`CalculationStore::stage`] queues a record without
//! writing it, and [`CalculationStore::commit`] writes every staged record
//! atomically. Callers decide when to commit, which lets them batch several
//! calculations into one transaction.

use async_trait::async_trait;

use crate::domain::{Calculation, CalculationId, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by calculation store adapters.
    pub enum CalculationStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "calculation store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "calculation store query failed: {message}",
        /// A staged calculation references a user that no longer exists.
        UserNotFound { user_id: String } => "user {user_id} does not exist",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalculationStore: Send {
    /// Fetch a user by identifier.
    async fn find_user(&mut self, id: &UserId) -> Result<Option<User>, CalculationStoreError>;

    /// Queue a calculation for the next commit.
    fn stage(&mut self, calculation: Calculation);

    /// Write every staged calculation in one transaction.
    ///
    /// Returns the number of calculations written. On failure nothing is
    /// written and the staged calculations are discarded.
    async fn commit(&mut self) -> Result<usize, CalculationStoreError>;

    /// Discard staged calculations, returning how many were dropped.
    fn rollback(&mut self) -> usize;

    /// Fetch a committed calculation by identifier.
    async fn find_calculation(
        &mut self,
        id: &CalculationId,
    ) -> Result<Option<Calculation>, CalculationStoreError>;
}
