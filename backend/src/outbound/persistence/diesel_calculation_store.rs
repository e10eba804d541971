//! PostgreSQL-backed `CalculationStore` implementation using Diesel ORM.
//!
//! Staged calculations are buffered in memory and written inside a single
//! transaction on commit. The `calculations.user_id` foreign key backs the
//! user-existence check made before staging: if the user disappears before
//! commit, the whole transaction fails with `UserNotFound`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{CalculationStore, CalculationStoreError};
use crate::domain::{Calculation, CalculationId, User, UserId};

use super::diesel_basic_error_mapping::{
    ConstraintViolation, constraint_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{CalculationRow, NewCalculationRow, UserRow};
use super::pool::DbPool;
use super::schema::{calculations, users};

/// Diesel-backed unit of work for calculations.
///
/// # Examples
///
/// ```rust,no_run
/// use backend::outbound::persistence::{DbPool, DieselCalculationStore, PoolConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = DbPool::new(PoolConfig::new("postgres://localhost/calculations")).await?;
/// let store = DieselCalculationStore::new(pool);
/// # let _ = store;
/// # Ok(())
/// # }
/// ```
pub struct DieselCalculationStore {
    pool: DbPool,
    staged: Vec<Calculation>,
}

impl DieselCalculationStore {
    /// Open a unit of work on the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            staged: Vec::new(),
        }
    }

    /// Calculations waiting for the next commit.
    pub fn staged(&self) -> &[Calculation] {
        &self.staged
    }
}

fn map_diesel_error(error: diesel::result::Error, staged_users: &[UserId]) -> CalculationStoreError {
    if let Some(ConstraintViolation::ForeignKey { .. }) = constraint_violation(&error) {
        let user_id = match staged_users {
            [only] => only.to_string(),
            _ => "referenced by a staged calculation".to_owned(),
        };
        return CalculationStoreError::user_not_found(user_id);
    }
    map_basic_diesel_error(
        error,
        CalculationStoreError::query,
        CalculationStoreError::connection,
    )
}

fn distinct_users(staged: &[Calculation]) -> Vec<UserId> {
    let mut ids: Vec<UserId> = Vec::new();
    for calculation in staged {
        if !ids.contains(calculation.user_id()) {
            ids.push(calculation.user_id().clone());
        }
    }
    ids
}

#[async_trait]
impl CalculationStore for DieselCalculationStore {
    async fn find_user(&mut self, id: &UserId) -> Result<Option<User>, CalculationStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, CalculationStoreError::connection))?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, &[]))?;

        row.map(UserRow::into_user)
            .transpose()
            .map_err(|err| CalculationStoreError::query(format!("stored user is invalid: {err}")))
    }

    fn stage(&mut self, calculation: Calculation) {
        self.staged.push(calculation);
    }

    async fn commit(&mut self) -> Result<usize, CalculationStoreError> {
        let staged = std::mem::take(&mut self.staged);
        if staged.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewCalculationRow> = staged.iter().map(NewCalculationRow::from).collect();
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, CalculationStoreError::connection))?;

        let written = conn
            .transaction(|conn| {
                async move {
                    diesel::insert_into(calculations::table)
                        .values(&rows)
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_diesel_error(err, &distinct_users(&staged)))?;

        debug!(written, "committed staged calculations");
        Ok(written)
    }

    fn rollback(&mut self) -> usize {
        let discarded = self.staged.len();
        self.staged.clear();
        discarded
    }

    async fn find_calculation(
        &mut self,
        id: &CalculationId,
    ) -> Result<Option<Calculation>, CalculationStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, CalculationStoreError::connection))?;

        let row: Option<CalculationRow> = calculations::table
            .filter(calculations::id.eq(id.as_uuid()))
            .select(CalculationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, &[]))?;

        row.map(CalculationRow::into_calculation)
            .transpose()
            .map_err(|tag| {
                CalculationStoreError::query(format!("stored calculation has unknown type {tag}"))
            })
    }
}
