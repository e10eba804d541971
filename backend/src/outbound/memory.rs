//! In-process adapters backed by shared hash maps.
//!
//! [`InMemoryDatabase`] plays the role of the relational database: it holds
//! committed users and calculations and enforces the same constraints as the
//! PostgreSQL schema (unique email and username, calculations must reference
//! an existing user, deleting a user cascades to their calculations).
//! Sessions opened with [`InMemoryDatabase::session`] implement
//! [`CalculationStore`] with the same staging semantics as the Diesel store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{
    CalculationStore, CalculationStoreError, UserPersistenceError, UserRepository,
};
use crate::domain::{Calculation, CalculationId, User, UserId};

const POISONED: &str = "in-memory database lock poisoned";

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    calculations: HashMap<CalculationId, Calculation>,
}

/// Shared in-process database.
///
/// Clones share the same underlying tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new unit of work against this database.
    pub fn session(&self) -> InMemoryCalculationStore {
        InMemoryCalculationStore {
            database: self.clone(),
            staged: Vec::new(),
        }
    }

    /// User repository over the same tables.
    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            database: self.clone(),
        }
    }

    /// Number of committed calculations.
    pub fn calculation_count(&self) -> Result<usize, CalculationStoreError> {
        let tables = self.read().map_err(CalculationStoreError::query)?;
        Ok(tables.calculations.len())
    }

    /// Insert or replace a user, enforcing unique email and username.
    pub fn insert_user(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut tables = self.write().map_err(UserPersistenceError::query)?;
        let profile = user.profile();
        for existing in tables.users.values().filter(|other| other.id() != user.id()) {
            if existing.profile().email == profile.email {
                return Err(UserPersistenceError::duplicate("email"));
            }
            if existing.profile().username == profile.username {
                return Err(UserPersistenceError::duplicate("username"));
            }
        }
        tables.users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    /// Delete a user and every calculation they own.
    ///
    /// Returns `None` when no such user exists.
    pub fn remove_user(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut tables = self.write().map_err(UserPersistenceError::query)?;
        let Some(removed) = tables.users.remove(id) else {
            return Ok(None);
        };
        tables
            .calculations
            .retain(|_, calculation| calculation.user_id() != id);
        Ok(Some(removed))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, &'static str> {
        self.tables.read().map_err(|_| POISONED)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, &'static str> {
        self.tables.write().map_err(|_| POISONED)
    }
}

/// Unit of work over an [`InMemoryDatabase`].
#[derive(Debug)]
pub struct InMemoryCalculationStore {
    database: InMemoryDatabase,
    staged: Vec<Calculation>,
}

impl InMemoryCalculationStore {
    /// Calculations waiting for the next commit.
    pub fn staged(&self) -> &[Calculation] {
        &self.staged
    }
}

#[async_trait]
impl CalculationStore for InMemoryCalculationStore {
    async fn find_user(&mut self, id: &UserId) -> Result<Option<User>, CalculationStoreError> {
        let tables = self.database.read().map_err(CalculationStoreError::query)?;
        Ok(tables.users.get(id).cloned())
    }

    fn stage(&mut self, calculation: Calculation) {
        self.staged.push(calculation);
    }

    async fn commit(&mut self) -> Result<usize, CalculationStoreError> {
        let staged = std::mem::take(&mut self.staged);
        let mut tables = self.database.write().map_err(CalculationStoreError::query)?;

        // Check every row before writing any so a failed commit leaves no trace.
        let mut batch_ids = HashSet::with_capacity(staged.len());
        for calculation in &staged {
            if !tables.users.contains_key(calculation.user_id()) {
                return Err(CalculationStoreError::user_not_found(
                    calculation.user_id().as_ref(),
                ));
            }
            if !batch_ids.insert(calculation.id())
                || tables.calculations.contains_key(&calculation.id())
            {
                return Err(CalculationStoreError::query(format!(
                    "duplicate calculation id {}",
                    calculation.id()
                )));
            }
        }

        let written = staged.len();
        for calculation in staged {
            tables.calculations.insert(calculation.id(), calculation);
        }
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
        let tables = self.database.read().map_err(CalculationStoreError::query)?;
        Ok(tables.calculations.get(id).cloned())
    }
}

/// [`UserRepository`] over an [`InMemoryDatabase`].
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    database: InMemoryDatabase,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError> {
        self.database.insert_user(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.database.read().map_err(UserPersistenceError::query)?;
        Ok(tables.users.get(id).cloned())
    }
}
