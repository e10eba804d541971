//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the calculation store and user repository
//! ports, backed by PostgreSQL via `diesel-async` and `bb8` pooling.
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types.
//! - **Internal models**: Row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: Diesel and pool failures are mapped to the
//!   port error types.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselCalculationStore, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/calculations");
//! let pool = DbPool::new(config).await?;
//! let store = DieselCalculationStore::new(pool);
//! ```

pub(crate) mod diesel_basic_error_mapping;
mod diesel_calculation_store;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_calculation_store::DieselCalculationStore;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_SIZE, DEFAULT_MIN_IDLE, DbPool, PoolConfig, PoolError,
};
