//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod calculation_store;
mod user_repository;

#[cfg(test)]
pub use calculation_store::MockCalculationStore;
pub use calculation_store::{CalculationStore, CalculationStoreError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};

#[cfg(test)]
mod tests;
