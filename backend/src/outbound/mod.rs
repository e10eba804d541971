//! Outbound adapters implementing domain ports.
//!
//! - **memory**: process-local tables for tests and embedding
//! - **persistence**: PostgreSQL-backed adapters using Diesel ORM
//!
//! Adapters translate between domain types and storage representations.
//! They contain no business logic.

pub mod memory;
pub mod persistence;
