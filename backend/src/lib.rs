//! Calculation records owned by users: input validation, arithmetic and
//! persistence adapters.

pub mod config;
pub mod domain;
pub mod outbound;
