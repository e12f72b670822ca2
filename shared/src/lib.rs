//! Shared types and models for the Gold Bar Inventory Platform
//!
//! This crate contains the domain types shared between the inventory engine,
//! the reporting layer and any embedding application.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
