//! Shared types and models for the Resto Back-Office Platform
//!
//! This crate contains the domain model of the inventory costing and
//! reconciliation engine, shared between the backend and report exporters.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
