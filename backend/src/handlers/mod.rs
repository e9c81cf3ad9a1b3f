//! HTTP request handlers

pub mod batches;
pub mod health;
pub mod reports;

pub use batches::*;
pub use health::*;
pub use reports::*;
