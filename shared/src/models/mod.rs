//! Domain models for the Resto Back-Office Platform

mod batch;
mod cogs;
mod movement;
mod reports;
mod sales;

pub use batch::*;
pub use cogs::*;
pub use movement::*;
pub use reports::*;
pub use sales::*;
