//! Business logic services for the Resto Back-Office Platform

pub mod cogs;
pub mod costing;
pub mod negative_inventory;
pub mod reports;
pub mod variance;

pub use cogs::CogsService;
pub use costing::CostingService;
pub use negative_inventory::NegativeInventoryService;
pub use reports::ReportService;
pub use variance::VarianceService;
