//! Record storage and training data
//!
//! SQLite-backed record repository and the burn dataset fed to the classifier.

pub mod database;
pub mod dataset;
pub mod repository;

pub use database::Database;
pub use dataset::PerformanceDataset;
pub use repository::{PerformanceRepository, PerformanceSource};
