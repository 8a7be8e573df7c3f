//! Neural network architecture and persistence
//!
//! - MLP: the feed-forward suitability network
//! - Store: snapshot load/save of the live classifier

pub mod mlp;
pub mod store;

pub use mlp::PerformanceNet;
pub use store::{LoadOutcome, ModelStore, ReinitReason, SaveOutcome};
