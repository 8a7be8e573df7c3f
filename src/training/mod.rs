//! Model training
//!
//! Classifier training loop, retraining policy, and metrics tracking.

pub mod classifier;
pub mod metrics;
pub mod orchestrator;

pub use classifier::Classifier;
pub use metrics::{EpochMetrics, TrainingReport};
pub use orchestrator::{FullRetrain, RetrainOutcome, TrainingOrchestrator};
