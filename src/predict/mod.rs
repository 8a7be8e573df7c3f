//! Prediction and inference
//!
//! Shared handle to the live classifier used by every inference request.

pub mod inference;

pub use crate::training::classifier::{is_suitable, DECISION_THRESHOLD};
pub use inference::ModelHandle;
