//! Feature extraction and encoding
//!
//! Converts stored performance records into model-ready features.

pub mod encoding;

pub use encoding::{
    encode, encode_all, encode_example, encode_label, FeatureVector, TrainingExample,
    FEATURE_NAMES, FEATURE_ORDER,
};
