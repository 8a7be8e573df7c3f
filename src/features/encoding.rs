//! Encoding of performance records into model inputs
//!
//! The feature order is part of the persisted model's contract: trained
//! weights only make sense for vectors laid out exactly as `FEATURE_NAMES`.

use std::collections::HashMap;

use crate::{PerformanceRecord, PlayerAiError, PlayerStats, RecordId, Result};

/// Input feature names, in model order
pub const FEATURE_NAMES: [&str; FeatureVector::DIM] = [
    "average",
    "strikeRate",
    "bowlingAverage",
    "economyRate",
    "fieldingStats",
];

/// Identifier of the feature layout, stored alongside every model snapshot
pub const FEATURE_ORDER: &str = "average,strikeRate,bowlingAverage,economyRate,fieldingStats";

/// Model input for a single player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FeatureVector::DIM]);

impl FeatureVector {
    /// Number of input features
    pub const DIM: usize = 5;

    pub fn new(values: [f32; Self::DIM]) -> Self {
        FeatureVector(values)
    }

    /// Build a vector from a mapping keyed by the feature names.
    ///
    /// Every name in `FEATURE_NAMES` must be present; extra keys are ignored.
    pub fn from_named(values: &HashMap<String, f32>) -> Result<Self> {
        let mut out = [0.0f32; Self::DIM];
        for (slot, name) in out.iter_mut().zip(FEATURE_NAMES) {
            let value = *values
                .get(name)
                .ok_or(PlayerAiError::MissingFeature(name))?;
            if !value.is_finite() {
                return Err(PlayerAiError::InvalidFeature { name, value });
            }
            *slot = value;
        }
        Ok(FeatureVector(out))
    }

    pub fn as_array(&self) -> &[f32; Self::DIM] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

/// A feature vector paired with its label (0.0 or 1.0)
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub label: f32,
}

/// Project a player's stats onto the model's input space
pub fn encode(stats: &PlayerStats) -> Result<FeatureVector> {
    encode_checked(stats, None)
}

/// Project the label of a player's stats onto {0.0, 1.0}
pub fn encode_label(stats: &PlayerStats) -> Result<f32> {
    encode_label_checked(stats, None)
}

/// Encode a stored record into a training example
pub fn encode_example(record: &PerformanceRecord) -> Result<TrainingExample> {
    Ok(TrainingExample {
        features: encode_checked(&record.stats, Some(record.id))?,
        label: encode_label_checked(&record.stats, Some(record.id))?,
    })
}

/// Encode every record, failing on the first malformed one
pub fn encode_all(records: &[PerformanceRecord]) -> Result<Vec<TrainingExample>> {
    records.iter().map(encode_example).collect()
}

fn encode_checked(stats: &PlayerStats, id: Option<RecordId>) -> Result<FeatureVector> {
    let reals = [
        ("average", stats.average),
        ("strikeRate", stats.strike_rate),
        ("bowlingAverage", stats.bowling_average),
        ("economyRate", stats.economy_rate),
    ];

    let mut values = [0.0f32; FeatureVector::DIM];
    for (slot, (field, value)) in values.iter_mut().zip(reals) {
        if !value.is_finite() {
            return Err(PlayerAiError::InvalidRecord {
                id,
                field,
                reason: format!("is not finite ({})", value),
            });
        }
        *slot = value as f32;
    }
    values[4] = stats.fielding_stats as f32;

    Ok(FeatureVector(values))
}

fn encode_label_checked(stats: &PlayerStats, id: Option<RecordId>) -> Result<f32> {
    match stats.label {
        0 => Ok(0.0),
        1 => Ok(1.0),
        other => Err(PlayerAiError::InvalidRecord {
            id,
            field: "label",
            reason: format!("must be 0 or 1, got {}", other),
        }),
    }
}
