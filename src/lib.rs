//! Player performance AI
//!
//! A small store of player performance records with a feed-forward
//! classifier on top that predicts player suitability. Every mutation of
//! the store retrains the classifier on the full dataset.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod service;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// CPU backend used by the CLI and by default in tests
pub type DefaultBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

/// Unique identifier for a stored performance record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({})", self.0)
    }
}

/// Performance attributes and ground-truth label of a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub average: f64,
    pub strike_rate: f64,
    pub bowling_average: f64,
    pub economy_rate: f64,
    pub fielding_stats: i32,
    /// 1 for suitable, 0 for not
    pub label: i32,
}

/// A stored performance record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub stats: PlayerStats,
}

impl PerformanceRecord {
    pub fn new(id: RecordId, stats: PlayerStats) -> Self {
        PerformanceRecord { id, stats }
    }

    pub fn is_suitable(&self) -> bool {
        self.stats.label == 1
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PlayerAiError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Invalid record {id:?}: field `{field}` {reason}")]
    InvalidRecord {
        id: Option<RecordId>,
        field: &'static str,
        reason: String,
    },

    #[error("Missing feature: {0}")]
    MissingFeature(&'static str),

    #[error("Invalid feature `{name}`: {value}")]
    InvalidFeature { name: &'static str, value: f32 },

    #[error("Record not found with ID: {0}")]
    RecordNotFound(RecordId),
}

pub type Result<T> = std::result::Result<T, PlayerAiError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub training: TrainingConfig,
    pub model: ModelConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub hidden_dims: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub model_path: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 50,
            learning_rate: 1e-3,
            seed: 42,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            hidden_dims: vec![64, 32],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            training: TrainingConfig::default(),
            model: ModelConfig::default(),
            data: DataConfig {
                database_path: "data/players.db".to_string(),
                model_path: "model/player_model.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlayerAiError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| PlayerAiError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PlayerAiError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.training.epochs, 50);
        assert_eq!(parsed.training.seed, 42);
        assert_eq!(parsed.model.hidden_dims, vec![64, 32]);
        assert_eq!(parsed.data.model_path, config.data.model_path);
    }

    #[test]
    fn test_record_serializes_with_camel_case_fields() {
        let record = PerformanceRecord::new(
            RecordId(7),
            PlayerStats {
                average: 50.5,
                strike_rate: 140.0,
                bowling_average: 20.0,
                economy_rate: 4.2,
                fielding_stats: 15,
                label: 1,
            },
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["strikeRate"], 140.0);
        assert_eq!(json["fieldingStats"], 15);
        assert!(record.is_suitable());
    }
}
