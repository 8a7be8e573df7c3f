//! Persistence of the live classifier
//!
//! The model lives in a single snapshot file that is read once at startup
//! and overwritten after every training run. Load and save failures never
//! reach the caller: a broken snapshot is replaced by a fresh model and a
//! failed save leaves the in-memory model authoritative. Both paths are
//! reported through [`LoadOutcome`] and [`SaveOutcome`].

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::features::FEATURE_ORDER;
use crate::training::Classifier;
use crate::{ModelConfig, PlayerAiError, Result, TrainingConfig};

/// Version of the snapshot envelope
pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk envelope around the burn records
#[derive(Debug, Serialize, Deserialize)]
struct ModelSnapshot {
    format_version: u32,
    feature_order: String,
    hidden_dims: Vec<usize>,
    model: Vec<u8>,
    optimizer: Vec<u8>,
}

/// Result of a save attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    SaveFailed(String),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// Why a fresh model was built instead of loading the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReinitReason {
    /// No snapshot at the path
    Missing,
    /// Snapshot could not be read or decoded
    Unreadable(String),
    /// Snapshot was trained on a different feature layout
    FeatureOrderMismatch { found: String },
    /// Snapshot has different hidden layers than configured
    ArchitectureMismatch { found: Vec<usize> },
}

impl fmt::Display for ReinitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReinitReason::Missing => write!(f, "no snapshot found"),
            ReinitReason::Unreadable(e) => write!(f, "snapshot unreadable: {}", e),
            ReinitReason::FeatureOrderMismatch { found } => {
                write!(f, "feature order mismatch (found `{}`)", found)
            }
            ReinitReason::ArchitectureMismatch { found } => {
                write!(f, "hidden layer mismatch (found {:?})", found)
            }
        }
    }
}

/// Result of loading the model at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Reinitialized {
        reason: ReinitReason,
        save: SaveOutcome,
    },
}

/// Owner of the snapshot file
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ModelStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the snapshot, or build and persist a fresh model.
    ///
    /// Never fails: any problem with the snapshot is logged and the model is
    /// reinitialized.
    pub fn load_or_initialize<B: AutodiffBackend>(
        &self,
        device: B::Device,
        model_config: ModelConfig,
        training: TrainingConfig,
    ) -> (Classifier<B>, LoadOutcome)
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let reason = if self.exists() {
            match self.load(device.clone(), model_config.clone(), training.clone()) {
                Ok(Ok(classifier)) => {
                    log::info!("Loaded existing model from {}", self.path.display());
                    return (classifier, LoadOutcome::Loaded);
                }
                Ok(Err(reason)) => reason,
                Err(e) => ReinitReason::Unreadable(e.to_string()),
            }
        } else {
            ReinitReason::Missing
        };

        match &reason {
            ReinitReason::Missing => log::info!(
                "No model at {}, initializing a new one",
                self.path.display()
            ),
            other => log::warn!(
                "Failed to load model from {} ({}), initializing a new one",
                self.path.display(),
                other
            ),
        }

        let classifier = Classifier::new(device, model_config, training);
        let save = self.save(&classifier);
        (classifier, LoadOutcome::Reinitialized { reason, save })
    }

    /// Decode the snapshot without any fallback; the inner error is a
    /// snapshot that does not fit the current model
    pub fn load<B: AutodiffBackend>(
        &self,
        device: B::Device,
        model_config: ModelConfig,
        training: TrainingConfig,
    ) -> Result<std::result::Result<Classifier<B>, ReinitReason>>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let content = std::fs::read(&self.path)?;
        let snapshot: ModelSnapshot =
            serde_json::from_slice(&content).map_err(|e| PlayerAiError::Parse(e.to_string()))?;

        if snapshot.format_version != SNAPSHOT_VERSION {
            return Err(PlayerAiError::Parse(format!(
                "unsupported snapshot version {}",
                snapshot.format_version
            )));
        }
        if snapshot.feature_order != FEATURE_ORDER {
            return Ok(Err(ReinitReason::FeatureOrderMismatch {
                found: snapshot.feature_order,
            }));
        }
        if snapshot.hidden_dims != model_config.hidden_dims {
            return Ok(Err(ReinitReason::ArchitectureMismatch {
                found: snapshot.hidden_dims,
            }));
        }

        let classifier = Classifier::from_record_bytes(
            device,
            model_config,
            training,
            snapshot.model,
            snapshot.optimizer,
        )?;
        Ok(Ok(classifier))
    }

    /// Persist the classifier, replacing the previous snapshot atomically.
    ///
    /// Failures are logged and reported, never raised.
    pub fn save<B: AutodiffBackend>(&self, classifier: &Classifier<B>) -> SaveOutcome
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        match self.write_snapshot(classifier) {
            Ok(()) => {
                log::info!("Model saved to {}", self.path.display());
                SaveOutcome::Saved
            }
            Err(e) => {
                log::warn!("Failed to save model to {}: {}", self.path.display(), e);
                SaveOutcome::SaveFailed(e.to_string())
            }
        }
    }

    fn write_snapshot<B: AutodiffBackend>(&self, classifier: &Classifier<B>) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let (model, optimizer) = classifier.to_record_bytes()?;
        let snapshot = ModelSnapshot {
            format_version: SNAPSHOT_VERSION,
            feature_order: FEATURE_ORDER.to_string(),
            hidden_dims: classifier.model_config().hidden_dims.clone(),
            model,
            optimizer,
        };
        let content =
            serde_json::to_vec(&snapshot).map_err(|e| PlayerAiError::Parse(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Write beside the target, then rename over it
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::training::classifier::tests::{synthetic_examples, TestBackend};

    fn load(store: &ModelStore) -> (Classifier<TestBackend>, LoadOutcome) {
        store.load_or_initialize::<TestBackend>(
            Default::default(),
            ModelConfig::default(),
            TrainingConfig::default(),
        )
    }

    fn sample() -> FeatureVector {
        FeatureVector::new([50.5, 140.0, 20.0, 4.2, 15.0])
    }

    #[test]
    fn test_missing_file_initializes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("model").join("player_model.json"));

        let (fresh, outcome) = load(&store);
        assert_eq!(
            outcome,
            LoadOutcome::Reinitialized {
                reason: ReinitReason::Missing,
                save: SaveOutcome::Saved,
            }
        );
        assert!(store.exists());

        let (reloaded, outcome) = load(&store);
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(reloaded.probability(&sample()), fresh.probability(&sample()));
    }

    #[test]
    fn test_trained_model_survives_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("player_model.json"));

        let (mut classifier, _) = load(&store);
        classifier.train(&synthetic_examples()).unwrap();
        assert!(store.save(&classifier).is_saved());

        let (reloaded, outcome) = load(&store);
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(reloaded.probability(&sample()), classifier.probability(&sample()));
    }

    #[test]
    fn test_plain_load_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("player_model.json"));

        let missing = store.load::<TestBackend>(
            Default::default(),
            ModelConfig::default(),
            TrainingConfig::default(),
        );
        assert!(matches!(missing, Err(PlayerAiError::Io(_))));
        assert!(!store.exists());

        let (saved, _) = load(&store);
        let loaded = store
            .load::<TestBackend>(
                Default::default(),
                ModelConfig::default(),
                TrainingConfig::default(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(loaded.probability(&sample()), saved.probability(&sample()));
    }

    #[test]
    fn test_corrupt_file_reinitializes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player_model.json");
        std::fs::write(&path, b"not a model").unwrap();
        let store = ModelStore::new(&path);

        let (_, outcome) = load(&store);
        match outcome {
            LoadOutcome::Reinitialized {
                reason: ReinitReason::Unreadable(_),
                save,
            } => assert!(save.is_saved()),
            other => panic!("expected reinitialization, got {:?}", other),
        }

        // The corrupt file was replaced by a loadable snapshot
        assert_eq!(load(&store).1, LoadOutcome::Loaded);
    }

    #[test]
    fn test_feature_order_mismatch_reinitializes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player_model.json");
        let store = ModelStore::new(&path);
        load(&store);

        let mut snapshot: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        snapshot["feature_order"] = "strikeRate,average".into();
        std::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        let (_, outcome) = load(&store);
        assert!(matches!(
            outcome,
            LoadOutcome::Reinitialized {
                reason: ReinitReason::FeatureOrderMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_architecture_mismatch_reinitializes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("player_model.json"));
        load(&store);

        let (_, outcome) = store.load_or_initialize::<TestBackend>(
            Default::default(),
            ModelConfig {
                hidden_dims: vec![16],
            },
            TrainingConfig::default(),
        );
        assert!(matches!(
            outcome,
            LoadOutcome::Reinitialized {
                reason: ReinitReason::ArchitectureMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_save_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let store = ModelStore::new(blocker.join("player_model.json"));

        let (classifier, outcome) = load(&store);
        match outcome {
            LoadOutcome::Reinitialized {
                reason: ReinitReason::Missing,
                save: SaveOutcome::SaveFailed(_),
            } => {}
            other => panic!("expected failed save, got {:?}", other),
        }

        assert!(matches!(store.save(&classifier), SaveOutcome::SaveFailed(_)));
        // The in-memory model stays usable
        let p = classifier.probability(&sample());
        assert!((0.0..=1.0).contains(&p));
    }
}
