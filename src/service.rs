//! Record service
//!
//! CRUD over performance records. Every successful mutation triggers the
//! retraining policy before returning; predictions go straight to the live
//! model.

use std::collections::HashMap;
use std::sync::Arc;

use burn::tensor::backend::AutodiffBackend;

use crate::data::repository::PerformanceRepository;
use crate::features::{encode, encode_label};
use crate::model::store::ModelStore;
use crate::predict::ModelHandle;
use crate::training::{FullRetrain, RetrainOutcome, TrainingOrchestrator};
use crate::{PerformanceRecord, PlayerStats, RecordId, Result};

pub struct PerformanceService<R: PerformanceRepository, B: AutodiffBackend> {
    repository: Arc<R>,
    model: ModelHandle<B>,
    orchestrator: Box<dyn TrainingOrchestrator>,
}

impl<R, B> PerformanceService<R, B>
where
    R: PerformanceRepository + 'static,
    B: AutodiffBackend,
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Service with the default full-retrain policy
    pub fn new(repository: R, model: ModelHandle<B>, store: ModelStore) -> Self {
        let repository = Arc::new(repository);
        let orchestrator = FullRetrain::new(Arc::clone(&repository), model.clone(), store);
        Self::with_orchestrator(repository, model, Box::new(orchestrator))
    }
}

impl<R, B> PerformanceService<R, B>
where
    R: PerformanceRepository,
    B: AutodiffBackend,
{
    /// Service with a custom retraining policy
    pub fn with_orchestrator(
        repository: Arc<R>,
        model: ModelHandle<B>,
        orchestrator: Box<dyn TrainingOrchestrator>,
    ) -> Self {
        PerformanceService {
            repository,
            model,
            orchestrator,
        }
    }

    pub fn model(&self) -> &ModelHandle<B> {
        &self.model
    }

    pub fn get_all(&self) -> Result<Vec<PerformanceRecord>> {
        self.repository.find_all()
    }

    pub fn get(&self, id: RecordId) -> Result<Option<PerformanceRecord>> {
        self.repository.find_by_id(id)
    }

    /// Store a new record and retrain
    pub fn add(&self, stats: PlayerStats) -> Result<PerformanceRecord> {
        validate(&stats)?;
        let record = self.repository.insert(&stats)?;
        log::info!("Added {}", record.id);
        self.retrain()?;
        Ok(record)
    }

    /// Replace an existing record and retrain; `None` if the id is unknown
    pub fn update(&self, id: RecordId, stats: PlayerStats) -> Result<Option<PerformanceRecord>> {
        validate(&stats)?;
        let Some(record) = self.repository.update(id, &stats)? else {
            return Ok(None);
        };
        log::info!("Updated {}", record.id);
        self.retrain()?;
        Ok(Some(record))
    }

    /// Remove a record and retrain; `false` if the id is unknown
    pub fn delete(&self, id: RecordId) -> Result<bool> {
        if !self.repository.exists_by_id(id)? {
            return Ok(false);
        }
        self.repository.delete_by_id(id)?;
        log::info!("Deleted {}", id);
        self.retrain()?;
        Ok(true)
    }

    /// Predict suitability from the five named inputs
    pub fn predict(&self, values: &HashMap<String, f32>) -> Result<bool> {
        self.model.predict_named(values)
    }

    /// Retrain on the current dataset
    pub fn train(&self) -> Result<RetrainOutcome> {
        self.retrain()
    }

    fn retrain(&self) -> Result<RetrainOutcome> {
        let outcome = self.orchestrator.retrain().map_err(|e| {
            log::error!("Error during model training: {}", e);
            e
        })?;
        if let RetrainOutcome::Trained { report, .. } = &outcome {
            log::debug!("Retrained: {}", report);
        }
        Ok(outcome)
    }
}

/// Reject stats the model could not train on before they reach the store
fn validate(stats: &PlayerStats) -> Result<()> {
    encode(stats)?;
    encode_label(stats)?;
    Ok(())
}
