//! Retraining policy
//!
//! The default policy refits the live model on the whole current dataset
//! after every change to the record store.

use burn::tensor::backend::AutodiffBackend;

use burn::data::dataset::Dataset;

use crate::data::dataset::PerformanceDataset;
use crate::data::repository::PerformanceSource;
use crate::model::store::{ModelStore, SaveOutcome};
use crate::predict::ModelHandle;
use crate::training::metrics::TrainingReport;
use crate::Result;

/// Result of a retrain request
#[derive(Debug, Clone)]
pub enum RetrainOutcome {
    Trained {
        examples: usize,
        report: TrainingReport,
        save: SaveOutcome,
    },
    /// The dataset was empty; neither the model nor the snapshot changed
    Skipped,
}

impl RetrainOutcome {
    pub fn is_trained(&self) -> bool {
        matches!(self, RetrainOutcome::Trained { .. })
    }
}

/// Strategy invoked whenever the record store changes
pub trait TrainingOrchestrator {
    fn retrain(&self) -> Result<RetrainOutcome>;
}

/// Continued training of the live model on every stored record
pub struct FullRetrain<S, B: AutodiffBackend> {
    source: S,
    model: ModelHandle<B>,
    store: ModelStore,
}

impl<S, B> FullRetrain<S, B>
where
    S: PerformanceSource,
    B: AutodiffBackend,
{
    pub fn new(source: S, model: ModelHandle<B>, store: ModelStore) -> Self {
        FullRetrain {
            source,
            model,
            store,
        }
    }

    pub fn model(&self) -> &ModelHandle<B> {
        &self.model
    }
}

impl<S, B> TrainingOrchestrator for FullRetrain<S, B>
where
    S: PerformanceSource,
    B: AutodiffBackend,
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    fn retrain(&self) -> Result<RetrainOutcome> {
        // A malformed record aborts here, before the model is touched
        let dataset = PerformanceDataset::from_source(&self.source)?;

        if dataset.is_empty() {
            log::info!("No performance records, skipping retrain");
            return Ok(RetrainOutcome::Skipped);
        }

        self.model.write(|classifier| {
            let report = classifier.train(dataset.examples())?;
            let save = self.store.save(classifier);
            Ok(RetrainOutcome::Trained {
                examples: dataset.len(),
                report,
                save,
            })
        })
    }
}
