//! Shared access to the live classifier

use std::collections::HashMap;
use std::sync::Arc;

use burn::tensor::backend::AutodiffBackend;
use parking_lot::Mutex;

use crate::features::FeatureVector;
use crate::training::Classifier;
use crate::Result;

/// Lock-guarded handle to the one live classifier.
///
/// Training takes the lock for the whole train + save sequence, so a
/// prediction never observes partially updated weights. burn modules are
/// `Send` but not `Sync`, which rules out a reader-writer lock here.
pub struct ModelHandle<B: AutodiffBackend> {
    inner: Arc<Mutex<Classifier<B>>>,
}

impl<B: AutodiffBackend> Clone for ModelHandle<B> {
    fn clone(&self) -> Self {
        ModelHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: AutodiffBackend> ModelHandle<B> {
    pub fn new(classifier: Classifier<B>) -> Self {
        ModelHandle {
            inner: Arc::new(Mutex::new(classifier)),
        }
    }

    /// Run `f` with read access to the classifier
    pub fn read<R>(&self, f: impl FnOnce(&Classifier<B>) -> R) -> R {
        let guard = self.inner.lock();
        f(&guard)
    }

    /// Run `f` with exclusive access to the classifier
    pub fn write<R>(&self, f: impl FnOnce(&mut Classifier<B>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn probability(&self, features: &FeatureVector) -> f32 {
        self.read(|classifier| classifier.probability(features))
    }

    pub fn predict(&self, features: &FeatureVector) -> bool {
        self.read(|classifier| classifier.predict(features))
    }

    /// Predict from the five named inputs (`average`, `strikeRate`,
    /// `bowlingAverage`, `economyRate`, `fieldingStats`)
    pub fn predict_named(&self, values: &HashMap<String, f32>) -> Result<bool> {
        let features = FeatureVector::from_named(values)?;
        Ok(self.predict(&features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::classifier::tests::TestBackend;
    use crate::{ModelConfig, PlayerAiError, TrainingConfig};

    fn handle() -> ModelHandle<TestBackend> {
        ModelHandle::new(Classifier::new(
            Default::default(),
            ModelConfig::default(),
            TrainingConfig::default(),
        ))
    }

    #[test]
    fn test_predict_named_matches_vector_predict() {
        let handle = handle();
        let values: HashMap<String, f32> = [
            ("average", 50.5),
            ("strikeRate", 140.0),
            ("bowlingAverage", 20.0),
            ("economyRate", 4.2),
            ("fieldingStats", 15.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let features = FeatureVector::new([50.5, 140.0, 20.0, 4.2, 15.0]);
        assert_eq!(handle.predict_named(&values).unwrap(), handle.predict(&features));
    }

    #[test]
    fn test_predict_named_missing_key_is_caller_error() {
        let handle = handle();
        let values: HashMap<String, f32> = [("average".to_string(), 50.5)].into_iter().collect();

        assert!(matches!(
            handle.predict_named(&values),
            Err(PlayerAiError::MissingFeature("strikeRate"))
        ));
    }

    #[test]
    fn test_clones_share_the_same_model() {
        let handle = handle();
        let other = handle.clone();
        let features = FeatureVector::new([30.0, 110.0, 28.0, 6.0, 7.0]);

        let before = other.probability(&features);
        handle.write(|classifier| {
            classifier
                .train(&crate::training::classifier::tests::synthetic_examples())
                .unwrap()
        });

        assert_ne!(other.probability(&features), before);
    }
}
