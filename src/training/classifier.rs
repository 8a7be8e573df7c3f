//! Suitability classifier: network, optimizer state and training loop

use burn::data::dataloader::DataLoaderBuilder;
use burn::module::{AutodiffModule, Module};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::activation::relu;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use parking_lot::Mutex;

use crate::data::dataset::{features_tensor, PerformanceBatcher, PerformanceDataset};
use crate::features::{FeatureVector, TrainingExample};
use crate::model::mlp::PerformanceNet;
use crate::training::metrics::TrainingReport;
use crate::{ModelConfig, PlayerAiError, Result, TrainingConfig};

/// Probability above which a player is predicted suitable
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Strict threshold: exactly 0.5 is not suitable
pub fn is_suitable(probability: f32) -> bool {
    probability > DECISION_THRESHOLD
}

type PerformanceOptimizer<B> = OptimizerAdaptor<Adam, PerformanceNet<B>, B>;

// Backend seeding is process-global; seed and init must not interleave.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// The live model: network weights plus Adam moment state
pub struct Classifier<B: AutodiffBackend> {
    model: PerformanceNet<B>,
    optimizer: PerformanceOptimizer<B>,
    model_config: ModelConfig,
    training: TrainingConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> Classifier<B> {
    /// Create a classifier with freshly initialized weights
    pub fn new(device: B::Device, model_config: ModelConfig, training: TrainingConfig) -> Self {
        let model = {
            let _guard = INIT_LOCK.lock();
            B::seed(training.seed);
            let model = PerformanceNet::new(&device, &model_config);
            // Parameters are lazy; draw them now, while the seed still holds
            let _ = model.forward(Tensor::zeros([1, FeatureVector::DIM], &device));
            model
        };

        Classifier {
            model,
            optimizer: Self::init_optimizer(),
            model_config,
            training,
            device,
        }
    }

    fn init_optimizer() -> PerformanceOptimizer<B> {
        AdamConfig::new().with_epsilon(1e-8).init()
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    pub fn training_config(&self) -> &TrainingConfig {
        &self.training
    }

    pub fn num_params(&self) -> usize {
        self.model.num_params()
    }

    /// Continue training on the full example set.
    ///
    /// Runs the configured number of epochs, each over a single batch holding
    /// every example. An empty example set leaves the model untouched.
    pub fn train(&mut self, examples: &[TrainingExample]) -> Result<TrainingReport> {
        let mut report = TrainingReport::new(examples.len());
        if examples.is_empty() {
            log::warn!("No training examples, skipping training");
            return Ok(report);
        }

        let epochs = self.training.epochs;
        let dataset = PerformanceDataset::new(examples.to_vec());
        let batcher = PerformanceBatcher::<B>::new(self.device.clone());

        // Full batch - no shuffle
        let loader = DataLoaderBuilder::new(batcher)
            .batch_size(examples.len())
            .build(dataset);

        log::info!(
            "Training on {} examples for {} epochs",
            examples.len(),
            epochs
        );

        for epoch in 0..epochs {
            let batch = loader
                .iter()
                .next()
                .ok_or_else(|| PlayerAiError::Model("data loader produced no batch".into()))?;

            let logits = self.model.forward(batch.features);
            let loss = binary_cross_entropy_with_logits(logits.clone(), batch.labels.clone());
            let loss_val: f32 = loss.clone().into_scalar().elem();
            let accuracy = accuracy(logits, batch.labels)?;

            // Backward pass
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);

            // Update weights
            self.model = self
                .optimizer
                .step(self.training.learning_rate, self.model.clone(), grads);

            report.record_epoch(loss_val, accuracy);

            if epoch % 10 == 0 || epoch + 1 == epochs {
                log::debug!(
                    "Epoch {}/{}: loss={:.4}, acc={:.1}%",
                    epoch + 1,
                    epochs,
                    loss_val,
                    accuracy * 100.0
                );
            }
        }

        log::info!("Training complete: {}", report);
        Ok(report)
    }

    /// Probability that each player is suitable
    pub fn probabilities(&self, features: &[FeatureVector]) -> Result<Vec<f32>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model.valid();
        let input = features_tensor::<B::InnerBackend>(features, &self.device);
        let logits = model
            .forward(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PlayerAiError::Model(format!("{:?}", e)))?;
        Ok(logits.into_iter().map(sigmoid).collect())
    }

    /// Probability that a single player is suitable
    pub fn probability(&self, features: &FeatureVector) -> f32 {
        let model = self.model.valid();
        let input = features_tensor::<B::InnerBackend>(std::slice::from_ref(features), &self.device);
        sigmoid(model.forward(input).into_scalar().elem())
    }

    /// Whether the player is predicted suitable
    pub fn predict(&self, features: &FeatureVector) -> bool {
        is_suitable(self.probability(features))
    }

    /// Serialize network and optimizer records as (model, optimizer) bytes
    pub fn to_record_bytes(&self) -> Result<(Vec<u8>, Vec<u8>)>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let model = recorder
            .record(self.model.clone().into_record(), ())
            .map_err(|e| PlayerAiError::Model(e.to_string()))?;
        let optimizer = recorder
            .record(self.optimizer.to_record(), ())
            .map_err(|e| PlayerAiError::Model(e.to_string()))?;
        Ok((model, optimizer))
    }

    /// Rebuild a classifier from bytes produced by `to_record_bytes`
    pub fn from_record_bytes(
        device: B::Device,
        model_config: ModelConfig,
        training: TrainingConfig,
        model_bytes: Vec<u8>,
        optimizer_bytes: Vec<u8>,
    ) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let model_record = recorder
            .load(model_bytes, &device)
            .map_err(|e| PlayerAiError::Model(e.to_string()))?;
        let optimizer_record = recorder
            .load(optimizer_bytes, &device)
            .map_err(|e| PlayerAiError::Model(e.to_string()))?;

        let model = {
            let _guard = INIT_LOCK.lock();
            PerformanceNet::new(&device, &model_config)
        }
        .load_record(model_record);

        Ok(Classifier {
            model,
            optimizer: Self::init_optimizer().load_record(optimizer_record),
            model_config,
            training,
            device,
        })
    }
}

/// Logistic function; a zero logit maps to exactly 0.5
fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

/// Binary cross-entropy on logits: max(x, 0) - x * y + ln(1 + e^-|x|)
fn binary_cross_entropy_with_logits<B: AutodiffBackend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let loss = relu(logits.clone()) - logits.clone() * targets + logits.abs().neg().exp().log1p();
    loss.mean()
}

fn accuracy<B: AutodiffBackend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Result<f32> {
    let logits = logits
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| PlayerAiError::Model(format!("{:?}", e)))?;
    let targets = targets
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| PlayerAiError::Model(format!("{:?}", e)))?;

    let correct = logits
        .iter()
        .zip(targets.iter())
        .filter(|(l, t)| is_suitable(sigmoid(**l)) == (**t > DECISION_THRESHOLD))
        .count();

    Ok(correct as f32 / logits.len().max(1) as f32)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    pub(crate) type TestBackend = Autodiff<NdArray<f32>>;

    /// 10 suitable players with high batting numbers, 10 unsuitable with low
    pub(crate) fn synthetic_examples() -> Vec<TrainingExample> {
        (0..20)
            .map(|i| {
                let jitter = (i % 10) as f32;
                if i < 10 {
                    TrainingExample {
                        features: FeatureVector::new([
                            45.0 + jitter,
                            135.0 + jitter * 2.0,
                            22.0 + jitter * 0.5,
                            4.5 + jitter * 0.1,
                            14.0 + jitter,
                        ]),
                        label: 1.0,
                    }
                } else {
                    TrainingExample {
                        features: FeatureVector::new([
                            8.0 + jitter,
                            60.0 + jitter * 2.0,
                            45.0 + jitter * 0.5,
                            8.5 + jitter * 0.1,
                            2.0 + jitter * 0.5,
                        ]),
                        label: 0.0,
                    }
                }
            })
            .collect()
    }

    fn classifier() -> Classifier<TestBackend> {
        Classifier::new(
            Default::default(),
            ModelConfig::default(),
            TrainingConfig::default(),
        )
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(!is_suitable(0.5));
        assert!(is_suitable(0.5000001));
        assert!(!is_suitable(0.0));
        assert!(is_suitable(1.0));
    }

    #[test]
    fn test_zero_logit_is_not_suitable() {
        let device = Default::default();
        let mut classifier = classifier();
        classifier.model = classifier.model.with_zeroed_output(&device);
        let features = FeatureVector::new([50.5, 140.0, 20.0, 4.2, 15.0]);

        assert_eq!(classifier.probability(&features), 0.5);
        assert!(!classifier.predict(&features));
        assert_eq!(classifier.probabilities(&[features]).unwrap(), vec![0.5]);
    }

    #[test]
    fn test_same_seed_same_initial_model() {
        let a = classifier();
        let b = classifier();
        let features = FeatureVector::new([50.5, 140.0, 20.0, 4.2, 15.0]);

        assert_eq!(a.probability(&features), b.probability(&features));
    }

    #[test]
    fn test_predict_is_pure() {
        let classifier = classifier();
        let features = FeatureVector::new([50.5, 140.0, 20.0, 4.2, 15.0]);

        let p1 = classifier.probability(&features);
        let p2 = classifier.probability(&features);
        assert_eq!(p1, p2);
        assert!((0.0..=1.0).contains(&p1));
        assert_eq!(classifier.predict(&features), classifier.predict(&features));
    }

    #[test]
    fn test_training_moves_predictions_toward_labels() {
        let mut classifier = classifier();
        let examples = synthetic_examples();
        let features: Vec<FeatureVector> = examples.iter().map(|e| e.features).collect();

        let before = classifier.probabilities(&features).unwrap();
        let report = classifier.train(&examples).unwrap();
        let after = classifier.probabilities(&features).unwrap();

        assert_eq!(report.epochs_run(), 50);
        assert!(report.improvement().unwrap() > 0.0, "loss did not decrease: {}", report);

        let moved = examples
            .iter()
            .zip(before.iter().zip(after.iter()))
            .any(|(example, (b, a))| {
                if example.label > 0.5 {
                    a > b
                } else {
                    a < b
                }
            });
        assert!(moved, "no prediction moved toward its label");
    }

    #[test]
    fn test_train_on_empty_set_is_noop() {
        let mut classifier = classifier();
        let features = FeatureVector::new([30.0, 100.0, 30.0, 6.0, 5.0]);
        let before = classifier.probability(&features);

        let report = classifier.train(&[]).unwrap();

        assert_eq!(report.epochs_run(), 0);
        assert_eq!(classifier.probability(&features), before);
    }

    #[test]
    fn test_record_bytes_roundtrip() {
        let mut classifier = classifier();
        classifier.train(&synthetic_examples()[..6]).unwrap();

        let (model, optimizer) = classifier.to_record_bytes().unwrap();
        let restored = Classifier::<TestBackend>::from_record_bytes(
            Default::default(),
            ModelConfig::default(),
            TrainingConfig::default(),
            model,
            optimizer,
        )
        .unwrap();

        let features = FeatureVector::new([50.5, 140.0, 20.0, 4.2, 15.0]);
        assert_eq!(restored.probability(&features), classifier.probability(&features));
    }
}
