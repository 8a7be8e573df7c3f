//! Burn dataset and batcher over encoded training examples

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::data::repository::PerformanceSource;
use crate::features::{encode_all, FeatureVector, TrainingExample};
use crate::Result;

/// In-memory dataset of encoded examples
#[derive(Debug, Clone, Default)]
pub struct PerformanceDataset {
    examples: Vec<TrainingExample>,
}

impl PerformanceDataset {
    pub fn new(examples: Vec<TrainingExample>) -> Self {
        PerformanceDataset { examples }
    }

    /// Encode every record the source currently holds
    pub fn from_source<S: PerformanceSource + ?Sized>(source: &S) -> Result<Self> {
        let records = source.find_all()?;
        Ok(Self::new(encode_all(&records)?))
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }
}

impl Dataset<TrainingExample> for PerformanceDataset {
    fn get(&self, index: usize) -> Option<TrainingExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

/// Batch of examples for training
#[derive(Debug, Clone)]
pub struct PerformanceBatch<B: Backend> {
    /// Features: [batch, 5]
    pub features: Tensor<B, 2>,
    /// Labels: [batch, 1]
    pub labels: Tensor<B, 2>,
}

/// Batcher for creating training batches
#[derive(Clone)]
pub struct PerformanceBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> PerformanceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        PerformanceBatcher { device }
    }
}

impl<B: Backend> Batcher<B, TrainingExample, PerformanceBatch<B>> for PerformanceBatcher<B> {
    fn batch(&self, items: Vec<TrainingExample>, _device: &B::Device) -> PerformanceBatch<B> {
        let batch_size = items.len();

        let mut feature_data = Vec::with_capacity(batch_size * FeatureVector::DIM);
        let mut label_data = Vec::with_capacity(batch_size);
        for example in &items {
            feature_data.extend_from_slice(example.features.as_array());
            label_data.push(example.label);
        }

        let features = Tensor::<B, 1>::from_floats(feature_data.as_slice(), &self.device)
            .reshape([batch_size, FeatureVector::DIM]);
        let labels = Tensor::<B, 1>::from_floats(label_data.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        PerformanceBatch { features, labels }
    }
}

/// Stack feature vectors into a [n, 5] input tensor
pub fn features_tensor<B: Backend>(features: &[FeatureVector], device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = features
        .iter()
        .flat_map(|f| f.as_array().iter().copied())
        .collect();
    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([features.len(), FeatureVector::DIM])
}
