//! Feed-forward suitability network
//!
//! Architecture: Input(5) → Hidden1(64) → ReLU
//!                       → Hidden2(32) → ReLU
//!                       → output(1) (apply sigmoid for P(suitable))

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::relu;
#[cfg(test)]
use burn::nn::Initializer;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::FeatureVector;
use crate::ModelConfig;

/// A single hidden layer block: Linear → ReLU
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.linear.forward(x))
    }
}

/// Multi-layer perceptron producing a single suitability logit
#[derive(Module, Debug)]
pub struct PerformanceNet<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    output: Linear<B>,
}

impl<B: Backend> PerformanceNet<B> {
    /// Create a new network with freshly initialized weights
    pub fn new(device: &B::Device, config: &ModelConfig) -> Self {
        let mut in_dim = FeatureVector::DIM;
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim));
            in_dim = out_dim;
        }

        PerformanceNet {
            hidden,
            output: LinearConfig::new(in_dim, 1).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - Encoded players [batch, 5]
    ///
    /// # Returns
    /// Suitability logits [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(features, |x, block| block.forward(x));
        self.output.forward(x)
    }

    /// Replace the output layer with all-zero weights and bias
    #[cfg(test)]
    pub(crate) fn with_zeroed_output(mut self, device: &B::Device) -> Self {
        let in_dim = self.output.weight.dims()[0];
        self.output = LinearConfig::new(in_dim, 1)
            .with_initializer(Initializer::Zeros)
            .init(device);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model = PerformanceNet::<TestBackend>::new(&device, &ModelConfig::default());

        let features = Tensor::random(
            [4, FeatureVector::DIM],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        assert_eq!(model.forward(features.clone()).dims(), [4, 1]);

        let probs = burn::tensor::activation::sigmoid(model.forward(features)).into_data();
        for p in probs.as_slice::<f32>().unwrap() {
            assert!((0.0..=1.0).contains(p), "probability out of range: {}", p);
        }
    }

    #[test]
    fn test_hidden_layout_follows_config() {
        let device = Default::default();
        let config = ModelConfig {
            hidden_dims: vec![8],
        };
        let model = PerformanceNet::<TestBackend>::new(&device, &config);

        // 5*8 + 8 + 8*1 + 1
        assert_eq!(model.num_params(), 57);
    }
}
