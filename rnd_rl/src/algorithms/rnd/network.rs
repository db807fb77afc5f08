//! Target and predictor networks for Random Network Distillation.
//!
//! RND pairs a randomly initialized, frozen target network with a trained
//! predictor of the same input shape. Observations the predictor has not seen
//! often produce large prediction errors, which serve as novelty rewards.
//!
//! The default body is a stack of convolutions (leaky ReLU) followed by fully
//! connected layers (ReLU between them, none after the last). The predictor
//! gets two extra fully connected layers so it has more capacity than the
//! target it imitates.
//!
//! # Usage
//!
//! ```ignore
//! let config = RndConvConfig::new([1, 84, 84]);
//! let target: RndConvBody<B::InnerBackend> = config.init_target(&device);
//! let predictor: RndConvBody<B> = config.init_predictor(&device);
//! ```

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Initializer, LeakyRelu, LeakyReluConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Forward interface of an RND network.
///
/// `embed` maps a normalized observation batch `[N, C, H, W]` to `[N, D]`.
/// Inference runs on the inner backend (`AutodiffModule::valid`), training on
/// the autodiff backend.
pub trait RndNetwork<B: Backend>: Module<B> {
    /// Embed a batch of normalized observations.
    fn embed(&self, obs: Tensor<B, 4>) -> Tensor<B, 2>;

    /// Expected input shape `[C, H, W]`.
    fn input_shape(&self) -> [usize; 3];

    /// Embedding dimension `D`.
    fn output_dim(&self) -> usize;
}

/// Hyperparameters of the convolutional RND bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RndConvConfig {
    /// Network input `[C, H, W]`
    pub input_shape: [usize; 3],
    /// `(kernel, stride)` per convolution
    pub kernels: Vec<(usize, usize)>,
    /// Output channels per convolution
    pub channels: Vec<usize>,
    /// Embedding dimension
    pub output_dim: usize,
    /// Negative slope of the convolution activations
    pub leaky_slope: f64,
}

impl RndConvConfig {
    /// Config with the Atari architecture of the RND paper.
    pub fn new(input_shape: [usize; 3]) -> Self {
        Self {
            input_shape,
            kernels: vec![(8, 4), (4, 2), (3, 1)],
            channels: vec![32, 64, 64],
            output_dim: 512,
            leaky_slope: 0.2,
        }
    }

    /// Set the convolution layers.
    pub fn with_convs(mut self, kernels: Vec<(usize, usize)>, channels: Vec<usize>) -> Self {
        assert_eq!(
            kernels.len(),
            channels.len(),
            "every convolution needs a kernel and a channel count"
        );
        self.kernels = kernels;
        self.channels = channels;
        self
    }

    pub fn with_output_dim(mut self, output_dim: usize) -> Self {
        self.output_dim = output_dim;
        self
    }

    /// Flattened size of the last convolution output.
    ///
    /// # Panics
    /// Panics if a kernel does not fit the feature map it is applied to.
    pub fn hidden_dim(&self) -> usize {
        let [_, mut height, mut width] = self.input_shape;
        for &(kernel, stride) in &self.kernels {
            assert!(
                height >= kernel && width >= kernel,
                "kernel {} does not fit a {}x{} feature map",
                kernel,
                height,
                width
            );
            height = (height - kernel) / stride + 1;
            width = (width - kernel) / stride + 1;
        }
        let last_channels = self.channels.last().copied().unwrap_or(self.input_shape[0]);
        last_channels * height * width
    }

    /// Frozen target: convolutions and a single linear projection.
    pub fn init_target<B: Backend>(&self, device: &B::Device) -> RndConvBody<B> {
        let hidden = self.hidden_dim();
        self.init_body(vec![self.linear(hidden, self.output_dim, device)], device)
    }

    /// Trained predictor: convolutions and three linear layers.
    pub fn init_predictor<B: Backend>(&self, device: &B::Device) -> RndConvBody<B> {
        let hidden = self.hidden_dim();
        let fcs = vec![
            self.linear(hidden, self.output_dim, device),
            self.linear(self.output_dim, self.output_dim, device),
            self.linear(self.output_dim, self.output_dim, device),
        ];
        self.init_body(fcs, device)
    }

    fn init_body<B: Backend>(&self, fcs: Vec<Linear<B>>, device: &B::Device) -> RndConvBody<B> {
        let mut in_channels = self.input_shape[0];
        let mut cnns = Vec::with_capacity(self.kernels.len());
        for (&(kernel, stride), &out_channels) in self.kernels.iter().zip(&self.channels) {
            cnns.push(
                Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
                    .with_stride([stride, stride])
                    .with_initializer(relu_initializer())
                    .init(device),
            );
            in_channels = out_channels;
        }

        let [channels, height, width] = self.input_shape;
        RndConvBody {
            cnns,
            fcs,
            conv_activation: LeakyReluConfig::new()
                .with_negative_slope(self.leaky_slope)
                .init(),
            fc_activation: Relu::new(),
            in_channels: channels,
            in_height: height,
            in_width: width,
            output_dim: self.output_dim,
        }
    }

    fn linear<B: Backend>(&self, d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
        LinearConfig::new(d_in, d_out)
            .with_initializer(relu_initializer())
            .init(device)
    }
}

/// He initialization for ReLU-family activations.
fn relu_initializer() -> Initializer {
    Initializer::KaimingNormal {
        gain: std::f64::consts::SQRT_2,
        fan_out_only: false,
    }
}

/// Convolutional body used for both the RND target and predictor.
#[derive(Module, Debug)]
pub struct RndConvBody<B: Backend> {
    cnns: Vec<Conv2d<B>>,
    fcs: Vec<Linear<B>>,
    conv_activation: LeakyRelu,
    fc_activation: Relu,
    in_channels: usize,
    in_height: usize,
    in_width: usize,
    output_dim: usize,
}

impl<B: Backend> RndNetwork<B> for RndConvBody<B> {
    fn embed(&self, obs: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = obs;
        for cnn in &self.cnns {
            x = self.conv_activation.forward(cnn.forward(x));
        }

        let mut x: Tensor<B, 2> = x.flatten(1, 3);
        let last = self.fcs.len().saturating_sub(1);
        for (i, fc) in self.fcs.iter().enumerate() {
            x = fc.forward(x);
            if i < last {
                x = self.fc_activation.forward(x);
            }
        }
        x
    }

    fn input_shape(&self) -> [usize; 3] {
        [self.in_channels, self.in_height, self.in_width]
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }
}
