//! Single neuron with its incoming weights and activation.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Activation function applied to a neuron's weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Logistic curve, range `[0, 1]`.
    Sigmoid,
    /// Hyperbolic tangent, range `[-1, 1]`.
    Tanh,
    /// Pass-through. The `[0, 1]` range is nominal and not enforced.
    Identity,
}

impl Activation {
    /// Applies the activation to `sum`.
    #[inline]
    pub fn apply(self, sum: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-sum).exp()),
            Activation::Tanh => sum.tanh(),
            Activation::Identity => sum,
        }
    }

    /// Lower end of the output range.
    pub fn range_min(self) -> f64 {
        match self {
            Activation::Tanh => -1.0,
            Activation::Sigmoid | Activation::Identity => 0.0,
        }
    }

    /// Upper end of the output range.
    pub fn range_max(self) -> f64 {
        1.0
    }

    /// Midpoint of the output range, subtracted to re-center an output into a
    /// signed control signal.
    pub fn range_correction(self) -> f64 {
        (self.range_max() + self.range_min()) / 2.0
    }
}

/// Probability and magnitude of per-parameter mutation.
///
/// A perturbed parameter moves by a uniform draw from
/// `[-1/(2·rate), 1/(2·rate)]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationParams {
    /// Chance that any single weight or bias is perturbed.
    pub probability: f64,
    /// Divisor for weight perturbations.
    pub weight_rate: f64,
    /// Divisor for bias perturbations.
    pub bias_rate: f64,
}

impl Default for MutationParams {
    fn default() -> Self {
        Self {
            probability: 0.3,
            weight_rate: 20.0,
            bias_rate: 300.0,
        }
    }
}

impl MutationParams {
    /// Draws the delta for one parameter: zero with probability
    /// `1 - probability`, otherwise uniform noise scaled by `rate`.
    fn delta<R: Rng + ?Sized>(&self, rng: &mut R, rate: f64) -> f64 {
        if rng.random::<f64>() < self.probability {
            (rng.random::<f64>() - 0.5) / rate
        } else {
            0.0
        }
    }
}

/// A neuron owned by a [`super::NeuralNet`] layer.
///
/// `source` indexes the network's layer store; input neurons have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    /// One weight per neuron of the source layer.
    pub weights: Array1<f64>,
    /// Bias added to the weighted sum.
    pub bias: f64,
    /// Activation applied to the weighted sum.
    pub activation: Activation,
    /// Value computed by the last forward pass.
    pub value: f64,
    /// Index of the layer this neuron reads from.
    pub source: Option<usize>,
}

impl Neuron {
    /// Creates an input neuron. Its value is set directly by the forward pass.
    pub fn input() -> Self {
        Self {
            weights: Array1::zeros(0),
            bias: 0.0,
            activation: Activation::Identity,
            value: 0.0,
            source: None,
        }
    }

    /// Creates a tanh neuron reading `fan_in` values from layer `source`, with
    /// weights in `[-0.5, 0.5]` and bias in `[-0.05, 0.05]`.
    pub fn new_random<R: Rng + ?Sized>(source: usize, fan_in: usize, rng: &mut R) -> Self {
        Self {
            weights: Array1::from_shape_fn(fan_in, |_| rng.random::<f64>() - 0.5),
            bias: (rng.random::<f64>() - 0.5) * 0.1,
            activation: Activation::Tanh,
            value: 0.0,
            source: Some(source),
        }
    }

    /// Copies this neuron, perturbing each weight and the bias.
    pub fn mutate<R: Rng + ?Sized>(&self, params: &MutationParams, rng: &mut R) -> Self {
        let weights = self
            .weights
            .mapv(|w| w + params.delta(&mut *rng, params.weight_rate));
        let bias = self.bias + params.delta(rng, params.bias_rate);

        Self {
            weights,
            bias,
            activation: self.activation,
            value: 0.0,
            source: self.source,
        }
    }

    /// Creates a neuron whose weights and bias are the means of `neurons`.
    ///
    /// All neurons must share the same fan-in; the activation is taken from
    /// the first. Returns `None` if `neurons` is empty.
    pub fn average(neurons: &[&Neuron]) -> Option<Self> {
        let first = *neurons.first()?;
        let count = neurons.len() as f64;

        let mut weights = Array1::zeros(first.weights.len());
        let mut bias = 0.0;
        for neuron in neurons {
            weights += &neuron.weights;
            bias += neuron.bias;
        }

        Some(Self {
            weights: weights / count,
            bias: bias / count,
            activation: first.activation,
            value: 0.0,
            source: first.source,
        })
    }

    /// Weighted sum of `inputs` plus bias, passed through the activation.
    /// The result is stored in `value` and returned.
    #[inline]
    pub fn calculate(&mut self, inputs: &Array1<f64>) -> f64 {
        self.value = self.activation.apply(self.weights.dot(inputs) + self.bias);
        self.value
    }

    /// Midpoint of this neuron's activation range.
    pub fn range_correction(&self) -> f64 {
        self.activation.range_correction()
    }
}
