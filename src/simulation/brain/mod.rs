//! Feed-forward neural network used as a racecar's steering controller.
//!
//! Networks are evolved, never trained: a network is created at random,
//! derived from one progenitor by mutation, or derived from several
//! progenitors by averaging. Topology is fixed at construction.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{Result, SimulationError};

pub mod neuron;

pub use neuron::{Activation, MutationParams, Neuron};

/// An ordered group of neurons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Neurons in this layer.
    pub neurons: Vec<Neuron>,
}

impl Layer {
    /// Number of neurons in the layer.
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    /// Whether the layer has no neurons.
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    fn values(&self) -> Array1<f64> {
        self.neurons.iter().map(|n| n.value).collect()
    }
}

/// Layered feed-forward network.
///
/// Layer 0 is the input layer, the last layer is the output layer and
/// everything in between is hidden. Each neuron stores the index of the layer
/// it reads from, so the network owns all of its layers outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralNet {
    layers: Vec<Layer>,
}

impl NeuralNet {
    /// Creates a network with random weights.
    ///
    /// Every hidden layer is as wide as the layer before it, so all hidden
    /// layers have `inputs` neurons. Output neurons use tanh with a zero bias.
    pub fn new_random<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        hidden: usize,
        rng: &mut R,
    ) -> Self {
        let mut layers = Vec::with_capacity(hidden + 2);
        layers.push(Layer {
            neurons: (0..inputs).map(|_| Neuron::input()).collect(),
        });

        for source in 0..hidden {
            let fan_in = layers[source].len();
            layers.push(Layer {
                neurons: (0..fan_in)
                    .map(|_| Neuron::new_random(source, fan_in, &mut *rng))
                    .collect(),
            });
        }

        let source = layers.len() - 1;
        let fan_in = layers[source].len();
        layers.push(Layer {
            neurons: (0..outputs)
                .map(|_| Neuron {
                    bias: 0.0,
                    ..Neuron::new_random(source, fan_in, &mut *rng)
                })
                .collect(),
        });

        Self { layers }
    }

    /// Derives a network from `self` with the same topology, perturbing each
    /// weight and bias independently.
    pub fn mutate<R: Rng + ?Sized>(&self, params: &MutationParams, rng: &mut R) -> Self {
        let layers = self
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                if index == 0 {
                    return Layer {
                        neurons: layer.neurons.iter().map(|_| Neuron::input()).collect(),
                    };
                }
                Layer {
                    neurons: layer
                        .neurons
                        .iter()
                        .map(|n| n.mutate(params, &mut *rng))
                        .collect(),
                }
            })
            .collect();

        Self { layers }
    }

    /// Derives a network whose every weight and bias is the mean of the
    /// corresponding values in `progenitors`.
    ///
    /// The progenitors must share one topology; this is not checked. Returns
    /// `None` if `progenitors` is empty.
    pub fn average(progenitors: &[&NeuralNet]) -> Option<Self> {
        let first = progenitors.first()?;

        let layers = first
            .layers
            .iter()
            .enumerate()
            .map(|(l, layer)| {
                if l == 0 {
                    return Some(Layer {
                        neurons: layer.neurons.iter().map(|_| Neuron::input()).collect(),
                    });
                }
                let neurons = (0..layer.len())
                    .map(|i| {
                        let group: Vec<&Neuron> = progenitors
                            .iter()
                            .map(|net| &net.layers[l].neurons[i])
                            .collect();
                        Neuron::average(&group)
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(Layer { neurons })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self { layers })
    }

    /// Runs a forward pass and returns the output layer's values.
    pub fn update(&mut self, inputs: &[f64]) -> Result<Array1<f64>> {
        let expected = self.layers[0].len();
        if inputs.len() != expected {
            return Err(SimulationError::InputSize {
                expected,
                actual: inputs.len(),
            });
        }

        for (neuron, &input) in self.layers[0].neurons.iter_mut().zip(inputs) {
            neuron.value = input;
        }

        for l in 1..self.layers.len() {
            let (done, rest) = self.layers.split_at_mut(l);
            let layer = &mut rest[0];
            let source = layer
                .neurons
                .first()
                .and_then(|n| n.source)
                .unwrap_or(l - 1);
            let values = done[source].values();
            for neuron in &mut layer.neurons {
                neuron.calculate(&values);
            }
        }

        Ok(self.outputs().values())
    }

    /// The input layer.
    pub fn inputs(&self) -> &Layer {
        &self.layers[0]
    }

    /// The output layer.
    pub fn outputs(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Hidden layers in topological order.
    pub fn hidden(&self) -> &[Layer] {
        &self.layers[1..self.layers.len() - 1]
    }

    /// Total number of layers including input and output.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer by index: 0 is the input layer, `layer_count() - 1` the output.
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Mutable access to a single neuron's parameters.
    pub fn neuron_mut(&mut self, layer: usize, index: usize) -> Option<&mut Neuron> {
        self.layers.get_mut(layer)?.neurons.get_mut(index)
    }

    /// For every non-input layer, a matrix whose `(i, j)` entry is neuron
    /// `i`'s weight on source neuron `j` times that source's last value.
    pub fn connection_products(&self) -> Vec<Array2<f64>> {
        self.layers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(l, layer)| {
                let fan_in = layer.neurons.first().map_or(0, |n| n.weights.len());
                Array2::from_shape_fn((layer.len(), fan_in), |(i, j)| {
                    let neuron = &layer.neurons[i];
                    let source = &self.layers[neuron.source.unwrap_or(l - 1)];
                    neuron.weights[j] * source.neurons[j].value
                })
            })
            .collect()
    }

    /// Flattens all weights and biases, layer by layer, neuron by neuron.
    pub fn to_flat_vector(&self) -> Vec<f64> {
        let mut flat = Vec::new();
        for layer in self.layers.iter().skip(1) {
            for neuron in &layer.neurons {
                flat.extend(neuron.weights.iter().copied());
                flat.push(neuron.bias);
            }
        }
        flat
    }

    /// Whether `other` has the same layer and neuron counts.
    pub fn same_topology(&self, other: &NeuralNet) -> bool {
        self.layers.len() == other.layers.len()
            && self
                .layers
                .iter()
                .zip(&other.layers)
                .all(|(a, b)| a.len() == b.len())
    }
}
