//! Building blocks of the multilayer perceptron: dense layers with cached
//! activations, the activation functions and the SGD/Adam update rules.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::estimators::hyperparams::Activation;
use crate::Float;


impl Activation {
    pub fn apply<F: Float>(&self, z: F) -> F {
        match self {
            Activation::Relu => z.max(F::zero()),
            Activation::Tanh => z.tanh(),
            Activation::Sigmoid => F::one() / (F::one() + (-z).exp()),
            Activation::Identity => z,
        }
    }

    /// Derivative expressed in terms of the activated value `a = f(z)`.
    pub fn derivative<F: Float>(&self, a: F) -> F {
        match self {
            Activation::Relu => {
                if a > F::zero() {
                    F::one()
                } else {
                    F::zero()
                }
            }
            Activation::Tanh => F::one() - a * a,
            Activation::Sigmoid => a * (F::one() - a),
            Activation::Identity => F::one(),
        }
    }
}

/// Gradients of the loss with respect to the parameters of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients<F> {
    pub weights: Array2<F>,
    pub biases: Array1<F>,
}

/// Fully connected layer computing `f(x W^T + b)` on a batch of rows.
///
/// The input, output and delta of the last training pass are kept so that
/// the backward pass does not need the activations to be handed back.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<F> {
    weights: Array2<F>,
    biases: Array1<F>,
    activation: Activation,
    input: Array2<F>,
    output: Array2<F>,
    delta: Array2<F>,
}

impl<F: Float> Layer<F> {
    /// Xavier/Glorot initialization: weights drawn from
    /// `N(0, sqrt(2 / (n_inputs + n_outputs)))`, null biases.
    pub fn new<R: Rng>(n_inputs: usize, n_outputs: usize, activation: Activation, rng: &mut R) -> Self {
        let scale = (2.0 / (n_inputs + n_outputs) as f64).sqrt();
        let weights = Array2::from_shape_fn((n_outputs, n_inputs), |_| {
            F::cast(scale * rng.sample::<f64, _>(StandardNormal))
        });
        Layer::from_parameters(weights, Array1::zeros(n_outputs), activation)
    }

    pub fn from_parameters(weights: Array2<F>, biases: Array1<F>, activation: Activation) -> Self {
        Layer {
            weights,
            biases,
            activation,
            input: Array2::zeros((0, 0)),
            output: Array2::zeros((0, 0)),
            delta: Array2::zeros((0, 0)),
        }
    }

    pub fn weights(&self) -> ArrayView2<F> {
        self.weights.view()
    }

    pub fn biases(&self) -> ArrayView1<F> {
        self.biases.view()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Error signal of the last backward pass, one row per sample.
    pub fn delta(&self) -> ArrayView2<F> {
        self.delta.view()
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn n_outputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_parameters(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Forward pass without touching the training buffers.
    pub fn propagate(&self, x: ArrayView2<F>) -> Array2<F> {
        let activation = self.activation;
        let mut z = x.dot(&self.weights.t()) + &self.biases;
        z.mapv_inplace(|v| activation.apply(v));
        z
    }

    /// Forward pass caching the input and the activated output.
    pub fn forward(&mut self, x: ArrayView2<F>) -> ArrayView2<F> {
        self.output = self.propagate(x);
        self.input = x.to_owned();
        self.output.view()
    }

    /// Backward pass from the gradient of the loss with respect to this
    /// layer's output. Returns the averaged parameter gradients, with the L2
    /// term `alpha * W` when `alpha > 0`, and the gradient with respect to
    /// the layer input.
    pub fn backward(&mut self, grad_output: ArrayView2<F>, alpha: F) -> (Gradients<F>, Array2<F>) {
        let activation = self.activation;
        let batch_size = F::cast(grad_output.nrows().max(1));

        let mut delta = grad_output.to_owned();
        Zip::from(&mut delta)
            .and(&self.output)
            .for_each(|d, &a| *d *= activation.derivative(a));

        let mut grad_weights = delta.t().dot(&self.input) / batch_size;
        if alpha > F::zero() {
            grad_weights.scaled_add(alpha, &self.weights);
        }
        let grad_biases = delta.sum_axis(Axis(0)) / batch_size;
        let grad_input = delta.dot(&self.weights);
        self.delta = delta;

        (
            Gradients {
                weights: grad_weights,
                biases: grad_biases,
            },
            grad_input,
        )
    }

    fn apply_update(&mut self, step_weights: &Array2<F>, step_biases: &Array1<F>) {
        self.weights -= step_weights;
        self.biases -= step_biases;
    }
}

/// First and second moment estimates of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AdamMoments<F> {
    m_weights: Array2<F>,
    v_weights: Array2<F>,
    m_biases: Array1<F>,
    v_biases: Array1<F>,
}

impl<F: Float> AdamMoments<F> {
    fn zeros_like(layer: &Layer<F>) -> Self {
        AdamMoments {
            m_weights: Array2::zeros(layer.weights.raw_dim()),
            v_weights: Array2::zeros(layer.weights.raw_dim()),
            m_biases: Array1::zeros(layer.biases.len()),
            v_biases: Array1::zeros(layer.biases.len()),
        }
    }
}

/// Parameter update rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Optimizer<F> {
    Sgd {
        learning_rate: F,
    },
    /// Adam with bias-corrected moment estimates.
    Adam {
        learning_rate: F,
        beta1: F,
        beta2: F,
        epsilon: F,
        t: i32,
        moments: Vec<AdamMoments<F>>,
    },
}

impl<F: Float> Optimizer<F> {
    pub fn sgd(learning_rate: F) -> Self {
        Optimizer::Sgd { learning_rate }
    }

    /// Default: β₁=0.9, β₂=0.999, ε=1e-8
    pub fn adam(learning_rate: F, layers: &[Layer<F>]) -> Self {
        Optimizer::Adam {
            learning_rate,
            beta1: F::cast(0.9),
            beta2: F::cast(0.999),
            epsilon: F::cast(1e-8),
            t: 0,
            moments: layers.iter().map(AdamMoments::zeros_like).collect(),
        }
    }

    pub fn learning_rate(&self) -> F {
        match self {
            Optimizer::Sgd { learning_rate } | Optimizer::Adam { learning_rate, .. } => {
                *learning_rate
            }
        }
    }

    /// Multiplies the learning rate by `factor`.
    pub fn decay(&mut self, factor: F) {
        match self {
            Optimizer::Sgd { learning_rate } | Optimizer::Adam { learning_rate, .. } => {
                *learning_rate *= factor;
            }
        }
    }

    pub fn step(&mut self, layers: &mut [Layer<F>], gradients: &[Gradients<F>]) {
        match self {
            Optimizer::Sgd { learning_rate } => {
                for (layer, grad) in layers.iter_mut().zip(gradients) {
                    let step_w = &grad.weights * *learning_rate;
                    let step_b = &grad.biases * *learning_rate;
                    layer.apply_update(&step_w, &step_b);
                }
            }
            Optimizer::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
                t,
                moments,
            } => {
                *t += 1;
                let (b1, b2, eps, lr) = (*beta1, *beta2, *epsilon, *learning_rate);
                let correction1 = F::one() - b1.powi(*t);
                let correction2 = F::one() - b2.powi(*t);

                for ((layer, grad), state) in layers.iter_mut().zip(gradients).zip(moments.iter_mut()) {
                    update_moments(&mut state.m_weights, &mut state.v_weights, &grad.weights, b1, b2);
                    update_moments(&mut state.m_biases, &mut state.v_biases, &grad.biases, b1, b2);

                    let step_w = Zip::from(&state.m_weights)
                        .and(&state.v_weights)
                        .map_collect(|&m, &v| {
                            lr * (m / correction1) / ((v / correction2).sqrt() + eps)
                        });
                    let step_b = Zip::from(&state.m_biases)
                        .and(&state.v_biases)
                        .map_collect(|&m, &v| {
                            lr * (m / correction1) / ((v / correction2).sqrt() + eps)
                        });
                    layer.apply_update(&step_w, &step_b);
                }
            }
        }
    }
}

fn update_moments<F: Float, D: ndarray::Dimension>(
    m: &mut ndarray::Array<F, D>,
    v: &mut ndarray::Array<F, D>,
    grad: &ndarray::Array<F, D>,
    beta1: F,
    beta2: F,
) {
    Zip::from(m)
        .and(v)
        .and(grad)
        .for_each(|m, v, &g| {
            *m = beta1 * *m + (F::one() - beta1) * g;
            *v = beta2 * *v + (F::one() - beta2) * g * g;
        });
}

/// Multilayer perceptron with a single identity output unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Mlp<F> {
    layers: Vec<Layer<F>>,
}

impl<F: Float> Mlp<F> {
    pub fn new<R: Rng>(
        n_inputs: usize,
        hidden_layer_sizes: &[usize],
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let mut sizes = Vec::with_capacity(hidden_layer_sizes.len() + 2);
        sizes.push(n_inputs);
        sizes.extend_from_slice(hidden_layer_sizes);
        sizes.push(1);

        let n_layers = sizes.len() - 1;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(idx, w)| {
                let layer_activation = if idx + 1 == n_layers {
                    Activation::Identity
                } else {
                    activation
                };
                Layer::new(w[0], w[1], layer_activation, &mut *rng)
            })
            .collect();
        Mlp { layers }
    }

    pub fn from_layers(layers: Vec<Layer<F>>) -> Self {
        Mlp { layers }
    }

    pub fn layers(&self) -> &[Layer<F>] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer<F>] {
        &mut self.layers
    }

    /// Input size followed by the output size of every layer.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers.len() + 1);
        if let Some(first) = self.layers.first() {
            sizes.push(first.n_inputs());
        }
        sizes.extend(self.layers.iter().map(Layer::n_outputs));
        sizes
    }

    pub fn total_parameters(&self) -> usize {
        self.layers.iter().map(Layer::n_parameters).sum()
    }

    pub fn predict(&self, x: ArrayView2<F>) -> Array1<F> {
        let mut current = x.to_owned();
        for layer in &self.layers {
            current = layer.propagate(current.view());
        }
        current.column(0).to_owned()
    }

    /// Training forward pass filling the layer buffers.
    pub fn forward(&mut self, x: ArrayView2<F>) -> Array1<F> {
        let mut current = x.to_owned();
        for layer in self.layers.iter_mut() {
            current = layer.forward(current.view()).to_owned();
        }
        current.column(0).to_owned()
    }

    /// Backpropagates `prediction - target` from the output unit and returns
    /// the gradients of every layer, in layer order.
    pub fn backward(&mut self, output_error: ArrayView1<F>, alpha: F) -> Vec<Gradients<F>> {
        let mut grad = output_error.insert_axis(Axis(1)).to_owned();
        let mut gradients = Vec::with_capacity(self.layers.len());
        for layer in self.layers.iter_mut().rev() {
            let (layer_grad, grad_input) = layer.backward(grad.view(), alpha);
            gradients.push(layer_grad);
            grad = grad_input;
        }
        gradients.reverse();
        gradients
    }
}
