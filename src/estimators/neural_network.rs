use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix1, Ix2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::error::{ModelError, Result};
use super::hyperparams::{Activation, NeuralNetworkParams, NeuralNetworkValidParams, Solver};
use super::summary::ModelSummary;
use super::traits::{Fit, Model};
use super::{check_dataset, check_features, ensure_finite, log_fit_failure, new_rng};
use crate::datasets::{DatasetBase, DatasetView};
use crate::helpers::helpers::sample_std;
use crate::metrics::mean_squared_error;
use crate::nn::{Mlp, Optimizer};
use crate::Float;

/// Deviations below this are replaced by one when standardizing.
const MIN_STD: f64 = 1e-10;
/// SGD learning rate decay applied every `SGD_DECAY_EPOCHS` epochs.
const SGD_DECAY: f64 = 0.9;
const SGD_DECAY_EPOCHS: usize = 20;

/// Column and target standardization learned on the training data.
#[derive(Debug, Clone, PartialEq)]
struct Standardizer<F> {
    means: Array1<F>,
    stds: Array1<F>,
    target_mean: F,
    target_std: F,
}

fn mean_and_std<F: Float>(values: ArrayView1<F>) -> (F, F) {
    let mean = values.sum() / F::cast(values.len().max(1));
    let std = sample_std(values);
    if std < F::cast(MIN_STD) {
        (mean, F::one())
    } else {
        (mean, std)
    }
}

impl<F: Float> Standardizer<F> {
    fn fit(x: ArrayView2<F>, y: ArrayView1<F>) -> Self {
        let (means, stds): (Vec<F>, Vec<F>) = x.axis_iter(Axis(1)).map(mean_and_std).unzip();
        let (target_mean, target_std) = mean_and_std(y);
        Standardizer {
            means: Array1::from(means),
            stds: Array1::from(stds),
            target_mean,
            target_std,
        }
    }

    fn transform(&self, x: ArrayView2<F>) -> Array2<F> {
        (&x - &self.means) / &self.stds
    }

    fn transform_target(&self, y: ArrayView1<F>) -> Array1<F> {
        y.mapv(|v| (v - self.target_mean) / self.target_std)
    }

    fn inverse_target(&self, y: Array1<F>) -> Array1<F> {
        y.mapv(|v| v * self.target_std + self.target_mean)
    }
}

fn activation_label(activation: Activation) -> &'static str {
    match activation {
        Activation::Relu => "ReLU",
        Activation::Tanh => "Tanh",
        Activation::Sigmoid => "Sigmoid",
        Activation::Identity => "Linear",
    }
}

/// Neural Network
///
/// Multilayer perceptron regressor with one identity output unit, trained on
/// standardized features and target by mini-batch SGD or Adam on the mean
/// squared error plus an L2 penalty.
#[derive(Debug, Clone)]
pub struct NeuralNetwork<F> {
    params: NeuralNetworkValidParams<F>,
    rng: StdRng,
    fitted: Option<FittedNetwork<F>>,
}

#[derive(Debug, Clone)]
struct FittedNetwork<F> {
    network: Mlp<F>,
    scaler: Standardizer<F>,
    n_iter: usize,
    final_loss: F,
    summary: ModelSummary<F>,
}

impl<F: Float> Default for NeuralNetwork<F> {
    fn default() -> Self {
        Self::new(NeuralNetworkValidParams::default())
    }
}

impl<F: Float> NeuralNetwork<F> {
    pub fn new(params: NeuralNetworkValidParams<F>) -> Self {
        NeuralNetwork {
            rng: new_rng(params.random_state()),
            params,
            fitted: None,
        }
    }

    pub fn params() -> NeuralNetworkParams<F> {
        NeuralNetworkParams::new()
    }

    pub fn hyperparameters(&self) -> &NeuralNetworkValidParams<F> {
        &self.params
    }

    /// The trained network, working on standardized values.
    pub fn network(&self) -> Result<&Mlp<F>> {
        Ok(&self.state()?.network)
    }

    /// Activations of the hidden layers and of the output layer.
    pub fn activations(&self) -> Result<(Activation, Activation)> {
        self.state()?;
        Ok((self.params.activation(), Activation::Identity))
    }

    /// Epochs run by the last fit.
    pub fn n_iter(&self) -> Result<usize> {
        Ok(self.state()?.n_iter)
    }

    /// Mean squared error of the last epoch, on the standardized target.
    pub fn final_loss(&self) -> Result<F> {
        Ok(self.state()?.final_loss)
    }

    fn state(&self) -> Result<&FittedNetwork<F>> {
        self.fitted.as_ref().ok_or(ModelError::NotFitted)
    }

    fn optimizer(&self, network: &Mlp<F>) -> Optimizer<F> {
        match self.params.solver() {
            Solver::Adam => Optimizer::adam(self.params.learning_rate(), network.layers()),
            Solver::Sgd => Optimizer::sgd(self.params.learning_rate()),
        }
    }

    /// Runs the epochs and returns the number run with the last epoch loss.
    fn run_epochs(
        &mut self,
        network: &mut Mlp<F>,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
    ) -> Result<(usize, F)> {
        let n_samples = x.nrows();
        let alpha = self.params.alpha();
        let tolerance = self.params.tolerance();
        let mut optimizer = self.optimizer(network);
        let mut order: Vec<usize> = (0..n_samples).collect();

        let mut best_loss = F::infinity();
        let mut no_improvement = 0;
        let mut n_iter = 0;
        let mut epoch_loss = F::zero();

        for epoch in 0..self.params.max_iterations() {
            order.shuffle(&mut self.rng);

            let mut sse = F::zero();
            for batch in order.chunks(self.params.batch_size()) {
                let x_batch = x.select(Axis(0), batch);
                let y_batch = y.select(Axis(0), batch);

                let output = network.forward(x_batch.view());
                let error = output - &y_batch;
                sse += error.fold(F::zero(), |acc, &e| acc + e * e);

                let gradients = network.backward(error.view(), alpha);
                optimizer.step(network.layers_mut(), &gradients);
            }
            epoch_loss = sse / F::cast(n_samples);
            n_iter = epoch + 1;
            if !epoch_loss.is_finite() {
                return Err(ModelError::NonFiniteResult);
            }
            log::debug!("epoch {} :: loss {}", n_iter, epoch_loss);

            if self.params.solver() == Solver::Sgd && n_iter % SGD_DECAY_EPOCHS == 0 {
                optimizer.decay(F::cast(SGD_DECAY));
            }

            if epoch_loss < best_loss - tolerance {
                best_loss = epoch_loss;
                no_improvement = 0;
            } else {
                no_improvement += 1;
                if no_improvement >= self.params.n_iter_no_change() {
                    log::debug!(
                        "no improvement above {} for {} epochs, stopping at epoch {}",
                        tolerance,
                        no_improvement,
                        n_iter
                    );
                    break;
                }
            }
        }
        Ok((n_iter, epoch_loss))
    }

    /// Increase of the training error when one column is shuffled, clamped
    /// at zero, for every column.
    fn permutation_importances(
        &mut self,
        network: &Mlp<F>,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
    ) -> Array1<F> {
        let baseline = mean_squared_error(&y, &network.predict(x));
        let mut shuffled = x.to_owned();
        let mut raw = Array1::zeros(x.ncols());
        for j in 0..x.ncols() {
            let mut column = x.column(j).to_vec();
            column.shuffle(&mut self.rng);
            shuffled.column_mut(j).assign(&Array1::from(column));

            let permuted = mean_squared_error(&y, &network.predict(shuffled.view()));
            raw[j] = (permuted - baseline).max(F::zero());

            shuffled.column_mut(j).assign(&x.column(j));
        }
        raw
    }

    fn train(&mut self, dataset: &DatasetView<'_, F>) -> Result<FittedNetwork<F>> {
        check_dataset(dataset)?;

        let x = dataset.design_matrix().view();
        let y = dataset.targets().view();
        let scaler = Standardizer::fit(x, y);
        let x_std = scaler.transform(x);
        let y_std = scaler.transform_target(y);

        let mut network = Mlp::new(
            x.ncols(),
            self.params.hidden_layer_sizes(),
            self.params.activation(),
            &mut self.rng,
        );
        let (n_iter, final_loss) = self.run_epochs(&mut network, x_std.view(), y_std.view())?;

        let fitted = scaler.inverse_target(network.predict(x_std.view()));
        ensure_finite(&fitted)?;
        let raw_importances = self.permutation_importances(&network, x_std.view(), y_std.view());

        Ok(FittedNetwork {
            summary: ModelSummary::new(dataset, fitted.view(), raw_importances.view()),
            network,
            scaler,
            n_iter,
            final_loss,
        })
    }
}

impl<F: Float> Model<F> for NeuralNetwork<F> {
    fn name(&self) -> &'static str {
        "Neural Network"
    }

    fn description(&self) -> String {
        let hidden = self
            .params
            .hidden_layer_sizes()
            .iter()
            .enumerate()
            .map(|(i, size)| format!("{} neurons in hidden layer {}", size, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let inputs = self
            .n_features()
            .map(|n| format!("{} input features, ", n))
            .unwrap_or_default();
        format!(
            "Neural Network with {}{} and 1 output neuron (hidden: {}, output: Linear)",
            inputs,
            hidden,
            activation_label(self.params.activation())
        )
    }

    fn fit(&mut self, dataset: &DatasetView<'_, F>) -> Result<()> {
        log::info!(
            "fitting {} on {} samples with {} features",
            self.name(),
            dataset.n_samples(),
            dataset.n_features()
        );
        let outcome = self.train(dataset);
        let fitted = log_fit_failure(self.name(), outcome)?;
        log::info!(
            "{} fitted in {} epochs, final loss = {}",
            self.name(),
            fitted.n_iter,
            fitted.final_loss
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Result<Array1<F>> {
        let state = self.state()?;
        check_features(state.scaler.means.len(), &x)?;
        let x_std = state.scaler.transform(x);
        Ok(state.scaler.inverse_target(state.network.predict(x_std.view())))
    }

    fn parameters(&self) -> Result<BTreeMap<String, F>> {
        let state = self.state()?;
        let mut params = BTreeMap::new();
        params.insert("learning_rate".to_string(), self.params.learning_rate());
        params.insert("alpha".to_string(), self.params.alpha());
        params.insert("max_iter".to_string(), F::cast(self.params.max_iterations()));
        params.insert("epochs".to_string(), F::cast(self.params.max_iterations()));
        params.insert("batch_size".to_string(), F::cast(self.params.batch_size()));
        params.insert("tolerance".to_string(), self.params.tolerance());
        params.insert(
            "n_iter_no_change".to_string(),
            F::cast(self.params.n_iter_no_change()),
        );

        let sizes = state.network.layer_sizes();
        if let Some((&input, rest)) = sizes.split_first() {
            params.insert("input_layer_size".to_string(), F::cast(input));
            if let Some((&output, hidden)) = rest.split_last() {
                for (i, &size) in hidden.iter().enumerate() {
                    params.insert(format!("hidden_layer_{}_size", i + 1), F::cast(size));
                }
                params.insert("output_layer_size".to_string(), F::cast(output));
            }
        }
        params.insert(
            "total_parameters".to_string(),
            F::cast(state.network.total_parameters()),
        );
        Ok(params)
    }

    fn statistics(&self) -> Result<BTreeMap<String, F>> {
        let state = self.state()?;
        let mut stats = state.summary.statistics_map();
        stats.insert("n_iter".to_string(), F::cast(state.n_iter));
        stats.insert("final_loss".to_string(), state.final_loss);
        Ok(stats)
    }

    fn feature_importance(&self) -> Result<BTreeMap<String, F>> {
        Ok(self.state()?.summary.importance_map())
    }

    fn variable_names(&self) -> &[String] {
        self.fitted
            .as_ref()
            .map(|state| state.summary.variable_names.as_slice())
            .unwrap_or(&[])
    }

    fn target_name(&self) -> &str {
        self.fitted
            .as_ref()
            .map_or("", |state| state.summary.target_name.as_str())
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|state| state.scaler.means.len())
    }
}

impl<F: Float, D: Data<Elem = F>, S: Data<Elem = F>>
    Fit<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>, ModelError> for NeuralNetworkValidParams<F>
{
    type Object = NeuralNetwork<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>>) -> Result<Self::Object> {
        let mut model = NeuralNetwork::new(self.clone());
        Model::fit(&mut model, &dataset.view())?;
        Ok(model)
    }
}
