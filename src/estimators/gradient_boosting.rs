use std::collections::BTreeMap;

use ndarray::{Array1, ArrayBase, ArrayView1, ArrayView2, Data, Ix1, Ix2, Zip};
use rand::rngs::StdRng;
use rand::seq::index;

use super::error::{ModelError, Result};
use super::hyperparams::{GradientBoostingParams, GradientBoostingValidParams, Loss};
use super::summary::ModelSummary;
use super::traits::{Fit, Model};
use super::{check_dataset, check_features, ensure_finite, log_fit_failure, new_rng};
use crate::datasets::{DatasetBase, DatasetView};
use crate::metrics::mean_squared_error;
use crate::tree::{total_importances, EnsembleMember, TreeLimits, VarianceTreeBuilder};
use crate::Float;

/// Transition point of the Huber loss.
const HUBER_DELTA: f64 = 1.0;

/// Negative gradient of `loss` with respect to the current predictions.
pub fn pseudo_residuals<F: Float>(
    loss: Loss,
    y: ArrayView1<F>,
    current: ArrayView1<F>,
    quantile_alpha: F,
) -> Array1<F> {
    let delta = F::cast(HUBER_DELTA);
    let sign = |r: F| {
        if r > F::zero() {
            F::one()
        } else if r < F::zero() {
            -F::one()
        } else {
            F::zero()
        }
    };
    Zip::from(&y).and(&current).map_collect(|&t, &p| {
        let r = t - p;
        match loss {
            Loss::SquaredError => r,
            Loss::AbsoluteError => sign(r),
            Loss::Huber => {
                if r.abs() <= delta {
                    r
                } else {
                    delta * sign(r)
                }
            }
            Loss::Quantile => {
                if t > p {
                    quantile_alpha
                } else {
                    quantile_alpha - F::one()
                }
            }
        }
    })
}

fn loss_label(loss: Loss) -> String {
    match loss {
        Loss::AbsoluteError => "absolute error".to_string(),
        Loss::Huber => "Huber".to_string(),
        other => other.to_string(),
    }
}

/// Gradient Boosting
///
/// Additive ensemble of shallow regression trees. Starting from the mean of
/// the targets, each round fits a tree to the pseudo-residuals of the loss
/// and adds it, shrunk by the learning rate, to the running prediction.
#[derive(Debug, Clone)]
pub struct GradientBoosting<F> {
    params: GradientBoostingValidParams<F>,
    rng: StdRng,
    fitted: Option<FittedBoosting<F>>,
}

#[derive(Debug, Clone)]
struct FittedBoosting<F> {
    init: F,
    members: Vec<EnsembleMember<F>>,
    n_features: usize,
    summary: ModelSummary<F>,
}

impl<F: Float> Default for GradientBoosting<F> {
    fn default() -> Self {
        Self::new(GradientBoostingValidParams::default())
    }
}

impl<F: Float> GradientBoosting<F> {
    pub fn new(params: GradientBoostingValidParams<F>) -> Self {
        GradientBoosting {
            rng: new_rng(params.random_state()),
            params,
            fitted: None,
        }
    }

    pub fn params() -> GradientBoostingParams<F> {
        GradientBoostingParams::new()
    }

    pub fn hyperparameters(&self) -> &GradientBoostingValidParams<F> {
        &self.params
    }

    /// Constant the ensemble starts from.
    pub fn initial_prediction(&self) -> Result<F> {
        Ok(self.state()?.init)
    }

    pub fn members(&self) -> Result<&[EnsembleMember<F>]> {
        Ok(&self.state()?.members)
    }

    fn state(&self) -> Result<&FittedBoosting<F>> {
        self.fitted.as_ref().ok_or(ModelError::NotFitted)
    }

    fn ensemble_predict(&self, state: &FittedBoosting<F>, x: ArrayView2<F>) -> Array1<F> {
        let lr = self.params.learning_rate();
        state
            .members
            .iter()
            .fold(Array1::from_elem(x.nrows(), state.init), |mut acc, member| {
                acc.scaled_add(lr, &member.tree.predict(x));
                acc
            })
    }

    fn train(&mut self, dataset: &DatasetView<'_, F>) -> Result<FittedBoosting<F>> {
        check_dataset(dataset)?;

        let x = dataset.design_matrix().view();
        let y = dataset.targets().view();
        let (n_samples, n_features) = x.dim();
        let lr = self.params.learning_rate();
        let limits = TreeLimits {
            max_depth: self.params.max_depth(),
            min_samples_split: self.params.min_samples_split(),
            min_samples_leaf: self.params.min_samples_leaf(),
        };
        let subsample = self.params.subsample();
        let n_subsample = (F::cast(n_samples) * subsample)
            .floor()
            .to_usize()
            .unwrap_or(n_samples)
            .clamp(1, n_samples);

        let init = y.sum() / F::cast(n_samples);
        let mut current = Array1::from_elem(n_samples, init);
        let mut members = Vec::with_capacity(self.params.n_estimators());

        for round in 0..self.params.n_estimators() {
            let residuals = pseudo_residuals(
                self.params.loss(),
                y,
                current.view(),
                self.params.quantile_alpha(),
            );
            let samples = if n_subsample < n_samples {
                index::sample(&mut self.rng, n_samples, n_subsample).into_vec()
            } else {
                (0..n_samples).collect()
            };

            let member = VarianceTreeBuilder::new(x, residuals.view(), limits, n_features, &mut self.rng)
                .build(samples);
            current.scaled_add(lr, &member.tree.predict(x));
            ensure_finite(&current)?;
            log::debug!(
                "round {} :: training mse {}",
                round + 1,
                mean_squared_error(&y, &current)
            );
            members.push(member);
        }

        let raw_importances = total_importances(&members, n_features);
        Ok(FittedBoosting {
            summary: ModelSummary::new(dataset, current.view(), raw_importances.view()),
            init,
            members,
            n_features,
        })
    }
}

impl<F: Float> Model<F> for GradientBoosting<F> {
    fn name(&self) -> &'static str {
        "Gradient Boosting"
    }

    fn description(&self) -> String {
        format!(
            "Gradient Boosting Regression with {} trees and {} loss function.",
            self.params.n_estimators(),
            loss_label(self.params.loss())
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
            "{} fitted with {} trees, r_squared = {}",
            self.name(),
            fitted.members.len(),
            fitted.summary.statistics.r_squared
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Result<Array1<F>> {
        let state = self.state()?;
        check_features(state.n_features, &x)?;
        Ok(self.ensemble_predict(state, x))
    }

    fn parameters(&self) -> Result<BTreeMap<String, F>> {
        let state = self.state()?;
        let mut params = BTreeMap::new();
        params.insert("learning_rate".to_string(), self.params.learning_rate());
        params.insert("n_estimators".to_string(), F::cast(self.params.n_estimators()));
        params.insert("max_depth".to_string(), F::cast(self.params.max_depth()));
        params.insert(
            "min_samples_split".to_string(),
            F::cast(self.params.min_samples_split()),
        );
        params.insert(
            "min_samples_leaf".to_string(),
            F::cast(self.params.min_samples_leaf()),
        );
        params.insert("subsample".to_string(), self.params.subsample());
        if self.params.loss() == Loss::Quantile {
            params.insert("quantile_alpha".to_string(), self.params.quantile_alpha());
        }
        params.insert("initial_prediction".to_string(), state.init);
        Ok(params)
    }

    fn statistics(&self) -> Result<BTreeMap<String, F>> {
        let state = self.state()?;
        let mut stats = state.summary.statistics_map();
        stats.insert("n_trees".to_string(), F::cast(state.members.len()));
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
        self.fitted.as_ref().map(|state| state.n_features)
    }
}

impl<F: Float, D: Data<Elem = F>, S: Data<Elem = F>>
    Fit<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>, ModelError> for GradientBoostingValidParams<F>
{
    type Object = GradientBoosting<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>>) -> Result<Self::Object> {
        let mut model = GradientBoosting::new(self.clone());
        Model::fit(&mut model, &dataset.view())?;
        Ok(model)
    }
}
