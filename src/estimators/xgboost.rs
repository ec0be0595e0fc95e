use std::collections::BTreeMap;

use ndarray::{Array1, ArrayBase, ArrayView2, Data, Ix1, Ix2};
use rand::rngs::StdRng;
use rand::seq::index;

use super::error::{ModelError, Result};
use super::hyperparams::{XGBoostParams, XGBoostValidParams};
use super::summary::ModelSummary;
use super::traits::{Fit, Model};
use super::{check_dataset, check_features, ensure_finite, log_fit_failure, new_rng};
use crate::datasets::{DatasetBase, DatasetView};
use crate::metrics::mean_squared_error;
use crate::tree::{total_importances, EnsembleMember, NewtonLimits, NewtonTreeBuilder};
use crate::Float;

/// Number of items kept out of `n` for a sampling `ratio` in (0, 1].
fn sample_size<F: Float>(n: usize, ratio: F) -> usize {
    (F::cast(n) * ratio)
        .floor()
        .to_usize()
        .unwrap_or(n)
        .clamp(1, n.max(1))
}

/// XGBoost-style gradient boosting
///
/// Second order boosting on the squared error: every round grows a Newton
/// tree on the gradients `F - y` and unit hessians, restricted to a row
/// subsample and to a column subsample drawn once per tree. Splits must gain
/// more than `gamma` and keep a hessian sum of at least `min_child_weight` on
/// both sides.
#[derive(Debug, Clone)]
pub struct XGBoost<F> {
    params: XGBoostValidParams<F>,
    rng: StdRng,
    fitted: Option<FittedXGBoost<F>>,
}

#[derive(Debug, Clone)]
struct FittedXGBoost<F> {
    base_score: F,
    members: Vec<EnsembleMember<F>>,
    n_features: usize,
    summary: ModelSummary<F>,
}

impl<F: Float> Default for XGBoost<F> {
    fn default() -> Self {
        Self::new(XGBoostValidParams::default())
    }
}

impl<F: Float> XGBoost<F> {
    pub fn new(params: XGBoostValidParams<F>) -> Self {
        XGBoost {
            rng: new_rng(params.random_state()),
            params,
            fitted: None,
        }
    }

    pub fn params() -> XGBoostParams<F> {
        XGBoostParams::new()
    }

    pub fn hyperparameters(&self) -> &XGBoostValidParams<F> {
        &self.params
    }

    pub fn base_score(&self) -> Result<F> {
        Ok(self.state()?.base_score)
    }

    pub fn members(&self) -> Result<&[EnsembleMember<F>]> {
        Ok(&self.state()?.members)
    }

    fn state(&self) -> Result<&FittedXGBoost<F>> {
        self.fitted.as_ref().ok_or(ModelError::NotFitted)
    }

    fn ensemble_predict(&self, state: &FittedXGBoost<F>, x: ArrayView2<F>) -> Array1<F> {
        let lr = self.params.learning_rate();
        let mut out = Array1::from_elem(x.nrows(), state.base_score);
        for member in &state.members {
            out.scaled_add(lr, &member.tree.predict(x));
        }
        out
    }

    fn draw(&mut self, n: usize, ratio: F) -> Vec<usize> {
        let size = sample_size(n, ratio);
        if size < n {
            let mut picked = index::sample(&mut self.rng, n, size).into_vec();
            picked.sort_unstable();
            picked
        } else {
            (0..n).collect()
        }
    }

    fn train(&mut self, dataset: &DatasetView<'_, F>) -> Result<FittedXGBoost<F>> {
        check_dataset(dataset)?;

        let x = dataset.design_matrix().view();
        let y = dataset.targets().view();
        let (n_samples, n_features) = x.dim();
        let lr = self.params.learning_rate();
        let limits = NewtonLimits {
            max_depth: self.params.max_depth(),
            min_child_weight: self.params.min_child_weight(),
            gamma: self.params.gamma(),
        };
        let hessians = Array1::<F>::ones(n_samples);

        let base_score = y.sum() / F::cast(n_samples);
        let mut current = Array1::from_elem(n_samples, base_score);
        let mut members = Vec::with_capacity(self.params.n_estimators());

        for round in 0..self.params.n_estimators() {
            let gradients = &current - &y;
            let samples = self.draw(n_samples, self.params.subsample());
            let features = self.draw(n_features, self.params.colsample_bytree());

            let member = NewtonTreeBuilder::new(
                x,
                gradients.view(),
                hessians.view(),
                features,
                limits,
                self.params.importance_type(),
            )
            .build(samples);
            current.scaled_add(lr, &member.tree.predict(x));
            ensure_finite(&current)?;
            log::debug!(
                "round {} :: {} leaves, training mse {}",
                round + 1,
                member.tree.n_leaves(),
                mean_squared_error(&y, &current)
            );
            members.push(member);
        }

        let raw_importances = total_importances(&members, n_features);
        Ok(FittedXGBoost {
            summary: ModelSummary::new(dataset, current.view(), raw_importances.view()),
            base_score,
            members,
            n_features,
        })
    }
}

impl<F: Float> Model<F> for XGBoost<F> {
    fn name(&self) -> &'static str {
        "XGBoost"
    }

    fn description(&self) -> String {
        "XGBoost Gradient Boosting Trees for regression.".to_string()
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
            "{} fitted with {} trees, rmse = {}",
            self.name(),
            fitted.members.len(),
            fitted.summary.statistics.rmse
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
        self.state()?;
        let mut params = BTreeMap::new();
        params.insert("learning_rate".to_string(), self.params.learning_rate());
        params.insert("max_depth".to_string(), F::cast(self.params.max_depth()));
        params.insert("n_estimators".to_string(), F::cast(self.params.n_estimators()));
        params.insert("subsample".to_string(), self.params.subsample());
        params.insert("colsample_bytree".to_string(), self.params.colsample_bytree());
        params.insert("min_child_weight".to_string(), self.params.min_child_weight());
        params.insert("gamma".to_string(), self.params.gamma());
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
    Fit<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>, ModelError> for XGBoostValidParams<F>
{
    type Object = XGBoost<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>>) -> Result<Self::Object> {
        let mut model = XGBoost::new(self.clone());
        Model::fit(&mut model, &dataset.view())?;
        Ok(model)
    }
}
