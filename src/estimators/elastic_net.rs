use std::collections::BTreeMap;

use ndarray::{Array1, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix1, Ix2};

use super::error::{ModelError, Result};
use super::hyperparams::{ElasticNetParams, ElasticNetValidParams};
use super::summary::ModelSummary;
use super::traits::{Fit, Model};
use super::{check_dataset, check_features, check_overdetermined, ensure_finite, log_fit_failure};
use crate::cd::coordinate_descent;
use crate::datasets::{DatasetBase, DatasetView};
use crate::helpers::helpers::sample_std;
use crate::Float;

/// ElasticNet
///
/// Linear model penalized by a mix of the L1 and L2 norms of its
/// coefficients, fitted by cyclic coordinate descent on centered data.
/// `alpha = 1` gives a lasso and sparse solutions, `alpha = 0` a ridge.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticNet<F> {
    params: ElasticNetValidParams<F>,
    fitted: Option<FittedElasticNet<F>>,
}

#[derive(Debug, Clone, PartialEq)]
struct FittedElasticNet<F> {
    intercept: F,
    coefficients: Array1<F>,
    n_iter: usize,
    summary: ModelSummary<F>,
}

impl<F: Float> Default for ElasticNet<F> {
    fn default() -> Self {
        Self::new(ElasticNetValidParams::default())
    }
}

impl<F: Float> ElasticNet<F> {
    /// Creates an unfitted model from checked hyperparameters
    pub fn new(params: ElasticNetValidParams<F>) -> Self {
        ElasticNet {
            params,
            fitted: None,
        }
    }

    /// Creates an instance of the ElasticNet hyperparameters with default values
    pub fn params() -> ElasticNetParams<F> {
        ElasticNetParams::new()
    }

    pub fn hyperparameters(&self) -> &ElasticNetValidParams<F> {
        &self.params
    }

    pub fn intercept(&self) -> Result<F> {
        Ok(self.state()?.intercept)
    }

    pub fn coefficients(&self) -> Result<ArrayView1<F>> {
        Ok(self.state()?.coefficients.view())
    }

    /// Number of coordinate descent sweeps run by the last fit.
    pub fn n_iter(&self) -> Result<usize> {
        Ok(self.state()?.n_iter)
    }

    fn state(&self) -> Result<&FittedElasticNet<F>> {
        self.fitted.as_ref().ok_or(ModelError::NotFitted)
    }

    fn train(&self, dataset: &DatasetView<'_, F>) -> Result<FittedElasticNet<F>> {
        check_dataset(dataset)?;
        check_overdetermined(dataset)?;

        let x = dataset.design_matrix();
        let alpha = self.params.alpha();
        let lambda = self.params.lambda();

        let res = coordinate_descent(
            x.view(),
            dataset.targets().view(),
            lambda * alpha,
            lambda * (F::one() - alpha),
            self.params.max_iterations(),
            self.params.tolerance(),
        )?;
        ensure_finite(&res.coefficients)?;
        if !res.intercept.is_finite() {
            return Err(ModelError::NonFiniteResult);
        }

        let fitted = x.dot(&res.coefficients) + res.intercept;
        let raw_importances = Array1::from_iter(
            x.axis_iter(Axis(1))
                .zip(res.coefficients.iter())
                .map(|(col, &c)| c.abs() * sample_std(col)),
        );

        Ok(FittedElasticNet {
            summary: ModelSummary::new(dataset, fitted.view(), raw_importances.view()),
            intercept: res.intercept,
            coefficients: res.coefficients,
            n_iter: res.n_iter,
        })
    }
}

impl<F: Float> Model<F> for ElasticNet<F> {
    fn name(&self) -> &'static str {
        "ElasticNet"
    }

    fn description(&self) -> String {
        format!(
            "ElasticNet Regression with L1 and L2 regularization (alpha={}, lambda={}).",
            self.params.alpha(),
            self.params.lambda()
        )
    }

    fn fit(&mut self, dataset: &DatasetView<'_, F>) -> Result<()> {
        log::info!(
            "fitting {} on {} samples with {} features",
            self.name(),
            dataset.n_samples(),
            dataset.n_features()
        );
        let fitted = log_fit_failure(self.name(), self.train(dataset))?;
        log::info!(
            "{} fitted in {} sweeps, r_squared = {}",
            self.name(),
            fitted.n_iter,
            fitted.summary.statistics.r_squared
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Result<Array1<F>> {
        let state = self.state()?;
        check_features(state.coefficients.len(), &x)?;
        Ok(x.dot(&state.coefficients) + state.intercept)
    }

    fn parameters(&self) -> Result<BTreeMap<String, F>> {
        let state = self.state()?;
        let mut params = state.summary.named(state.coefficients.view());
        params.insert("intercept".to_string(), state.intercept);
        params.insert("alpha".to_string(), self.params.alpha());
        params.insert("lambda".to_string(), self.params.lambda());
        params.insert("max_iter".to_string(), F::cast(self.params.max_iterations()));
        params.insert("tol".to_string(), self.params.tolerance());
        Ok(params)
    }

    fn statistics(&self) -> Result<BTreeMap<String, F>> {
        let state = self.state()?;
        let mut stats = state.summary.statistics_map();
        let non_zero = state.coefficients.iter().filter(|&&c| c != F::zero()).count();
        stats.insert("non_zero_coefficients".to_string(), F::cast(non_zero));
        stats.insert("n_iter".to_string(), F::cast(state.n_iter));
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
        self.fitted.as_ref().map(|state| state.coefficients.len())
    }
}

impl<F: Float, D: Data<Elem = F>, S: Data<Elem = F>>
    Fit<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>, ModelError> for ElasticNetValidParams<F>
{
    type Object = ElasticNet<F>;

    /// Fits an ElasticNet model to a dense design matrix
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>>) -> Result<Self::Object> {
        let mut model = ElasticNet::new(self.clone());
        Model::fit(&mut model, &dataset.view())?;
        Ok(model)
    }
}
