use std::collections::BTreeMap;

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::error::{ModelError, Result};
use super::summary::ModelSummary;
use super::traits::Model;
use super::{check_dataset, check_features, check_overdetermined, ensure_finite, log_fit_failure};
use crate::datasets::DatasetView;
use crate::helpers::helpers::{sample_std, solve_lin_sys};
use crate::Float;

/// Linear Regression
///
/// Ordinary least squares estimated in closed form from the normal equations
/// `(X^T X) theta = X^T y`, where `X` carries a leading column of ones for the
/// intercept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearRegression<F> {
    fitted: Option<FittedLinear<F>>,
}

#[derive(Debug, Clone, PartialEq)]
struct FittedLinear<F> {
    intercept: F,
    coefficients: Array1<F>,
    summary: ModelSummary<F>,
}

impl<F: Float> LinearRegression<F> {
    pub fn new() -> Self {
        LinearRegression { fitted: None }
    }

    pub fn intercept(&self) -> Result<F> {
        Ok(self.state()?.intercept)
    }

    pub fn coefficients(&self) -> Result<ArrayView1<F>> {
        Ok(self.state()?.coefficients.view())
    }

    fn state(&self) -> Result<&FittedLinear<F>> {
        self.fitted.as_ref().ok_or(ModelError::NotFitted)
    }

    fn train(dataset: &DatasetView<'_, F>) -> Result<FittedLinear<F>> {
        check_dataset(dataset)?;
        check_overdetermined(dataset)?;

        let x = dataset.design_matrix();
        let y = dataset.targets();
        let (n_samples, n_features) = x.dim();

        let mut x_aug = Array2::<F>::ones((n_samples, n_features + 1));
        x_aug.slice_mut(s![.., 1..]).assign(x);

        let gram = x_aug.t().dot(&x_aug);
        let xty = x_aug.t().dot(y);
        let theta = solve_lin_sys(gram.view(), xty.view()).map_err(ModelError::SingularMatrix)?;
        ensure_finite(&theta)?;

        let intercept = theta[0];
        let coefficients = theta.slice(s![1..]).to_owned();
        let fitted = x.dot(&coefficients) + intercept;

        let raw_importances = Array1::from_iter(
            x.axis_iter(Axis(1))
                .zip(coefficients.iter())
                .map(|(col, &c)| c.abs() * sample_std(col)),
        );

        Ok(FittedLinear {
            intercept,
            coefficients,
            summary: ModelSummary::new(dataset, fitted.view(), raw_importances.view()),
        })
    }
}

impl<F: Float> Model<F> for LinearRegression<F> {
    fn name(&self) -> &'static str {
        "Linear Regression"
    }

    fn description(&self) -> String {
        "Ordinary Least Squares (OLS) Linear Regression model.".to_string()
    }

    fn fit(&mut self, dataset: &DatasetView<'_, F>) -> Result<()> {
        log::info!(
            "fitting {} on {} samples with {} features",
            self.name(),
            dataset.n_samples(),
            dataset.n_features()
        );
        let fitted = log_fit_failure(self.name(), Self::train(dataset))?;
        log::info!(
            "{} fitted, r_squared = {}",
            self.name(),
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
        Ok(params)
    }

    fn statistics(&self) -> Result<BTreeMap<String, F>> {
        Ok(self.state()?.summary.statistics_map())
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
