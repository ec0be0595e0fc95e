use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView2};

use super::error::Result;
use crate::datasets::{DatasetBase, DatasetView, DesignMatrix, Targets};
use crate::Float;

/// Fit trait
///
/// The fittable trait allows a set of hyperparameters to be fitted to a
/// dataset (a combination of design matrix and targets). The returned object
/// is a fitted model.
pub trait Fit<DM: DesignMatrix, T: Targets, E: std::error::Error> {
    type Object;

    fn fit(&self, dataset: &DatasetBase<DM, T>) -> std::result::Result<Self::Object, E>;
}

/// The contract shared by every regression model.
///
/// A model is constructed unfitted. `fit` trains it in place; a failed `fit`
/// leaves the previous state untouched and a successful one replaces it.
/// Every read accessor returns [`ModelError::NotFitted`](crate::ModelError)
/// until the first successful `fit`.
pub trait Model<F: Float> {
    /// Human readable name of the algorithm.
    fn name(&self) -> &'static str;

    /// One-line description including the main hyperparameters.
    fn description(&self) -> String;

    /// Trains the model. Fit failures are logged and returned, they are
    /// recoverable.
    fn fit(&mut self, dataset: &DatasetView<'_, F>) -> Result<()>;

    /// Predicts one value per row of `x`.
    fn predict(&self, x: ArrayView2<F>) -> Result<Array1<F>>;

    /// Hyperparameters and, where applicable, named coefficients.
    fn parameters(&self) -> Result<BTreeMap<String, F>>;

    /// Goodness-of-fit statistics on the training data.
    fn statistics(&self) -> Result<BTreeMap<String, F>>;

    /// Non-negative importances, one per feature, summing to one.
    fn feature_importance(&self) -> Result<BTreeMap<String, F>>;

    /// Names of the features recorded at fit time.
    fn variable_names(&self) -> &[String];

    /// Name of the target recorded at fit time.
    fn target_name(&self) -> &str;

    fn is_fitted(&self) -> bool;

    /// Number of features seen during fit.
    fn n_features(&self) -> Option<usize>;
}
