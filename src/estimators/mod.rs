use ndarray::{ArrayBase, ArrayView2, Data, Ix1};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::datasets::DatasetView;
use crate::Float;
use error::{ModelError, Result};

#[cfg(test)]
mod tests;

pub mod elastic_net;
pub mod error;
pub mod gradient_boosting;
pub mod hyperparams;
pub mod linear_regression;
pub mod neural_network;
pub mod param_guard;
pub mod random_forest;
pub mod summary;
pub mod traits;
pub mod xgboost;

pub use elastic_net::ElasticNet;
pub use gradient_boosting::GradientBoosting;
pub use linear_regression::LinearRegression;
pub use neural_network::NeuralNetwork;
pub use random_forest::RandomForest;
pub use xgboost::XGBoost;

/// Validates the shape of a training set: aligned rows, at least one sample
/// and one feature.
pub(crate) fn check_dataset<F: Float>(dataset: &DatasetView<'_, F>) -> Result<()> {
    let n_samples = dataset.n_samples();
    let n_targets = dataset.targets().len();
    if n_samples != n_targets {
        return Err(ModelError::SampleMismatch {
            n_samples,
            n_targets,
        });
    }
    if n_samples == 0 || dataset.n_features() == 0 {
        return Err(ModelError::EmptyDataset);
    }
    Ok(())
}

/// Closed-form linear models need strictly more samples than features.
pub(crate) fn check_overdetermined<F: Float>(dataset: &DatasetView<'_, F>) -> Result<()> {
    let (n_samples, n_features) = (dataset.n_samples(), dataset.n_features());
    if n_samples <= n_features {
        return Err(ModelError::NotEnoughSamples {
            n_samples,
            n_features,
        });
    }
    Ok(())
}

/// Validates the column count of a prediction input.
pub(crate) fn check_features<F: Float>(expected: usize, x: &ArrayView2<F>) -> Result<()> {
    if x.ncols() != expected {
        return Err(ModelError::FeatureMismatch {
            expected,
            found: x.ncols(),
        });
    }
    Ok(())
}

pub(crate) fn ensure_finite<F: Float, S: Data<Elem = F>>(values: &ArrayBase<S, Ix1>) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::NonFiniteResult)
    }
}

/// Logs a failed fit before handing the outcome back to the caller.
pub(crate) fn log_fit_failure<T>(model: &str, outcome: Result<T>) -> Result<T> {
    if let Err(err) = &outcome {
        log::warn!("Error fitting {} model: {}", model, err);
    }
    outcome
}

/// Private generator of a model, seeded when a seed is configured.
pub(crate) fn new_rng(random_state: Option<u64>) -> StdRng {
    match random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
