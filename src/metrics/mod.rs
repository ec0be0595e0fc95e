use std::collections::BTreeMap;

use ndarray::{ArrayBase, ArrayView1, Data, Ix1};

use crate::Float;

#[cfg(test)]
mod tests;

/// Mean squared error between two aligned vectors.
pub fn mean_squared_error<F, S1, S2>(y_true: &ArrayBase<S1, Ix1>, y_pred: &ArrayBase<S2, Ix1>) -> F
where
    F: Float,
    S1: Data<Elem = F>,
    S2: Data<Elem = F>,
{
    let n = y_true.len();
    if n == 0 {
        return F::zero();
    }
    let sse = y_true
        .iter()
        .zip(y_pred.iter())
        .fold(F::zero(), |acc, (&t, &p)| acc + (t - p) * (t - p));
    sse / F::cast(n)
}

/// Goodness-of-fit statistics of a regression model on its training data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionStatistics<F> {
    pub r_squared: F,
    pub adjusted_r_squared: F,
    pub rmse: F,
    pub n_samples: usize,
    pub n_features: usize,
}

impl<F: Float> RegressionStatistics<F> {
    /// Computes the statistics from the observed and the fitted values.
    ///
    /// `r_squared` is `1 - SSE / SST`. A constant response yields `1` for a
    /// perfect fit and `0` otherwise. The adjusted coefficient falls back to
    /// `r_squared` when there are not enough degrees of freedom.
    pub fn compute(y_true: ArrayView1<F>, y_pred: ArrayView1<F>, n_features: usize) -> Self {
        let n_samples = y_true.len();
        let mean = if n_samples > 0 {
            y_true.sum() / F::cast(n_samples)
        } else {
            F::zero()
        };
        let sst = y_true.fold(F::zero(), |acc, &t| acc + (t - mean) * (t - mean));
        let sse = y_true
            .iter()
            .zip(y_pred.iter())
            .fold(F::zero(), |acc, (&t, &p)| acc + (t - p) * (t - p));

        let r_squared = if sst > F::zero() {
            F::one() - sse / sst
        } else if sse == F::zero() {
            F::one()
        } else {
            F::zero()
        };

        let adjusted_r_squared = if n_samples > n_features + 1 {
            F::one()
                - (F::one() - r_squared) * F::cast(n_samples - 1)
                    / F::cast(n_samples - n_features - 1)
        } else {
            r_squared
        };

        let rmse = if n_samples > 0 {
            (sse / F::cast(n_samples)).sqrt()
        } else {
            F::zero()
        };

        RegressionStatistics {
            r_squared,
            adjusted_r_squared,
            rmse,
            n_samples,
            n_features,
        }
    }

    /// Named view of the statistics, as consumed by presentation layers.
    pub fn to_map(&self) -> BTreeMap<String, F> {
        let mut stats = BTreeMap::new();
        stats.insert("r_squared".to_string(), self.r_squared);
        stats.insert("adjusted_r_squared".to_string(), self.adjusted_r_squared);
        stats.insert("rmse".to_string(), self.rmse);
        stats.insert("n_samples".to_string(), F::cast(self.n_samples));
        stats.insert("n_features".to_string(), F::cast(self.n_features));
        stats
    }
}
