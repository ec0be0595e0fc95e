use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_stats::QuantileExt;

use crate::estimators::error::{ModelError, Result};
use crate::helpers::prox::elastic_net_prox;
use crate::Float;

#[cfg(test)]
mod tests;

/// Output of the coordinate descent solver, expressed on the uncentered
/// scale.
#[derive(Debug, Clone, PartialEq)]
pub struct DescentResult<F> {
    pub coefficients: Array1<F>,
    pub intercept: F,
    /// Number of full sweeps that were run.
    pub n_iter: usize,
}

/// Centers the columns of `X` and returns them along with their means.
pub fn center_columns<F: Float>(X: ArrayView2<F>) -> (Array2<F>, Array1<F>) {
    let n_samples = F::cast(X.nrows().max(1));
    let means = X.sum_axis(Axis(0)) / n_samples;
    let centered = &X - &means;
    (centered, means)
}

/// This function carries out one sweep of coordinate descent over every
/// feature. Each coordinate is set to the exact minimizer of the elastic-net
/// objective with the other coordinates held fixed, and the residuals are
/// updated by the coefficient delta. The absolute change of every coordinate
/// is written to `changes`.
pub fn cd_epoch<F: Float>(
    X: ArrayView2<F>,
    norms: ArrayView1<F>,
    w: &mut Array1<F>,
    residuals: &mut Array1<F>,
    changes: &mut Array1<F>,
    l1: F,
    l2: F,
) {
    for j in 0..w.len() {
        let norm_j = norms[j];
        if norm_j == F::zero() {
            changes[j] = F::zero();
            continue;
        }
        let X_j = X.column(j);
        let old_w_j = w[j];
        let rho = X_j.dot(&*residuals) + old_w_j * norm_j;
        w[j] = elastic_net_prox(rho / norm_j, l1 / norm_j, l2 / norm_j);

        let diff = w[j] - old_w_j;
        if diff != F::zero() {
            residuals.scaled_add(-diff, &X_j);
        }
        changes[j] = diff.abs();
    }
}

/// This is the solver behind the ElasticNet estimator. It minimizes
/// ```ignore
/// 1 / 2 * ||y_c - X_c w||^2_2 + l1 * ||w||_1 + l2 / 2 * ||w||^2_2
/// ```
/// where `X_c` and `y_c` are the centered design matrix and targets, by cycling
/// through the features until the largest coefficient change of a sweep drops
/// below `tolerance` or `max_iterations` sweeps have been run. The intercept is
/// recovered from the means afterwards.
///
/// A coordinate is set to zero whenever `|rho| <= l1`, with
/// `rho = X_j^T r + w_j ||X_j||^2`.
pub fn coordinate_descent<F: Float>(
    X: ArrayView2<F>,
    y: ArrayView1<F>,
    l1: F,
    l2: F,
    max_iterations: usize,
    tolerance: F,
) -> Result<DescentResult<F>> {
    let n_features = X.ncols();
    let (X_c, x_means) = center_columns(X);
    let y_mean = y.sum() / F::cast(y.len().max(1));

    // Squared column norms of the centered design matrix.
    let norms = X_c.map_axis(Axis(0), |col| col.dot(&col));

    let mut w = Array1::<F>::zeros(n_features);
    let mut residuals = y.mapv(|v| v - y_mean);
    let mut changes = Array1::<F>::zeros(n_features);
    let mut n_iter = 0;

    for epoch in 0..max_iterations {
        cd_epoch(
            X_c.view(),
            norms.view(),
            &mut w,
            &mut residuals,
            &mut changes,
            l1,
            l2,
        );
        n_iter = epoch + 1;

        let max_change = *changes.max().map_err(|_| ModelError::NonFiniteResult)?;
        log::debug!("sweep: {} :: max change: {}", n_iter, max_change);

        if !max_change.is_finite() {
            return Err(ModelError::NonFiniteResult);
        }
        if max_change < tolerance {
            break;
        }
    }

    let intercept = y_mean - x_means.dot(&w);

    Ok(DescentResult {
        coefficients: w,
        intercept,
        n_iter,
    })
}
