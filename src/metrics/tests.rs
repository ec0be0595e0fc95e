use approx::assert_abs_diff_eq;
use ndarray::array;

use crate::metrics::*;

#[test]
fn perfect_fit_statistics() {
    let y = array![1., 2., 3., 4., 5.];
    let stats = RegressionStatistics::compute(y.view(), y.view(), 1);

    assert_abs_diff_eq!(stats.r_squared, 1.0);
    assert_abs_diff_eq!(stats.adjusted_r_squared, 1.0);
    assert_abs_diff_eq!(stats.rmse, 0.0);
    assert_eq!(stats.n_samples, 5);
}

#[test]
fn mean_prediction_has_null_r_squared() {
    let y = array![1., 2., 3., 4., 5.];
    let y_pred = array![3., 3., 3., 3., 3.];
    let stats = RegressionStatistics::compute(y.view(), y_pred.view(), 2);

    assert_abs_diff_eq!(stats.r_squared, 0.0);
    assert_abs_diff_eq!(stats.rmse, 2f64.sqrt(), epsilon = 1e-12);
    // 1 - (1 - 0) * 4 / 2
    assert_abs_diff_eq!(stats.adjusted_r_squared, -1.0, epsilon = 1e-12);
}

#[test]
fn constant_target_and_few_samples() {
    let y = array![2., 2.];
    let off = array![2., 3.];
    let exact = RegressionStatistics::compute(y.view(), y.view(), 3);
    let wrong = RegressionStatistics::compute(y.view(), off.view(), 3);

    assert_eq!(exact.r_squared, 1.0);
    assert_eq!(wrong.r_squared, 0.0);
    assert_eq!(wrong.adjusted_r_squared, wrong.r_squared);
}

#[test]
fn statistics_map_has_base_keys() {
    let y = array![1., 2., 3.];
    let map = RegressionStatistics::compute(y.view(), y.view(), 1).to_map();
    for key in ["r_squared", "adjusted_r_squared", "rmse", "n_samples", "n_features"] {
        assert!(map.contains_key(key), "missing {}", key);
    }
    assert_eq!(map["n_samples"], 3.0);
}

#[test]
fn mse_works() {
    let y = array![1., 2., 3.];
    let y_pred = array![1., 2., 5.];
    assert_abs_diff_eq!(mean_squared_error(&y, &y_pred), 4.0 / 3.0, epsilon = 1e-12);
}
