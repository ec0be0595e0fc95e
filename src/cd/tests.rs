use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2, Axis};

use crate::cd::*;
use crate::helpers::helpers::solve_lin_sys;
use crate::helpers::test_helpers::*;

#[test]
fn test_center_columns() {
    let X = array![[1., 10.], [2., 20.], [3., 60.]];
    let (X_c, means) = center_columns(X.view());

    assert_array_all_close(means.view(), array![2., 30.].view(), 1e-12);
    assert_array_all_close(X_c.sum_axis(Axis(0)).view(), array![0., 0.].view(), 1e-12);
}

#[test]
fn test_unpenalized_descent_matches_least_squares() {
    let (X, y) = generate_random_data(50, 5);
    let res = coordinate_descent(X.view(), y.view(), 0., 0., 10_000, 1e-12).unwrap();

    let (X_c, _) = center_columns(X.view());
    let y_c = &y - y.mean().unwrap();
    let gram = X_c.t().dot(&X_c);
    let xty = X_c.t().dot(&y_c);
    let w_ols = solve_lin_sys(gram.view(), xty.view()).unwrap();

    assert_array_all_close(res.coefficients.view(), w_ols.view(), 1e-6);
    let fitted = X.dot(&res.coefficients) + res.intercept;
    assert_abs_diff_eq!(fitted.mean().unwrap(), y.mean().unwrap(), epsilon = 1e-9);
}

#[test]
fn test_large_l1_yields_null_weights() {
    let (X, y) = generate_random_data(30, 4);
    let (X_c, _) = center_columns(X.view());
    let y_c = &y - y.mean().unwrap();
    let l1_max = X_c
        .t()
        .dot(&y_c)
        .iter()
        .fold(0f64, |acc, v| acc.max(v.abs()));

    let res = coordinate_descent(X.view(), y.view(), l1_max * 1.01, 0., 100, 1e-8).unwrap();

    assert_array_all_close(res.coefficients.view(), Array1::zeros(4).view(), 1e-15);
    assert_eq!(res.n_iter, 1);
    assert_abs_diff_eq!(res.intercept, y.mean().unwrap(), epsilon = 1e-12);
}

#[test]
fn test_constant_column_is_ignored() {
    let X = array![[1., 5.], [2., 5.], [3., 5.], [4., 5.]];
    let y = array![2., 4., 6., 8.];
    let res = coordinate_descent(X.view(), y.view(), 0., 0., 100, 1e-10).unwrap();

    assert_eq!(res.coefficients[1], 0.);
    assert_abs_diff_eq!(res.coefficients[0], 2., epsilon = 1e-10);
    assert_abs_diff_eq!(res.intercept, 0., epsilon = 1e-10);
}

#[test]
fn test_ridge_shrinks_without_sparsifying() {
    let X: Array2<f64> = array![[1., 0.], [0., 1.], [1., 1.], [2., 1.], [0., 2.]];
    let y = array![1., -1., 0., 1., -2.];
    let ols = coordinate_descent(X.view(), y.view(), 0., 0., 10_000, 1e-12).unwrap();
    let ridge = coordinate_descent(X.view(), y.view(), 0., 1., 10_000, 1e-12).unwrap();

    for j in 0..2 {
        assert!(ridge.coefficients[j] != 0.);
        assert!(ridge.coefficients[j].abs() < ols.coefficients[j].abs());
    }
}
