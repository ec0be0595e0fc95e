
/// This module implements the proximal operators used by the coordinate
/// descent solver.
pub mod prox {
    use crate::Float;

    /// The soft-thresholding operator is the proximal operator of the L1 norm.
    pub fn soft_thresholding<F: Float>(x: F, threshold: F) -> F {
        if x > threshold {
            x - threshold
        } else if x < -threshold {
            x + threshold
        } else {
            F::zero()
        }
    }

    /// Proximal operator of the elastic-net penalty for a coordinate whose
    /// squared norm has been folded into `x`: soft-thresholding by `l1`
    /// followed by a ridge shrinkage of `1 + l2`.
    pub fn elastic_net_prox<F: Float>(x: F, l1: F, l2: F) -> F {
        soft_thresholding(x, l1) / (F::one() + l2)
    }
}

/// This module contains numeric helpers shared by the estimators.
pub mod helpers {
    use crate::Float;
    use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix1};
    use std::cmp::Ordering;

    /// This is a helper method that sorts the indices of an array based on some
    /// `compare` closure. The tree builders use it to order the samples of a
    /// node along a feature.
    /// Reference: `https://github.com/rust-ndarray/ndarray/issues/1145`
    pub fn argsort_by<S, F>(arr: &ArrayBase<S, Ix1>, mut compare: F) -> Vec<usize>
    where
        S: Data,
        F: FnMut(&S::Elem, &S::Elem) -> Ordering,
    {
        let mut indices: Vec<usize> = (0..arr.len()).collect();
        indices.sort_unstable_by(move |&i, &j| compare(&arr[i], &arr[j]));
        indices
    }

    /// This function solves a linear system `Ax = b` using Gaussian elimination
    /// with partial pivoting. It is used to solve the normal equations of the
    /// ordinary least squares estimator. We made the choice not to use a LAPACK
    /// subroutine since it introduces unsafe code and a significantly larger
    /// bundle size.
    ///
    /// An error is returned only when a pivot is exactly zero. Ill-conditioned
    /// systems are solved as-is.
    pub fn solve_lin_sys<F: Float>(
        A: ArrayView2<F>,
        b: ArrayView1<F>,
    ) -> Result<Array1<F>, &'static str> {
        let size = b.len();
        if A.nrows() != size || A.ncols() != size {
            return Err("System matrix must be square and match the right-hand side");
        }

        // Concatenation
        let mut system = Array2::<F>::zeros((size, size + 1));
        for i in 0..size {
            for j in 0..size {
                system[[i, j]] = A[[i, j]];
            }
            system[[i, size]] = b[i];
        }

        // Echelon form
        for i in 0..size {
            let mut pivot = i;
            for r in (i + 1)..size {
                if system[[r, i]].abs() > system[[pivot, i]].abs() {
                    pivot = r;
                }
            }
            if system[[pivot, i]] == F::zero() {
                return Err("Infinitely many solutions or singular matrix");
            }
            if pivot != i {
                for k in 0..(size + 1) {
                    system.swap([i, k], [pivot, k]);
                }
            }
            for r in (i + 1)..size {
                let factor = system[[r, i]] / system[[i, i]];
                if factor == F::zero() {
                    continue;
                }
                for k in i..(size + 1) {
                    let delta = factor * system[[i, k]];
                    system[[r, k]] -= delta;
                }
            }
        }

        // Back substitution
        let mut x = Array1::<F>::zeros(size);
        for i in (0..size).rev() {
            let mut acc = system[[i, size]];
            for k in (i + 1)..size {
                acc -= system[[i, k]] * x[k];
            }
            x[i] = acc / system[[i, i]];
        }

        Ok(x)
    }

    /// Rescales non-negative raw importances so that they sum to one. When
    /// every raw importance is zero (or the total is not finite), each feature
    /// gets the same share `1 / n_features`.
    pub fn normalize_importances<F: Float>(raw: ArrayView1<F>) -> Array1<F> {
        let n_features = raw.len();
        let clamped = raw.mapv(|v| if v > F::zero() { v } else { F::zero() });
        let total = clamped.sum();
        if total > F::zero() && total.is_finite() {
            clamped / total
        } else {
            Array1::from_elem(n_features, F::one() / F::cast(n_features.max(1)))
        }
    }

    /// Sample standard deviation (`n - 1` in the denominator) of a column.
    /// Columns with fewer than two entries have a null deviation.
    pub fn sample_std<F: Float>(column: ArrayView1<F>) -> F {
        let n = column.len();
        if n < 2 {
            return F::zero();
        }
        let mean = column.sum() / F::cast(n);
        let ss = column.fold(F::zero(), |acc, &v| acc + (v - mean) * (v - mean));
        (ss / F::cast(n - 1)).sqrt()
    }

    /// Returns the provided names when there is exactly one per feature,
    /// synthesized `Variable_<i>` names (1-based) otherwise.
    pub fn resolve_variable_names(names: &[String], n_features: usize) -> Vec<String> {
        if names.len() == n_features {
            return names.to_vec();
        }
        if !names.is_empty() {
            log::warn!(
                "Number of variable names ({}) does not match number of features ({}). Using default names.",
                names.len(),
                n_features
            );
        }
        (1..=n_features).map(|i| format!("Variable_{}", i)).collect()
    }

    /// Returns the target name, `"Target"` when empty.
    pub fn resolve_target_name(name: &str) -> String {
        if name.is_empty() {
            "Target".to_string()
        } else {
            name.to_string()
        }
    }
}

/// This module contains helpers functions to efficiently write tests.
pub mod test_helpers {
    use crate::Float;
    use approx::AbsDiffEq;
    use ndarray::prelude::*;
    use ndarray::{Array1, Array2, ArrayView1};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    pub fn assert_array_all_close<F>(x: ArrayView1<F>, y: ArrayView1<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.len(), y.len());
        for i in 0..x.len() {
            if x[i].abs_diff_ne(&y[i], delta) {
                panic!("x: {}, y: {} ; with precision level {}", x[i], y[i], delta);
            }
        }
    }

    pub fn fill_random_vector(capacity: usize, seed: u64) -> Vec<f64> {
        let mut r = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0., 1.).unwrap();

        let mut data_x: Vec<f64> = Vec::with_capacity(capacity);
        for _ in 0..data_x.capacity() {
            data_x.push(normal.sample(&mut r));
        }
        data_x
    }

    /// Gaussian design matrix with a linear response `Xw + noise`.
    pub fn generate_random_data(n_samples: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
        let data_x = fill_random_vector(n_samples * n_features, 42);
        let data_w = fill_random_vector(n_features, 43);
        let data_e = fill_random_vector(n_samples, 44);
        let X = Array2::from_shape_vec((n_samples, n_features).f(), data_x).unwrap();
        let true_w = Array1::from_shape_vec(n_features, data_w).unwrap();
        let noise = Array1::from_shape_vec(n_samples, data_e).unwrap();
        let y = X.dot(&true_w) + noise * 0.1;

        (X, y)
    }

    /// Deterministic non-linear regression problem: the response only depends
    /// on the first two features.
    pub fn generate_friedman_like(n_samples: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
        let X = Array2::from_shape_fn((n_samples, n_features), |(i, j)| {
            (((i * 7 + j * 13) % 29) as f64) / 29.0
        });
        let y = Array1::from_shape_fn(n_samples, |i| {
            10.0 * (3.0 * X[[i, 0]]).sin() + 5.0 * X[[i, 1]] * X[[i, 1]]
        });
        (X, y)
    }
}
