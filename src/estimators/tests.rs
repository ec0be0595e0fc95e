use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2};

use super::error::ModelError;
use super::hyperparams::*;
use super::*;
use crate::cd::center_columns;
use crate::datasets::Dataset;
use crate::helpers::test_helpers::*;
use crate::{Fit, Model, ParamGuard};

fn all_models() -> Vec<Box<dyn Model<f64>>> {
    vec![
        Box::new(LinearRegression::<f64>::new()),
        Box::new(ElasticNet::new(
            ElasticNet::<f64>::params().lambda(0.01).check_unwrap(),
        )),
        Box::new(RandomForest::new(
            RandomForest::<f64>::params()
                .n_estimators(10)
                .max_depth(4)
                .random_state(7)
                .check_unwrap(),
        )),
        Box::new(GradientBoosting::new(
            GradientBoosting::<f64>::params()
                .n_estimators(20)
                .random_state(7)
                .check_unwrap(),
        )),
        Box::new(XGBoost::new(
            XGBoost::<f64>::params()
                .n_estimators(20)
                .max_depth(3)
                .random_state(7)
                .check_unwrap(),
        )),
        Box::new(NeuralNetwork::new(
            NeuralNetwork::<f64>::params()
                .hidden_layer_sizes(vec![8])
                .learning_rate(0.01)
                .max_iterations(50)
                .random_state(7)
                .check_unwrap(),
        )),
    ]
}

fn nonlinear_dataset() -> Dataset<f64> {
    let (X, y) = generate_friedman_like(60, 3);
    Dataset::new(X, y)
}

/// `y = 3 x1 - 2 x2 + 5` on a non-collinear design.
fn exact_linear_dataset() -> Dataset<f64> {
    let X = Array2::from_shape_fn((20, 2), |(i, j)| match j {
        0 => i as f64,
        _ => ((i * i) % 7) as f64,
    });
    let y = X.column(0).mapv(|v| 3. * v) - X.column(1).mapv(|v| 2. * v) + 5.;
    Dataset::new(X, y)
}

#[test]
fn test_unfitted_models_reject_every_accessor() {
    let X = Array2::<f64>::zeros((3, 2));
    for model in all_models() {
        assert!(!model.is_fitted(), "{}", model.name());
        assert_eq!(model.predict(X.view()), Err(ModelError::NotFitted));
        assert_eq!(model.feature_importance(), Err(ModelError::NotFitted));
        assert_eq!(model.statistics(), Err(ModelError::NotFitted));
        assert_eq!(model.parameters(), Err(ModelError::NotFitted));
        assert!(model.variable_names().is_empty());
        assert_eq!(model.target_name(), "");
        assert_eq!(model.n_features(), None);
    }
}

#[test]
fn test_predict_rejects_wrong_column_count() {
    let dataset = nonlinear_dataset();
    let X_bad = Array2::<f64>::zeros((5, 2));
    for mut model in all_models() {
        model.fit(&dataset.view()).unwrap();
        let err = model.predict(X_bad.view()).unwrap_err();
        assert_eq!(
            err,
            ModelError::FeatureMismatch {
                expected: 3,
                found: 2
            },
            "{}",
            model.name()
        );
        assert!(err.is_usage_violation());
        assert_eq!(model.predict(dataset.design_matrix().view()).unwrap().len(), 60);
    }
}

#[test]
fn test_importances_are_normalized() {
    let dataset = nonlinear_dataset();
    for mut model in all_models() {
        model.fit(&dataset.view()).unwrap();
        let importances = model.feature_importance().unwrap();
        assert_eq!(importances.len(), 3, "{}", model.name());
        assert!(importances.values().all(|&v| v >= 0.), "{}", model.name());
        assert_abs_diff_eq!(importances.values().sum::<f64>(), 1., epsilon = 1e-9);
    }
}

#[test]
fn test_common_statistics_are_reported() {
    let dataset = nonlinear_dataset();
    for mut model in all_models() {
        model.fit(&dataset.view()).unwrap();
        let stats = model.statistics().unwrap();
        for key in ["r_squared", "adjusted_r_squared", "rmse", "n_samples", "n_features"] {
            assert!(stats.contains_key(key), "{} misses {}", model.name(), key);
        }
        assert_eq!(stats["n_samples"], 60.);
        assert_eq!(stats["n_features"], 3.);
        assert!(stats["rmse"] >= 0.);
        assert_eq!(model.n_features(), Some(3));
    }
}

#[test]
fn test_fit_rejects_misaligned_targets() {
    let X = Array2::<f64>::zeros((10, 2));
    let y = Array1::<f64>::zeros(9);
    let dataset = Dataset::new(X, y);
    for mut model in all_models() {
        let err = model.fit(&dataset.view()).unwrap_err();
        assert_eq!(
            err,
            ModelError::SampleMismatch {
                n_samples: 10,
                n_targets: 9
            }
        );
        assert!(err.is_fit_failure());
        assert!(!model.is_fitted());
    }
}

#[test]
fn test_failed_fit_keeps_previous_state() {
    let mut model = LinearRegression::<f64>::new();
    model.fit(&exact_linear_dataset().view()).unwrap();
    let before = model.coefficients().unwrap().to_owned();

    let too_few = Dataset::new(Array2::<f64>::ones((2, 2)), array![1., 2.]);
    let err = model.fit(&too_few.view()).unwrap_err();

    assert_eq!(
        err,
        ModelError::NotEnoughSamples {
            n_samples: 2,
            n_features: 2
        }
    );
    assert!(model.is_fitted());
    assert_eq!(model.coefficients().unwrap(), before.view());
}

#[test]
fn test_ols_recovers_exact_coefficients() {
    let mut model = LinearRegression::<f64>::new();
    model.fit(&exact_linear_dataset().view()).unwrap();

    assert_abs_diff_eq!(model.intercept().unwrap(), 5., epsilon = 1e-6);
    assert_array_all_close(model.coefficients().unwrap(), array![3., -2.].view(), 1e-6);

    let stats = model.statistics().unwrap();
    assert_abs_diff_eq!(stats["r_squared"], 1., epsilon = 1e-9);
    assert_abs_diff_eq!(stats["rmse"], 0., epsilon = 1e-6);

    let params = model.parameters().unwrap();
    assert_abs_diff_eq!(params["intercept"], 5., epsilon = 1e-6);
    assert_abs_diff_eq!(params["Variable_1"], 3., epsilon = 1e-6);
    assert_abs_diff_eq!(params["Variable_2"], -2., epsilon = 1e-6);
}

#[test]
fn test_ols_reports_singular_system() {
    let X = Array2::from_shape_fn((10, 2), |(i, j)| if j == 0 { i as f64 } else { 0. });
    let y = Array1::from_shape_fn(10, |i| i as f64);
    let mut model = LinearRegression::<f64>::new();

    let err = model.fit(&Dataset::new(X, y).view()).unwrap_err();

    assert!(matches!(err, ModelError::SingularMatrix(_)));
    assert!(!model.is_fitted());
}

#[test]
fn test_lasso_shrinks_as_lambda_grows() {
    let (X, y) = generate_random_data(50, 5);
    let dataset = Dataset::new(X, y);

    let l1_norms: Vec<f64> = [0.01, 0.1, 1., 10., 100.]
        .iter()
        .map(|&lambda| {
            let model: std::result::Result<ElasticNet<f64>, ModelError> = ElasticNet::params()
                .alpha(1.)
                .lambda(lambda)
                .max_iterations(10_000)
                .tolerance(1e-10)
                .fit(&dataset);
            let model = model.unwrap();
            model.coefficients().unwrap().mapv(f64::abs).sum()
        })
        .collect();

    for pair in l1_norms.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-8, "{:?}", l1_norms);
    }
}

#[test]
fn test_large_lambda_zeroes_every_coefficient() {
    let (X, y) = generate_random_data(50, 5);
    let dataset = Dataset::new(X, y);
    let mut model = ElasticNet::new(ElasticNet::params().lambda(1e5).check_unwrap());

    model.fit(&dataset.view()).unwrap();

    assert!(model.coefficients().unwrap().iter().all(|&c| c == 0.));
    assert_abs_diff_eq!(
        model.intercept().unwrap(),
        dataset.targets().mean().unwrap(),
        epsilon = 1e-12
    );
    assert_eq!(model.statistics().unwrap()["non_zero_coefficients"], 0.);
    let importances = model.feature_importance().unwrap();
    assert!(importances.values().all(|&v| (v - 0.2).abs() < 1e-12));
}

#[test]
fn test_ridge_keeps_coefficients_lasso_drops_them() {
    let (X, y) = generate_random_data(50, 5);
    let (X_c, _) = center_columns(X.view());
    let y_c = &y - y.mean().unwrap();
    let lambda_max = X_c
        .t()
        .dot(&y_c)
        .iter()
        .fold(0f64, |acc, v| acc.max(v.abs()));
    let dataset = Dataset::new(X, y);

    let mut ridge = ElasticNet::new(ElasticNet::params().alpha(0.).lambda(1.).check_unwrap());
    ridge.fit(&dataset.view()).unwrap();
    assert_eq!(ridge.statistics().unwrap()["non_zero_coefficients"], 5.);

    let mut lasso = ElasticNet::new(
        ElasticNet::params()
            .alpha(1.)
            .lambda(lambda_max * 1.01)
            .check_unwrap(),
    );
    lasso.fit(&dataset.view()).unwrap();
    assert_eq!(lasso.statistics().unwrap()["non_zero_coefficients"], 0.);
}

#[test]
fn test_elastic_net_reports_hyperparameters() {
    let mut model = ElasticNet::new(ElasticNet::params().alpha(0.3).lambda(0.2).check_unwrap());
    model.fit(&exact_linear_dataset().view()).unwrap();

    let params = model.parameters().unwrap();
    assert_abs_diff_eq!(params["alpha"], 0.3);
    assert_abs_diff_eq!(params["lambda"], 0.2);
    assert_eq!(params["max_iter"], 1000.);
    assert!(params.contains_key("intercept"));
    assert!(params.contains_key("Variable_1"));
    assert!(model.n_iter().unwrap() >= 1);
    assert_eq!(
        model.description(),
        "ElasticNet Regression with L1 and L2 regularization (alpha=0.3, lambda=0.2)."
    );
}

#[test]
fn test_boosting_training_rmse_is_non_increasing() {
    let dataset = nonlinear_dataset();

    let gb_rmse: Vec<f64> = [1, 5, 10, 20, 40]
        .iter()
        .map(|&n| {
            let mut model = GradientBoosting::new(
                GradientBoosting::params()
                    .n_estimators(n)
                    .random_state(0)
                    .check_unwrap(),
            );
            model.fit(&dataset.view()).unwrap();
            model.statistics().unwrap()["rmse"]
        })
        .collect();

    let xgb_rmse: Vec<f64> = [1, 5, 10, 20, 40]
        .iter()
        .map(|&n| {
            let mut model = XGBoost::new(
                XGBoost::params()
                    .n_estimators(n)
                    .max_depth(3)
                    .random_state(0)
                    .check_unwrap(),
            );
            model.fit(&dataset.view()).unwrap();
            model.statistics().unwrap()["rmse"]
        })
        .collect();

    for rmse in [&gb_rmse, &xgb_rmse] {
        for pair in rmse.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12, "{:?}", rmse);
        }
        assert!(rmse[rmse.len() - 1] < rmse[0]);
    }
}

#[test]
fn test_xgboost_trees_split_on_sampled_columns() {
    let dataset = nonlinear_dataset();
    let mut model = XGBoost::new(
        XGBoost::params()
            .n_estimators(20)
            .max_depth(3)
            .colsample_bytree(0.5)
            .random_state(3)
            .check_unwrap(),
    );
    model.fit(&dataset.view()).unwrap();

    let mut used_by_ensemble = std::collections::BTreeSet::new();
    for member in model.members().unwrap() {
        let used: std::collections::BTreeSet<usize> = member
            .tree
            .nodes()
            .iter()
            .filter_map(|node| match node {
                crate::tree::Node::Split { feature, .. } => Some(*feature),
                _ => None,
            })
            .collect();
        // floor(0.5 * 3) columns per tree
        assert!(used.len() <= 1, "{:?}", used);
        used_by_ensemble.extend(used);
    }
    assert!(used_by_ensemble.len() > 1);
}

#[test]
fn test_boosting_starts_from_target_mean() {
    let dataset = nonlinear_dataset();
    let mean = dataset.targets().mean().unwrap();

    let mut gb = GradientBoosting::new(GradientBoosting::params().n_estimators(3).check_unwrap());
    gb.fit(&dataset.view()).unwrap();
    assert_abs_diff_eq!(gb.initial_prediction().unwrap(), mean, epsilon = 1e-12);
    assert_eq!(gb.members().unwrap().len(), 3);

    let mut xgb = XGBoost::new(XGBoost::params().n_estimators(3).check_unwrap());
    xgb.fit(&dataset.view()).unwrap();
    assert_abs_diff_eq!(xgb.base_score().unwrap(), mean, epsilon = 1e-12);
    assert_eq!(xgb.statistics().unwrap()["n_trees"], 3.);
}

#[test]
fn test_gradient_boosting_pseudo_residuals() {
    use super::gradient_boosting::pseudo_residuals;

    let y = array![3., 0., 1., -2.];
    let current = array![1., 0., 1.5, -1.];

    let squared = pseudo_residuals(Loss::SquaredError, y.view(), current.view(), 0.9);
    assert_eq!(squared, array![2., 0., -0.5, -1.]);

    let absolute = pseudo_residuals(Loss::AbsoluteError, y.view(), current.view(), 0.9);
    assert_eq!(absolute, array![1., 0., -1., -1.]);

    let huber = pseudo_residuals(Loss::Huber, y.view(), current.view(), 0.9);
    assert_eq!(huber, array![1., 0., -0.5, -1.]);

    let quantile = pseudo_residuals(Loss::Quantile, y.view(), current.view(), 0.9);
    assert_array_all_close(quantile.view(), array![0.9, -0.1, -0.1, -0.1].view(), 1e-12);
}

#[test]
fn test_gradient_boosting_robust_losses_fit() {
    let dataset = nonlinear_dataset();
    for loss in [Loss::AbsoluteError, Loss::Huber, Loss::Quantile] {
        let mut model = GradientBoosting::new(
            GradientBoosting::params()
                .loss(loss)
                .subsample(0.8)
                .random_state(3)
                .check_unwrap(),
        );
        model.fit(&dataset.view()).unwrap();
        assert!(model.predict(dataset.design_matrix().view()).unwrap().iter().all(|v| v.is_finite()));
    }
    let model = GradientBoosting::<f64>::new(GradientBoosting::params().loss(Loss::Huber).check_unwrap());
    assert_eq!(
        model.description(),
        "Gradient Boosting Regression with 100 trees and Huber loss function."
    );
}

#[test]
fn test_random_forest_shape_scenario() {
    let (X, y) = generate_friedman_like(100, 4);
    let dataset = Dataset::new(X, y);
    let mut model = RandomForest::new(
        RandomForest::<f64>::params()
            .n_estimators(10)
            .max_depth(3)
            .random_state(42)
            .check_unwrap(),
    );

    model.fit(&dataset.view()).unwrap();

    let predictions = model.predict(dataset.design_matrix().view()).unwrap();
    assert_eq!(predictions.len(), 100);
    let importances = model.feature_importance().unwrap();
    assert_eq!(importances.len(), 4);
    assert_abs_diff_eq!(importances.values().sum::<f64>(), 1., epsilon = 1e-9);
    assert_eq!(model.statistics().unwrap()["n_trees"], 10.);
    assert!(model.members().unwrap().iter().all(|m| m.tree.depth() <= 3));
    assert_eq!(model.parameters().unwrap()["max_features"], 2.);
}

#[test]
fn test_random_forest_is_reproducible_with_a_seed() {
    let dataset = nonlinear_dataset();
    let params = RandomForest::<f64>::params()
        .n_estimators(5)
        .random_state(11)
        .check_unwrap();

    let mut first = RandomForest::new(params.clone());
    let mut second = RandomForest::new(params);
    first.fit(&dataset.view()).unwrap();
    second.fit(&dataset.view()).unwrap();

    let X = dataset.design_matrix().view();
    assert_eq!(first.predict(X).unwrap(), second.predict(X).unwrap());
}

#[test]
fn test_neural_network_learns_linear_response() {
    let X = Array2::from_shape_fn((100, 2), |(i, j)| ((i * (j + 3)) % 17) as f64 / 17.);
    let y = X.column(0).mapv(|v| 4. * v) + X.column(1).mapv(|v| -2. * v) + 1.;
    let dataset = Dataset::new(X, y);
    let mut model = NeuralNetwork::new(
        NeuralNetwork::params()
            .hidden_layer_sizes(vec![16])
            .learning_rate(0.01)
            .max_iterations(300)
            .random_state(0)
            .check_unwrap(),
    );

    model.fit(&dataset.view()).unwrap();

    let stats = model.statistics().unwrap();
    assert!(stats["r_squared"] > 0.9, "{:?}", stats);
    assert!(stats["final_loss"].is_finite());

    let params = model.parameters().unwrap();
    assert_eq!(params["input_layer_size"], 2.);
    assert_eq!(params["hidden_layer_1_size"], 16.);
    assert_eq!(params["output_layer_size"], 1.);
    assert_eq!(params["total_parameters"], 65.);
}

#[test]
fn test_neural_network_ranks_driving_column_first() {
    let X = Array2::from_shape_fn((100, 2), |(i, j)| match j {
        0 => ((i * 3) % 17) as f64 / 17.,
        _ => ((i * 7 + 3) % 11) as f64 / 11.,
    });
    let y = X.column(0).mapv(|v| 4. * v + 1.);
    let dataset = Dataset::new(X, y).with_feature_names(["signal", "noise"]);
    let mut model = NeuralNetwork::new(
        NeuralNetwork::params()
            .hidden_layer_sizes(vec![16])
            .learning_rate(0.01)
            .max_iterations(300)
            .random_state(0)
            .check_unwrap(),
    );

    model.fit(&dataset.view()).unwrap();

    let importances = model.feature_importance().unwrap();
    assert!(importances["signal"] > importances["noise"], "{:?}", importances);
    assert!(importances["signal"] > 0.5);
    assert_eq!(
        model.activations().unwrap(),
        (Activation::Relu, Activation::Identity)
    );
    let params = model.parameters().unwrap();
    assert_eq!(params["epochs"], params["max_iter"]);
}

#[test]
fn test_neural_network_early_stopping() {
    let dataset = nonlinear_dataset();
    let mut model = NeuralNetwork::new(
        NeuralNetwork::params()
            .solver(Solver::Sgd)
            .tolerance(1e3)
            .n_iter_no_change(3)
            .random_state(1)
            .check_unwrap(),
    );

    model.fit(&dataset.view()).unwrap();

    assert_eq!(model.n_iter().unwrap(), 4);
    assert_eq!(model.statistics().unwrap()["n_iter"], 4.);
}

#[test]
fn test_neural_network_handles_constant_columns() {
    let X = Array2::from_shape_fn((30, 2), |(i, j)| if j == 0 { i as f64 } else { 1. });
    let y = X.column(0).to_owned();
    let mut model = NeuralNetwork::new(
        NeuralNetwork::params()
            .max_iterations(20)
            .random_state(5)
            .check_unwrap(),
    );

    model.fit(&Dataset::new(X.clone(), y).view()).unwrap();

    assert!(model.predict(X.view()).unwrap().iter().all(|v| v.is_finite()));
    assert_abs_diff_eq!(
        model.feature_importance().unwrap().values().sum::<f64>(),
        1.,
        epsilon = 1e-9
    );
}

#[test]
fn test_fit_through_hyperparameters() {
    let dataset = exact_linear_dataset();

    let fitted: std::result::Result<ElasticNet<f64>, ModelError> =
        ElasticNet::params().alpha(0.5).lambda(0.01).fit(&dataset);
    assert!(fitted.unwrap().is_fitted());

    let invalid: std::result::Result<ElasticNet<f64>, ModelError> =
        ElasticNet::params().lambda(-1.).fit(&dataset);
    assert_eq!(invalid.unwrap_err(), ModelError::InvalidRegularization(-1.));

    let forest: std::result::Result<RandomForest<f64>, ModelError> = RandomForest::<f64>::params()
        .n_estimators(3)
        .random_state(0)
        .fit(&dataset);
    assert_eq!(forest.unwrap().statistics().unwrap()["n_trees"], 3.);
}

#[test]
fn test_hyperparameter_validation() {
    assert_eq!(
        ElasticNet::<f64>::params().alpha(1.5).check(),
        Err(ModelError::InvalidMixing(1.5))
    );
    assert_eq!(
        RandomForest::<f64>::params().min_samples_split(1).check(),
        Err(ModelError::InvalidMinSamplesSplit(1))
    );
    assert_eq!(
        GradientBoosting::<f64>::params().learning_rate(0.).check(),
        Err(ModelError::InvalidLearningRate(0.))
    );
    assert_eq!(
        GradientBoosting::<f64>::params().subsample(1.5).check(),
        Err(ModelError::InvalidSubsample(1.5))
    );
    assert_eq!(
        XGBoost::<f64>::params().colsample_bytree(0.).check(),
        Err(ModelError::InvalidColsample(0.))
    );
    assert_eq!(
        XGBoost::<f64>::params().gamma(-1.).check(),
        Err(ModelError::InvalidGamma(-1.))
    );
    assert_eq!(
        NeuralNetwork::<f64>::params().hidden_layer_sizes(vec![4, 0]).check(),
        Err(ModelError::InvalidHiddenLayers(vec![4, 0]))
    );
    assert_eq!(
        NeuralNetwork::<f64>::params().batch_size(0).check(),
        Err(ModelError::InvalidBatchSize(0))
    );
}

#[test]
fn test_string_options() {
    assert_eq!("sqrt".parse::<MaxFeatures>(), Ok(MaxFeatures::Sqrt));
    assert_eq!("huber".parse::<Loss>(), Ok(Loss::Huber));
    assert_eq!("tanh".parse::<Activation>(), Ok(Activation::Tanh));
    assert_eq!("sgd".parse::<Solver>(), Ok(Solver::Sgd));
    assert_eq!("gain".parse::<ImportanceType>(), Ok(ImportanceType::Gain));
    assert_eq!(
        "bogus".parse::<Loss>(),
        Err(ModelError::UnknownOption {
            option: "loss",
            value: "bogus".to_string()
        })
    );
    assert_eq!(MaxFeatures::Log2.resolve(10), 3);
    assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
}

#[test]
fn test_variable_and_target_names() {
    let (X, y) = generate_friedman_like(30, 2);

    let named = Dataset::new(X.clone(), y.clone())
        .with_feature_names(["age", "income"])
        .with_target_name("price");
    let mut model = LinearRegression::<f64>::new();
    model.fit(&named.view()).unwrap();
    assert_eq!(model.variable_names(), ["age", "income"]);
    assert_eq!(model.target_name(), "price");
    assert!(model.feature_importance().unwrap().contains_key("income"));

    let mismatched = Dataset::new(X, y).with_feature_names(["only_one"]);
    model.fit(&mismatched.view()).unwrap();
    assert_eq!(model.variable_names(), ["Variable_1", "Variable_2"]);
    assert_eq!(model.target_name(), "Target");
}

#[test]
fn test_models_behind_the_trait_object() {
    let names: Vec<&str> = all_models().iter().map(|m| m.name()).collect();
    assert_eq!(
        names,
        [
            "Linear Regression",
            "ElasticNet",
            "Random Forest",
            "Gradient Boosting",
            "XGBoost",
            "Neural Network"
        ]
    );
}
