use std::fmt;
use std::str::FromStr;

use super::error::{ModelError, Result};
use super::param_guard::ParamGuard;
use crate::Float;

/// Number of candidate columns drawn at every node of a random forest tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// Same as `Sqrt`.
    Auto,
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    /// Resolves the number of candidate columns for `n_features` columns.
    /// At least one column is always considered.
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Auto | MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor() as usize,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(MaxFeatures::Auto),
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            _ => Err(ModelError::UnknownOption {
                option: "max_features",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MaxFeatures::Auto => "auto",
            MaxFeatures::Sqrt => "sqrt",
            MaxFeatures::Log2 => "log2",
            MaxFeatures::All => "all",
        };
        write!(f, "{}", s)
    }
}

/// Loss function optimized by gradient boosting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    SquaredError,
    AbsoluteError,
    /// Huber loss with a fixed transition point `delta = 1`.
    Huber,
    /// Pinball loss at the configured `quantile_alpha`.
    Quantile,
}

impl FromStr for Loss {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "squared_error" => Ok(Loss::SquaredError),
            "absolute_error" => Ok(Loss::AbsoluteError),
            "huber" => Ok(Loss::Huber),
            "quantile" => Ok(Loss::Quantile),
            _ => Err(ModelError::UnknownOption {
                option: "loss",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Loss::SquaredError => "squared_error",
            Loss::AbsoluteError => "absolute_error",
            Loss::Huber => "huber",
            Loss::Quantile => "quantile",
        };
        write!(f, "{}", s)
    }
}

/// Split importance reported by the XGBoost-style model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportanceType {
    /// Number of times a feature is used to split.
    Weight,
    /// Total gain of the splits using a feature.
    Gain,
}

impl FromStr for ImportanceType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "weight" => Ok(ImportanceType::Weight),
            "gain" => Ok(ImportanceType::Gain),
            _ => Err(ModelError::UnknownOption {
                option: "importance_type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ImportanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportanceType::Weight => write!(f, "weight"),
            ImportanceType::Gain => write!(f, "gain"),
        }
    }
}

/// Hidden layer activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Tanh,
    Sigmoid,
    Identity,
}

impl FromStr for Activation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            "identity" => Ok(Activation::Identity),
            _ => Err(ModelError::UnknownOption {
                option: "activation",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Activation::Relu => "relu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::Identity => "identity",
        };
        write!(f, "{}", s)
    }
}

/// Weight update rule of the neural network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    Adam,
    Sgd,
}

impl FromStr for Solver {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "adam" => Ok(Solver::Adam),
            "sgd" => Ok(Solver::Sgd),
            _ => Err(ModelError::UnknownOption {
                option: "solver",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solver::Adam => write!(f, "adam"),
            Solver::Sgd => write!(f, "sgd"),
        }
    }
}

fn to_f32<F: Float>(x: F) -> f32 {
    x.to_f32().unwrap_or(f32::NAN)
}

/// A verified hyperparameter set ready for the fitting of an ElasticNet model
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticNetValidParams<F> {
    alpha: F,
    lambda: F,
    max_iterations: usize,
    tolerance: F,
}

impl<F: Float> Default for ElasticNetValidParams<F> {
    fn default() -> Self {
        ElasticNetParams::new().0
    }
}

impl<F: Float> ElasticNetValidParams<F> {
    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn lambda(&self) -> F {
        self.lambda
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }
}

/// A hyper-parameter set during construction
///
/// Configures and minimizes the following objective function on centered data:
/// ```ignore
/// 1 / 2 * ||y - Xw||^2_2
///     + lambda * alpha * ||w||_1
///     + lambda * (1 - alpha) / 2 * ||w||^2_2
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticNetParams<F>(ElasticNetValidParams<F>);

impl<F: Float> Default for ElasticNetParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit an ElasticNet model
impl<F: Float> ElasticNetParams<F> {
    /// Create default ElasticNet hyper parameters
    pub fn new() -> ElasticNetParams<F> {
        Self(ElasticNetValidParams {
            alpha: F::cast(0.5),
            lambda: F::one(),
            max_iterations: 1000,
            tolerance: F::cast(1e-4),
        })
    }

    /// Set the mixing parameter between the L1 and the L2 penalties. `0`
    /// yields a ridge regression, `1` a lasso.
    /// Defaults to `0.5` if not set.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Set the overall regularization strength. A higher value yields
    /// smaller (and sparser) coefficients.
    /// Defaults to `1` if not set.
    pub fn lambda(mut self, lambda: F) -> Self {
        self.0.lambda = lambda;
        self
    }

    /// Set the maximum number of coordinate descent sweeps.
    /// Defaults to `1000` if not set.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.0.max_iterations = max_iterations;
        self
    }

    /// Set the stopping criterion: the largest coefficient change of a sweep.
    ///
    /// Defaults to `1e-4` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }
}

impl<F: Float> ParamGuard for ElasticNetParams<F> {
    type Checked = ElasticNetValidParams<F>;
    type Error = ModelError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        if !(self.0.alpha >= F::zero() && self.0.alpha <= F::one()) {
            Err(ModelError::InvalidMixing(to_f32(self.0.alpha)))
        } else if !(self.0.lambda >= F::zero()) || !self.0.lambda.is_finite() {
            Err(ModelError::InvalidRegularization(to_f32(self.0.lambda)))
        } else if self.0.max_iterations == 0 {
            Err(ModelError::InvalidIterations(self.0.max_iterations))
        } else if !(self.0.tolerance > F::zero()) {
            Err(ModelError::InvalidTolerance(to_f32(self.0.tolerance)))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// Checks the tree growing limits shared by the forest and the boosting
/// ensembles.
fn check_tree_limits(
    n_estimators: usize,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
) -> Result<()> {
    if n_estimators == 0 {
        Err(ModelError::InvalidEstimators(n_estimators))
    } else if max_depth == 0 {
        Err(ModelError::InvalidMaxDepth(max_depth))
    } else if min_samples_split < 2 {
        Err(ModelError::InvalidMinSamplesSplit(min_samples_split))
    } else if min_samples_leaf == 0 {
        Err(ModelError::InvalidMinSamplesLeaf(min_samples_leaf))
    } else {
        Ok(())
    }
}

fn check_ratio<F: Float>(ratio: F, err: fn(f32) -> ModelError) -> Result<()> {
    if ratio > F::zero() && ratio <= F::one() {
        Ok(())
    } else {
        Err(err(to_f32(ratio)))
    }
}

/// A verified hyperparameter set ready for the fitting of a random forest
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestValidParams {
    n_estimators: usize,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
    bootstrap: bool,
    random_state: Option<u64>,
}

impl Default for RandomForestValidParams {
    fn default() -> Self {
        RandomForestParams::new().0
    }
}

impl RandomForestValidParams {
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// A hyper-parameter set during construction
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestParams(RandomForestValidParams);

impl Default for RandomForestParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a random forest
impl RandomForestParams {
    pub fn new() -> RandomForestParams {
        Self(RandomForestValidParams {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Auto,
            bootstrap: true,
            random_state: None,
        })
    }

    /// Set the number of trees.
    /// Defaults to `100` if not set.
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Set the maximum depth of each tree.
    /// Defaults to `10` if not set.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to split a node.
    /// Defaults to `2` if not set.
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples in each child of a split.
    /// Defaults to `1` if not set.
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the number of candidate columns drawn at each node.
    /// Defaults to [`MaxFeatures::Auto`] if not set.
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.max_features = max_features;
        self
    }

    /// Draw a bootstrap sample for each tree instead of using every row.
    /// Defaults to `true` if not set.
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.0.bootstrap = bootstrap;
        self
    }

    /// Seed of the model's random generator. Unseeded models draw their seed
    /// from system entropy.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl ParamGuard for RandomForestParams {
    type Checked = RandomForestValidParams;
    type Error = ModelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        check_tree_limits(
            self.0.n_estimators,
            self.0.max_depth,
            self.0.min_samples_split,
            self.0.min_samples_leaf,
        )?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a gradient boosting
/// ensemble
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostingValidParams<F> {
    learning_rate: F,
    n_estimators: usize,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    subsample: F,
    loss: Loss,
    quantile_alpha: F,
    random_state: Option<u64>,
}

impl<F: Float> Default for GradientBoostingValidParams<F> {
    fn default() -> Self {
        GradientBoostingParams::new().0
    }
}

impl<F: Float> GradientBoostingValidParams<F> {
    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn subsample(&self) -> F {
        self.subsample
    }

    pub fn loss(&self) -> Loss {
        self.loss
    }

    pub fn quantile_alpha(&self) -> F {
        self.quantile_alpha
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// A hyper-parameter set during construction
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostingParams<F>(GradientBoostingValidParams<F>);

impl<F: Float> Default for GradientBoostingParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a gradient boosting ensemble
impl<F: Float> GradientBoostingParams<F> {
    pub fn new() -> GradientBoostingParams<F> {
        Self(GradientBoostingValidParams {
            learning_rate: F::cast(0.1),
            n_estimators: 100,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: F::one(),
            loss: Loss::SquaredError,
            quantile_alpha: F::cast(0.9),
            random_state: None,
        })
    }

    /// Set the shrinkage applied to every tree.
    /// Defaults to `0.1` if not set.
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set the number of boosting rounds.
    /// Defaults to `100` if not set.
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Defaults to `3` if not set.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Defaults to `2` if not set.
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Defaults to `1` if not set.
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the fraction of rows, drawn without replacement, used to grow
    /// each tree.
    /// Defaults to `1` if not set.
    pub fn subsample(mut self, subsample: F) -> Self {
        self.0.subsample = subsample;
        self
    }

    /// Defaults to [`Loss::SquaredError`] if not set.
    pub fn loss(mut self, loss: Loss) -> Self {
        self.0.loss = loss;
        self
    }

    /// Set the quantile targeted by [`Loss::Quantile`].
    /// Defaults to `0.9` if not set.
    pub fn quantile_alpha(mut self, quantile_alpha: F) -> Self {
        self.0.quantile_alpha = quantile_alpha;
        self
    }

    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for GradientBoostingParams<F> {
    type Checked = GradientBoostingValidParams<F>;
    type Error = ModelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if !(self.0.learning_rate > F::zero()) || !self.0.learning_rate.is_finite() {
            return Err(ModelError::InvalidLearningRate(to_f32(self.0.learning_rate)));
        }
        check_tree_limits(
            self.0.n_estimators,
            self.0.max_depth,
            self.0.min_samples_split,
            self.0.min_samples_leaf,
        )?;
        check_ratio(self.0.subsample, ModelError::InvalidSubsample)?;
        if !(self.0.quantile_alpha > F::zero() && self.0.quantile_alpha < F::one()) {
            return Err(ModelError::InvalidQuantile(to_f32(self.0.quantile_alpha)));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of an XGBoost-style
/// ensemble
#[derive(Debug, Clone, PartialEq)]
pub struct XGBoostValidParams<F> {
    learning_rate: F,
    max_depth: usize,
    n_estimators: usize,
    subsample: F,
    colsample_bytree: F,
    min_child_weight: F,
    gamma: F,
    importance_type: ImportanceType,
    random_state: Option<u64>,
}

impl<F: Float> Default for XGBoostValidParams<F> {
    fn default() -> Self {
        XGBoostParams::new().0
    }
}

impl<F: Float> XGBoostValidParams<F> {
    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn subsample(&self) -> F {
        self.subsample
    }

    pub fn colsample_bytree(&self) -> F {
        self.colsample_bytree
    }

    pub fn min_child_weight(&self) -> F {
        self.min_child_weight
    }

    pub fn gamma(&self) -> F {
        self.gamma
    }

    pub fn importance_type(&self) -> ImportanceType {
        self.importance_type
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// A hyper-parameter set during construction
///
/// Trees are grown on the first and second order derivatives of the squared
/// error. A split is kept only when its gain exceeds `gamma`.
#[derive(Debug, Clone, PartialEq)]
pub struct XGBoostParams<F>(XGBoostValidParams<F>);

impl<F: Float> Default for XGBoostParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> XGBoostParams<F> {
    pub fn new() -> XGBoostParams<F> {
        Self(XGBoostValidParams {
            learning_rate: F::cast(0.1),
            max_depth: 6,
            n_estimators: 100,
            subsample: F::one(),
            colsample_bytree: F::one(),
            min_child_weight: F::one(),
            gamma: F::zero(),
            importance_type: ImportanceType::Weight,
            random_state: None,
        })
    }

    /// Defaults to `0.1` if not set.
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Defaults to `6` if not set.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Defaults to `100` if not set.
    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.0.n_estimators = n_estimators;
        self
    }

    /// Set the fraction of rows used to grow each tree.
    /// Defaults to `1` if not set.
    pub fn subsample(mut self, subsample: F) -> Self {
        self.0.subsample = subsample;
        self
    }

    /// Set the fraction of columns drawn once per tree.
    /// Defaults to `1` if not set.
    pub fn colsample_bytree(mut self, colsample_bytree: F) -> Self {
        self.0.colsample_bytree = colsample_bytree;
        self
    }

    /// Set the minimum hessian sum of a child.
    /// Defaults to `1` if not set.
    pub fn min_child_weight(mut self, min_child_weight: F) -> Self {
        self.0.min_child_weight = min_child_weight;
        self
    }

    /// Set the minimum gain required to split a node.
    /// Defaults to `0` if not set.
    pub fn gamma(mut self, gamma: F) -> Self {
        self.0.gamma = gamma;
        self
    }

    /// Defaults to [`ImportanceType::Weight`] if not set.
    pub fn importance_type(mut self, importance_type: ImportanceType) -> Self {
        self.0.importance_type = importance_type;
        self
    }

    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for XGBoostParams<F> {
    type Checked = XGBoostValidParams<F>;
    type Error = ModelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if !(self.0.learning_rate > F::zero()) || !self.0.learning_rate.is_finite() {
            Err(ModelError::InvalidLearningRate(to_f32(self.0.learning_rate)))
        } else if self.0.n_estimators == 0 {
            Err(ModelError::InvalidEstimators(self.0.n_estimators))
        } else if self.0.max_depth == 0 {
            Err(ModelError::InvalidMaxDepth(self.0.max_depth))
        } else if !(self.0.min_child_weight >= F::zero()) {
            Err(ModelError::InvalidMinChildWeight(to_f32(
                self.0.min_child_weight,
            )))
        } else if !(self.0.gamma >= F::zero()) {
            Err(ModelError::InvalidGamma(to_f32(self.0.gamma)))
        } else {
            check_ratio(self.0.subsample, ModelError::InvalidSubsample)?;
            check_ratio(self.0.colsample_bytree, ModelError::InvalidColsample)?;
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a neural network
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNetworkValidParams<F> {
    hidden_layer_sizes: Vec<usize>,
    activation: Activation,
    solver: Solver,
    alpha: F,
    learning_rate: F,
    max_iterations: usize,
    batch_size: usize,
    tolerance: F,
    n_iter_no_change: usize,
    random_state: Option<u64>,
}

impl<F: Float> Default for NeuralNetworkValidParams<F> {
    fn default() -> Self {
        NeuralNetworkParams::new().0
    }
}

impl<F: Float> NeuralNetworkValidParams<F> {
    pub fn hidden_layer_sizes(&self) -> &[usize] {
        &self.hidden_layer_sizes
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn solver(&self) -> Solver {
        self.solver
    }

    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn n_iter_no_change(&self) -> usize {
        self.n_iter_no_change
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// A hyper-parameter set during construction
///
/// Configures a multilayer perceptron with an identity output unit, trained on
/// the mean squared error plus an L2 penalty `alpha`.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNetworkParams<F>(NeuralNetworkValidParams<F>);

impl<F: Float> Default for NeuralNetworkParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> NeuralNetworkParams<F> {
    pub fn new() -> NeuralNetworkParams<F> {
        Self(NeuralNetworkValidParams {
            hidden_layer_sizes: vec![10],
            activation: Activation::Relu,
            solver: Solver::Adam,
            alpha: F::cast(1e-4),
            learning_rate: F::cast(1e-3),
            max_iterations: 200,
            batch_size: 32,
            tolerance: F::cast(1e-4),
            n_iter_no_change: 10,
            random_state: None,
        })
    }

    /// Set the width of each hidden layer.
    /// Defaults to `[10]` if not set.
    pub fn hidden_layer_sizes(mut self, hidden_layer_sizes: Vec<usize>) -> Self {
        self.0.hidden_layer_sizes = hidden_layer_sizes;
        self
    }

    /// Defaults to [`Activation::Relu`] if not set.
    pub fn activation(mut self, activation: Activation) -> Self {
        self.0.activation = activation;
        self
    }

    /// Defaults to [`Solver::Adam`] if not set.
    pub fn solver(mut self, solver: Solver) -> Self {
        self.0.solver = solver;
        self
    }

    /// Set the L2 penalty on the weights.
    /// Defaults to `1e-4` if not set.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Defaults to `1e-3` if not set.
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set the maximum number of epochs.
    /// Defaults to `200` if not set.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.0.max_iterations = max_iterations;
        self
    }

    /// Defaults to `32` if not set.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.0.batch_size = batch_size;
        self
    }

    /// Set the minimum loss improvement resetting the early stopping counter.
    /// Defaults to `1e-4` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Set the number of epochs without improvement before training stops.
    /// Defaults to `10` if not set.
    pub fn n_iter_no_change(mut self, n_iter_no_change: usize) -> Self {
        self.0.n_iter_no_change = n_iter_no_change;
        self
    }

    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for NeuralNetworkParams<F> {
    type Checked = NeuralNetworkValidParams<F>;
    type Error = ModelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let hidden = &self.0.hidden_layer_sizes;
        if hidden.is_empty() || hidden.iter().any(|&size| size == 0) {
            Err(ModelError::InvalidHiddenLayers(hidden.clone()))
        } else if !(self.0.learning_rate > F::zero()) || !self.0.learning_rate.is_finite() {
            Err(ModelError::InvalidLearningRate(to_f32(self.0.learning_rate)))
        } else if !(self.0.alpha >= F::zero()) {
            Err(ModelError::InvalidRegularization(to_f32(self.0.alpha)))
        } else if self.0.max_iterations == 0 {
            Err(ModelError::InvalidIterations(self.0.max_iterations))
        } else if self.0.batch_size == 0 {
            Err(ModelError::InvalidBatchSize(self.0.batch_size))
        } else if !(self.0.tolerance >= F::zero()) {
            Err(ModelError::InvalidTolerance(to_f32(self.0.tolerance)))
        } else if self.0.n_iter_no_change == 0 {
            Err(ModelError::InvalidIterations(self.0.n_iter_no_change))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
