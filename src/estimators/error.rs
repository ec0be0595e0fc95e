use thiserror::Error;

/// Simplified `Result` using [`ModelError`](crate::ModelError) as error type
pub type Result<T> = std::result::Result<T, ModelError>;

/// Error variants from hyperparameter construction, model estimation or
/// misuse of a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid learning rate {0}")]
    InvalidLearningRate(f32),
    #[error("invalid regularization strength {0}")]
    InvalidRegularization(f32),
    #[error("invalid L1/L2 mixing parameter {0}, must lie in [0, 1]")]
    InvalidMixing(f32),
    #[error("invalid tolerance {0}")]
    InvalidTolerance(f32),
    #[error("invalid number of iterations {0}")]
    InvalidIterations(usize),
    #[error("invalid number of estimators {0}")]
    InvalidEstimators(usize),
    #[error("invalid max depth {0}")]
    InvalidMaxDepth(usize),
    #[error("invalid min samples split {0}, must be at least 2")]
    InvalidMinSamplesSplit(usize),
    #[error("invalid min samples leaf {0}")]
    InvalidMinSamplesLeaf(usize),
    #[error("invalid subsample ratio {0}, must lie in (0, 1]")]
    InvalidSubsample(f32),
    #[error("invalid column sample ratio {0}, must lie in (0, 1]")]
    InvalidColsample(f32),
    #[error("invalid min child weight {0}")]
    InvalidMinChildWeight(f32),
    #[error("invalid gamma {0}")]
    InvalidGamma(f32),
    #[error("invalid quantile {0}, must lie in (0, 1)")]
    InvalidQuantile(f32),
    #[error("invalid batch size {0}")]
    InvalidBatchSize(usize),
    #[error("invalid hidden layer sizes {0:?}")]
    InvalidHiddenLayers(Vec<usize>),
    #[error("unknown {option} `{value}`")]
    UnknownOption { option: &'static str, value: String },

    #[error("number of samples in X ({n_samples}) does not match number of samples in y ({n_targets})")]
    SampleMismatch { n_samples: usize, n_targets: usize },
    #[error("number of samples ({n_samples}) must be greater than number of features ({n_features})")]
    NotEnoughSamples { n_samples: usize, n_features: usize },
    #[error("the dataset has no samples or no features")]
    EmptyDataset,
    #[error("singular system: {0}")]
    SingularMatrix(&'static str),
    #[error("training produced non-finite values")]
    NonFiniteResult,

    #[error("model has not been fitted yet")]
    NotFitted,
    #[error("number of features in X ({found}) does not match the number of features the model was trained on ({expected})")]
    FeatureMismatch { expected: usize, found: usize },
}

impl ModelError {
    /// Recoverable failures reported by `fit`. The model keeps its prior state.
    pub fn is_fit_failure(&self) -> bool {
        matches!(
            self,
            ModelError::SampleMismatch { .. }
                | ModelError::NotEnoughSamples { .. }
                | ModelError::EmptyDataset
                | ModelError::SingularMatrix(_)
                | ModelError::NonFiniteResult
        )
    }

    /// Violations of the model contract by the caller.
    pub fn is_usage_violation(&self) -> bool {
        matches!(
            self,
            ModelError::NotFitted | ModelError::FeatureMismatch { .. }
        )
    }
}
