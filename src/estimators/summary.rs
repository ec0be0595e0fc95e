use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView1};

use crate::datasets::DatasetView;
use crate::helpers::helpers::{normalize_importances, resolve_target_name, resolve_variable_names};
use crate::metrics::RegressionStatistics;
use crate::Float;

/// Training-time record kept by every fitted model: the resolved names, the
/// goodness-of-fit statistics and the normalized feature importances.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary<F> {
    pub variable_names: Vec<String>,
    pub target_name: String,
    pub statistics: RegressionStatistics<F>,
    pub importances: Array1<F>,
}

impl<F: Float> ModelSummary<F> {
    pub fn new(
        dataset: &DatasetView<'_, F>,
        fitted: ArrayView1<F>,
        raw_importances: ArrayView1<F>,
    ) -> Self {
        let n_features = dataset.n_features();
        ModelSummary {
            variable_names: resolve_variable_names(dataset.feature_names(), n_features),
            target_name: resolve_target_name(dataset.target_name()),
            statistics: RegressionStatistics::compute(dataset.targets().view(), fitted, n_features),
            importances: normalize_importances(raw_importances),
        }
    }

    pub fn n_features(&self) -> usize {
        self.variable_names.len()
    }

    /// Pairs each variable name with the matching entry of `values`.
    pub fn named(&self, values: ArrayView1<F>) -> BTreeMap<String, F> {
        self.variable_names
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect()
    }

    pub fn importance_map(&self) -> BTreeMap<String, F> {
        self.named(self.importances.view())
    }

    pub fn statistics_map(&self) -> BTreeMap<String, F> {
        self.statistics.to_map()
    }
}
