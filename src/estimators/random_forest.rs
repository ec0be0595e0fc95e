use std::collections::BTreeMap;

use ndarray::{Array1, ArrayBase, ArrayView2, Data, Ix1, Ix2};
use rand::rngs::StdRng;
use rand::Rng;

use super::error::{ModelError, Result};
use super::hyperparams::{RandomForestParams, RandomForestValidParams};
use super::summary::ModelSummary;
use super::traits::{Fit, Model};
use super::{check_dataset, check_features, log_fit_failure, new_rng};
use crate::datasets::{DatasetBase, DatasetView};
use crate::tree::{total_importances, EnsembleMember, TreeLimits, VarianceTreeBuilder};
use crate::Float;

/// Random Forest
///
/// Bagged ensemble of variance-reduction regression trees. Every tree is grown
/// on a bootstrap sample of the rows (or on all of them) and draws a fresh
/// subset of candidate columns at each node. Predictions average the trees.
#[derive(Debug, Clone)]
pub struct RandomForest<F> {
    params: RandomForestValidParams,
    rng: StdRng,
    fitted: Option<FittedForest<F>>,
}

#[derive(Debug, Clone)]
struct FittedForest<F> {
    members: Vec<EnsembleMember<F>>,
    n_features: usize,
    summary: ModelSummary<F>,
}

impl<F: Float> Default for RandomForest<F> {
    fn default() -> Self {
        Self::new(RandomForestValidParams::default())
    }
}

impl<F: Float> RandomForest<F> {
    /// Creates an unfitted forest. The random generator is seeded from
    /// `random_state` when set, from system entropy otherwise.
    pub fn new(params: RandomForestValidParams) -> Self {
        RandomForest {
            rng: new_rng(params.random_state()),
            params,
            fitted: None,
        }
    }

    pub fn params() -> RandomForestParams {
        RandomForestParams::new()
    }

    pub fn hyperparameters(&self) -> &RandomForestValidParams {
        &self.params
    }

    /// Trees of the fitted forest with their importance accumulators.
    pub fn members(&self) -> Result<&[EnsembleMember<F>]> {
        Ok(&self.state()?.members)
    }

    fn state(&self) -> Result<&FittedForest<F>> {
        self.fitted.as_ref().ok_or(ModelError::NotFitted)
    }

    fn average(members: &[EnsembleMember<F>], x: ArrayView2<F>) -> Array1<F> {
        let sum = members
            .iter()
            .fold(Array1::zeros(x.nrows()), |acc, member| acc + member.tree.predict(x));
        sum / F::cast(members.len().max(1))
    }

    fn train(&mut self, dataset: &DatasetView<'_, F>) -> Result<FittedForest<F>> {
        check_dataset(dataset)?;

        let x = dataset.design_matrix().view();
        let y = dataset.targets().view();
        let (n_samples, n_features) = x.dim();
        let max_features = self.params.max_features().resolve(n_features);
        let limits = TreeLimits {
            max_depth: self.params.max_depth(),
            min_samples_split: self.params.min_samples_split(),
            min_samples_leaf: self.params.min_samples_leaf(),
        };

        let mut members = Vec::with_capacity(self.params.n_estimators());
        for t in 0..self.params.n_estimators() {
            let samples: Vec<usize> = if self.params.bootstrap() {
                (0..n_samples)
                    .map(|_| self.rng.gen_range(0..n_samples))
                    .collect()
            } else {
                (0..n_samples).collect()
            };
            let member =
                VarianceTreeBuilder::new(x, y, limits, max_features, &mut self.rng).build(samples);
            log::debug!(
                "tree {} :: {} nodes, depth {}",
                t + 1,
                member.tree.nodes().len(),
                member.tree.depth()
            );
            members.push(member);
        }

        let fitted = Self::average(&members, x);
        let raw_importances = total_importances(&members, n_features);

        Ok(FittedForest {
            summary: ModelSummary::new(dataset, fitted.view(), raw_importances.view()),
            members,
            n_features,
        })
    }
}

impl<F: Float> Model<F> for RandomForest<F> {
    fn name(&self) -> &'static str {
        "Random Forest"
    }

    fn description(&self) -> String {
        format!(
            "Random Forest Regression with {} trees.",
            self.params.n_estimators()
        )
    }

    fn fit(&mut self, dataset: &DatasetView<'_, F>) -> Result<()> {
        log::info!(
            "fitting {} on {} samples with {} features",
            self.name(),
            dataset.n_samples(),
            dataset.n_features()
        );
        let outcome = self.train(dataset);
        let fitted = log_fit_failure(self.name(), outcome)?;
        log::info!(
            "{} fitted with {} trees, r_squared = {}",
            self.name(),
            fitted.members.len(),
            fitted.summary.statistics.r_squared
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<F>) -> Result<Array1<F>> {
        let state = self.state()?;
        check_features(state.n_features, &x)?;
        Ok(Self::average(&state.members, x))
    }

    fn parameters(&self) -> Result<BTreeMap<String, F>> {
        let state = self.state()?;
        let mut params = BTreeMap::new();
        params.insert("n_estimators".to_string(), F::cast(self.params.n_estimators()));
        params.insert("max_depth".to_string(), F::cast(self.params.max_depth()));
        params.insert(
            "min_samples_split".to_string(),
            F::cast(self.params.min_samples_split()),
        );
        params.insert(
            "min_samples_leaf".to_string(),
            F::cast(self.params.min_samples_leaf()),
        );
        params.insert(
            "max_features".to_string(),
            F::cast(self.params.max_features().resolve(state.n_features)),
        );
        let bootstrap = if self.params.bootstrap() { F::one() } else { F::zero() };
        params.insert("bootstrap".to_string(), bootstrap);
        Ok(params)
    }

    fn statistics(&self) -> Result<BTreeMap<String, F>> {
        let state = self.state()?;
        let mut stats = state.summary.statistics_map();
        stats.insert("n_trees".to_string(), F::cast(state.members.len()));
        Ok(stats)
    }

    fn feature_importance(&self) -> Result<BTreeMap<String, F>> {
        Ok(self.state()?.summary.importance_map())
    }

    fn variable_names(&self) -> &[String] {
        self.fitted
            .as_ref()
            .map(|state| state.summary.variable_names.as_slice())
            .unwrap_or(&[])
    }

    fn target_name(&self) -> &str {
        self.fitted
            .as_ref()
            .map_or("", |state| state.summary.target_name.as_str())
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|state| state.n_features)
    }
}

impl<F: Float, D: Data<Elem = F>, S: Data<Elem = F>>
    Fit<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>, ModelError> for RandomForestValidParams
{
    type Object = RandomForest<F>;

    /// Grows a random forest on a dense design matrix
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<S, Ix1>>) -> Result<Self::Object> {
        let mut model = RandomForest::new(self.clone());
        Model::fit(&mut model, &dataset.view())?;
        Ok(model)
    }
}
