use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::seq::index;
use rand::Rng;

use crate::estimators::hyperparams::ImportanceType;
use crate::helpers::helpers::argsort_by;
use crate::Float;

#[cfg(test)]
mod tests;

/// Node variance below which a node is not split any further.
const VARIANCE_FLOOR: f64 = 1e-6;

/// Stabilizer added to every hessian sum of a Newton tree.
pub const HESSIAN_EPSILON: f64 = 1e-6;

/// A node of a regression tree. Children are indices into the arena of the
/// owning [`Tree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node<F> {
    Leaf {
        value: F,
    },
    Split {
        feature: usize,
        threshold: F,
        left: usize,
        right: usize,
    },
}

/// Regression tree stored as a flat arena of nodes, the root at index 0.
/// Rows with `x[feature] <= threshold` are routed to the left child.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree<F> {
    nodes: Vec<Node<F>>,
}

impl<F: Float> Tree<F> {
    /// A tree made of a single leaf.
    pub fn leaf(value: F) -> Self {
        Tree {
            nodes: vec![Node::Leaf { value }],
        }
    }

    pub fn nodes(&self) -> &[Node<F>] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        fn walk<F>(nodes: &[Node<F>], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn predict_row(&self, row: ArrayView1<F>) -> F {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn predict(&self, x: ArrayView2<F>) -> Array1<F> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_row(row))
            .collect()
    }
}

/// One tree of an ensemble with the importance it credits to each feature.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleMember<F> {
    pub tree: Tree<F>,
    pub importances: Array1<F>,
}

/// Sums the importance accumulators of every member of an ensemble.
pub fn total_importances<F: Float>(members: &[EnsembleMember<F>], n_features: usize) -> Array1<F> {
    members
        .iter()
        .fold(Array1::zeros(n_features), |acc, member| acc + &member.importances)
}

/// Size limits of a variance-reduction tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate<F> {
    feature: usize,
    threshold: F,
    score: F,
}

/// Threshold halfway between two distinct consecutive values, falling back
/// to the lower one when the midpoint rounds up to the upper value.
fn midpoint<F: Float>(lower: F, upper: F) -> F {
    let mid = (lower + upper) / F::cast(2.);
    if mid < upper {
        mid
    } else {
        lower
    }
}

/// Orders the rows of `samples` by the value of `feature`.
fn sort_by_feature<F: Float>(x: ArrayView2<F>, samples: &[usize], feature: usize) -> Vec<usize> {
    let values: Array1<F> = samples.iter().map(|&i| x[[i, feature]]).collect();
    argsort_by(&values, |a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .into_iter()
        .map(|k| samples[k])
        .collect()
}

fn partition<F: Float>(
    x: ArrayView2<F>,
    samples: &[usize],
    feature: usize,
    threshold: F,
) -> (Vec<usize>, Vec<usize>) {
    samples.iter().partition(|&&i| x[[i, feature]] <= threshold)
}

/// Grows a regression tree minimizing the squared error of `y`.
///
/// A node becomes a leaf holding the mean of its targets when the depth limit
/// is reached, when it holds fewer than `min_samples_split` or at most
/// `min_samples_leaf` rows, or when its variance is below `1e-6`. Otherwise
/// `max_features` candidate columns are drawn (every column when
/// `max_features` covers them all, without touching `rng`) and every midpoint
/// between consecutive distinct values is scored by its variance reduction.
/// The best split is kept only if it reduces the variance; its reduction
/// times the node size is credited to the split feature.
pub struct VarianceTreeBuilder<'a, 'b, 'r, F, R> {
    x: ArrayView2<'a, F>,
    y: ArrayView1<'b, F>,
    limits: TreeLimits,
    max_features: usize,
    rng: &'r mut R,
    nodes: Vec<Node<F>>,
    importances: Array1<F>,
}

impl<'a, 'b, 'r, F: Float, R: Rng> VarianceTreeBuilder<'a, 'b, 'r, F, R> {
    pub fn new(
        x: ArrayView2<'a, F>,
        y: ArrayView1<'b, F>,
        limits: TreeLimits,
        max_features: usize,
        rng: &'r mut R,
    ) -> Self {
        let n_features = x.ncols();
        VarianceTreeBuilder {
            x,
            y,
            limits,
            max_features: max_features.clamp(1, n_features.max(1)),
            rng,
            nodes: Vec::new(),
            importances: Array1::zeros(n_features),
        }
    }

    /// Grows the tree on the given rows. Rows may repeat.
    pub fn build(mut self, samples: Vec<usize>) -> EnsembleMember<F> {
        if samples.is_empty() {
            return EnsembleMember {
                tree: Tree::leaf(F::zero()),
                importances: self.importances,
            };
        }
        self.grow(samples, 0);
        EnsembleMember {
            tree: Tree { nodes: self.nodes },
            importances: self.importances,
        }
    }

    fn mean_and_variance(&self, samples: &[usize]) -> (F, F) {
        let n = F::cast(samples.len());
        let mean = samples.iter().fold(F::zero(), |acc, &i| acc + self.y[i]) / n;
        let var = samples
            .iter()
            .fold(F::zero(), |acc, &i| acc + (self.y[i] - mean) * (self.y[i] - mean))
            / n;
        (mean, var)
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let n_node = samples.len();
        let (mean, variance) = self.mean_and_variance(&samples);

        if depth >= self.limits.max_depth
            || n_node < self.limits.min_samples_split
            || n_node <= self.limits.min_samples_leaf
            || variance < F::cast(VARIANCE_FLOOR)
        {
            return self.push(Node::Leaf { value: mean });
        }

        let best = match self.find_best_split(&samples, variance) {
            Some(best) if best.score > F::zero() => best,
            _ => return self.push(Node::Leaf { value: mean }),
        };

        self.importances[best.feature] += best.score * F::cast(n_node);

        let (left_samples, right_samples) =
            partition(self.x, &samples, best.feature, best.threshold);
        let idx = self.push(Node::Leaf { value: mean });
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn push(&mut self, node: Node<F>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        if self.max_features >= n_features {
            (0..n_features).collect()
        } else {
            index::sample(&mut *self.rng, n_features, self.max_features).into_vec()
        }
    }

    fn find_best_split(&mut self, samples: &[usize], variance: F) -> Option<SplitCandidate<F>> {
        let n_node = samples.len();
        let n = F::cast(n_node);
        let min_leaf = self.limits.min_samples_leaf;
        let mut best: Option<SplitCandidate<F>> = None;

        for feature in self.candidate_features() {
            let sorted = sort_by_feature(self.x, samples, feature);
            let total = sorted.iter().fold(F::zero(), |acc, &i| acc + self.y[i]);
            let total_sq = sorted
                .iter()
                .fold(F::zero(), |acc, &i| acc + self.y[i] * self.y[i]);

            let mut left_sum = F::zero();
            let mut left_sq = F::zero();
            for pos in 1..n_node {
                let prev = sorted[pos - 1];
                left_sum += self.y[prev];
                left_sq += self.y[prev] * self.y[prev];

                let lower = self.x[[prev, feature]];
                let upper = self.x[[sorted[pos], feature]];
                if !(lower < upper) || pos < min_leaf || n_node - pos < min_leaf {
                    continue;
                }

                let n_left = F::cast(pos);
                let n_right = F::cast(n_node - pos);
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let var_left = (left_sq / n_left - (left_sum / n_left).powi(2)).max(F::zero());
                let var_right = (right_sq / n_right - (right_sum / n_right).powi(2)).max(F::zero());
                let score = variance - (n_left * var_left + n_right * var_right) / n;

                if best.map_or(true, |b| score > b.score) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(lower, upper),
                        score,
                    });
                }
            }
        }
        best
    }
}

/// Limits and regularization of a Newton tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonLimits<F> {
    pub max_depth: usize,
    pub min_child_weight: F,
    pub gamma: F,
}

/// Grows a tree on first and second order derivatives of the loss.
///
/// Splits are scored by the exact greedy gain
/// `G_L^2 / (H_L + eps) + G_R^2 / (H_R + eps) - G^2 / (H + eps)` over the
/// given columns; a candidate leaving a child with a hessian sum below
/// `min_child_weight` is skipped, and the node becomes a leaf when the best
/// gain does not exceed `gamma`. Leaves hold the Newton step
/// `-G / (H + eps)`.
pub struct NewtonTreeBuilder<'a, 'b, F> {
    x: ArrayView2<'a, F>,
    gradients: ArrayView1<'b, F>,
    hessians: ArrayView1<'b, F>,
    features: Vec<usize>,
    limits: NewtonLimits<F>,
    importance_type: ImportanceType,
    nodes: Vec<Node<F>>,
    importances: Array1<F>,
}

impl<'a, 'b, F: Float> NewtonTreeBuilder<'a, 'b, F> {
    pub fn new(
        x: ArrayView2<'a, F>,
        gradients: ArrayView1<'b, F>,
        hessians: ArrayView1<'b, F>,
        features: Vec<usize>,
        limits: NewtonLimits<F>,
        importance_type: ImportanceType,
    ) -> Self {
        let n_features = x.ncols();
        NewtonTreeBuilder {
            x,
            gradients,
            hessians,
            features,
            limits,
            importance_type,
            nodes: Vec::new(),
            importances: Array1::zeros(n_features),
        }
    }

    pub fn build(mut self, samples: Vec<usize>) -> EnsembleMember<F> {
        if samples.is_empty() {
            return EnsembleMember {
                tree: Tree::leaf(F::zero()),
                importances: self.importances,
            };
        }
        self.grow(samples, 0);
        EnsembleMember {
            tree: Tree { nodes: self.nodes },
            importances: self.importances,
        }
    }

    fn sums(&self, samples: &[usize]) -> (F, F) {
        samples.iter().fold((F::zero(), F::zero()), |(g, h), &i| {
            (g + self.gradients[i], h + self.hessians[i])
        })
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let eps = F::cast(HESSIAN_EPSILON);
        let (grad_sum, hess_sum) = self.sums(&samples);
        let leaf_value = -grad_sum / (hess_sum + eps);

        if depth >= self.limits.max_depth || F::cast(samples.len()) <= self.limits.min_child_weight {
            return self.push(Node::Leaf { value: leaf_value });
        }

        let best = match self.find_best_split(&samples, grad_sum, hess_sum) {
            Some(best) if best.score > self.limits.gamma => best,
            _ => return self.push(Node::Leaf { value: leaf_value }),
        };

        let (left_samples, right_samples) =
            partition(self.x, &samples, best.feature, best.threshold);
        if left_samples.is_empty() || right_samples.is_empty() {
            return self.push(Node::Leaf { value: leaf_value });
        }

        self.importances[best.feature] += match self.importance_type {
            ImportanceType::Weight => F::one(),
            ImportanceType::Gain => best.score,
        };

        let idx = self.push(Node::Leaf { value: leaf_value });
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn push(&mut self, node: Node<F>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn find_best_split(
        &self,
        samples: &[usize],
        grad_sum: F,
        hess_sum: F,
    ) -> Option<SplitCandidate<F>> {
        let eps = F::cast(HESSIAN_EPSILON);
        let parent_score = grad_sum * grad_sum / (hess_sum + eps);
        let mut best: Option<SplitCandidate<F>> = None;

        for &feature in &self.features {
            let sorted = sort_by_feature(self.x, samples, feature);
            let mut left_grad = F::zero();
            let mut left_hess = F::zero();

            for pos in 1..sorted.len() {
                let prev = sorted[pos - 1];
                left_grad += self.gradients[prev];
                left_hess += self.hessians[prev];

                let lower = self.x[[prev, feature]];
                let upper = self.x[[sorted[pos], feature]];
                if !(lower < upper) {
                    continue;
                }
                let right_grad = grad_sum - left_grad;
                let right_hess = hess_sum - left_hess;
                if left_hess < self.limits.min_child_weight
                    || right_hess < self.limits.min_child_weight
                {
                    continue;
                }

                let gain = left_grad * left_grad / (left_hess + eps)
                    + right_grad * right_grad / (right_hess + eps)
                    - parent_score;
                if best.map_or(true, |b| gain > b.score) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(lower, upper),
                        score: gain,
                    });
                }
            }
        }
        best
    }
}
