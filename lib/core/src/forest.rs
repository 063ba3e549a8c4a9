//! RandomForest classifier
//!
//! CART trees grown to purity with gini impurity, each fit on a bootstrap
//! sample and considering a random subset of features at every split.
//! Class probabilities are the mean of the per-tree leaf distributions.
//!
//! Trees are fit in parallel but every tree owns an RNG seeded from
//! `seed + tree_index`, so a given config and dataset always produce the
//! same forest regardless of thread scheduling.

use crate::{Error, FeatureVector, Result};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

type ClassCounts = SmallVec<[usize; 2]>;

/// Number of features examined per split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
    Count(usize),
}

impl MaxFeatures {
    #[must_use]
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(c) => c,
        };
        n.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// `None` grows every tree until its leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Error::InvalidConfig("n_estimators must be positive".into()));
        }
        if self.max_depth == Some(0) {
            return Err(Error::InvalidConfig("max_depth must be positive".into()));
        }
        if self.min_samples_split < 2 {
            return Err(Error::InvalidConfig("min_samples_split must be at least 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(Error::InvalidConfig("min_samples_leaf must be positive".into()));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(Error::InvalidConfig("max_features must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        // samples reaching the node times impurity decrease
        gain: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

impl DecisionTree {
    fn fit(
        x: &[FeatureVector],
        y: &[usize],
        n_classes: usize,
        config: &ForestConfig,
        rng: &mut StdRng,
    ) -> Self {
        let n = x.len();
        let indices: Vec<usize> = if config.bootstrap {
            (0..n).map(|_| rng.random_range(0..n)).collect()
        } else {
            (0..n).collect()
        };

        let n_features = x.first().map_or(0, FeatureVector::dim);
        let builder = TreeBuilder {
            x,
            y,
            n_classes,
            n_features,
            n_try: config.max_features.resolve(n_features),
            config,
            rng,
            nodes: Vec::new(),
        };

        Self {
            nodes: builder.build(indices),
            n_features,
            n_classes,
        }
    }

    fn leaf_distribution(&self, x: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    id = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[id] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                importances[*feature] += gain;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        importances
    }

    /// Child links must point forward, features must be in range and leaves
    /// must carry one probability per class.
    fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(id, node)| match node {
                Node::Leaf { distribution } => distribution.len() == self.n_classes,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    *feature < self.n_features
                        && !threshold.is_nan()
                        && *left > id
                        && *right > id
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

struct TreeBuilder<'a> {
    x: &'a [FeatureVector],
    y: &'a [usize],
    n_classes: usize,
    n_features: usize,
    n_try: usize,
    config: &'a ForestConfig,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn build(mut self, root: Vec<usize>) -> Vec<Node> {
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        // explicit stack: unbounded trees can get deep
        let mut stack = vec![(0usize, root, 0usize)];

        while let Some((node_id, indices, depth)) = stack.pop() {
            let counts = self.class_counts(&indices);

            if !self.is_terminal(&indices, &counts, depth) {
                if let Some(split) = self.best_split(&indices, &counts) {
                    let (left, right): (Vec<usize>, Vec<usize>) = indices
                        .iter()
                        .partition(|&&i| self.x[i].as_slice()[split.feature] <= split.threshold);

                    let left_id = self.nodes.len();
                    let right_id = left_id + 1;
                    self.nodes.push(Node::Leaf {
                        distribution: Vec::new(),
                    });
                    self.nodes.push(Node::Leaf {
                        distribution: Vec::new(),
                    });
                    self.nodes[node_id] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left: left_id,
                        right: right_id,
                        gain: indices.len() as f64 * split.decrease,
                    };

                    stack.push((right_id, right, depth + 1));
                    stack.push((left_id, left, depth + 1));
                    continue;
                }
            }

            let total = indices.len().max(1) as f64;
            self.nodes[node_id] = Node::Leaf {
                distribution: counts.iter().map(|&c| c as f64 / total).collect(),
            };
        }

        self.nodes
    }

    fn class_counts(&self, indices: &[usize]) -> ClassCounts {
        let mut counts: ClassCounts = smallvec![0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn is_terminal(&self, indices: &[usize], counts: &[usize], depth: usize) -> bool {
        let n = indices.len();
        n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
            || self.config.max_depth.is_some_and(|max| depth >= max)
            || counts.iter().filter(|&&c| c > 0).count() <= 1
    }

    /// Draw features without replacement until `n_try` non-constant ones have
    /// been evaluated or the features run out.
    fn best_split(&mut self, indices: &[usize], parent: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let parent_impurity = gini(parent, n);
        let min_leaf = self.config.min_samples_leaf;

        let mut features: Vec<usize> = (0..self.n_features).collect();
        let mut remaining = self.n_features;
        let mut evaluated = 0;
        let mut best: Option<SplitCandidate> = None;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);

        while remaining > 0 && evaluated < self.n_try {
            let pick = self.rng.random_range(0..remaining);
            features.swap(pick, remaining - 1);
            remaining -= 1;
            let feature = features[remaining];

            column.clear();
            column.extend(
                indices
                    .iter()
                    .map(|&i| (self.x[i].as_slice()[feature], self.y[i])),
            );
            let first = column[0].0;
            if column.iter().all(|(v, _)| *v == first) {
                continue;
            }
            evaluated += 1;

            column.sort_by_key(|(v, _)| OrderedFloat(*v));

            let mut left: ClassCounts = smallvec![0; self.n_classes];
            let mut right: ClassCounts = parent.iter().copied().collect();

            for pos in 0..n - 1 {
                let (value, class) = column[pos];
                left[class] += 1;
                right[class] -= 1;

                let next = column[pos + 1].0;
                if next <= value {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                let decrease = parent_impurity - weighted;

                if best.as_ref().map_or(true, |b| decrease > b.decrease) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(value, next),
                        decrease,
                    });
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low / 2.0 + high / 2.0;
    if mid >= high || !mid.is_finite() {
        low
    } else {
        mid
    }
}

/// Ensemble of bootstrap-trained decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    /// Fit on a dense feature matrix with class labels `0..n_classes`
    pub fn fit(config: ForestConfig, x: &[FeatureVector], y: &[usize]) -> Result<Self> {
        config.validate()?;

        if x.is_empty() {
            return Err(Error::TrainingDataInsufficient("empty feature matrix".into()));
        }
        if x.len() != y.len() {
            return Err(Error::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        let n_features = x[0].dim();
        if let Some(row) = x.iter().find(|row| row.dim() != n_features) {
            return Err(Error::DimensionMismatch {
                expected: n_features,
                actual: row.dim(),
            });
        }

        let n_classes = y.iter().copied().max().map_or(0, |m| m + 1);
        let distinct = (0..n_classes).filter(|c| y.contains(c)).count();
        if distinct < 2 {
            return Err(Error::TrainingDataInsufficient(format!(
                "need at least two classes, got {}",
                distinct
            )));
        }

        let trees = (0..config.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                DecisionTree::fit(x, y, n_classes, &config, &mut rng)
            })
            .collect();

        Ok(Self {
            config,
            trees,
            n_features,
            n_classes,
        })
    }

    /// Mean class distribution over all trees
    pub fn predict_proba(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        self.check_dim(x)?;

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, q) in proba.iter_mut().zip(tree.leaf_distribution(x.as_slice())) {
                *p += q;
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }

    pub fn predict_proba_batch(&self, xs: &[FeatureVector]) -> Result<Vec<Vec<f64>>> {
        xs.iter().map(|x| self.predict_proba(x)).collect()
    }

    /// Probability of class 1
    pub fn positive_probability(&self, x: &FeatureVector) -> Result<f64> {
        Ok(self.predict_proba(x)?[crate::labels::POSITIVE])
    }

    /// Most probable class; ties go to the lower class index
    pub fn predict(&self, x: &FeatureVector) -> Result<usize> {
        let proba = self.predict_proba(x)?;
        let mut best = 0;
        for (class, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = class;
            }
        }
        Ok(best)
    }

    /// Mean decrease in impurity per feature, normalized to sum to 1
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in importances.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        importances
    }

    #[inline]
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[inline]
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[inline]
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Structural check for forests read back from disk
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.n_classes >= 2
            && !self.trees.is_empty()
            && self.trees.iter().all(|t| {
                t.n_features == self.n_features
                    && t.n_classes == self.n_classes
                    && t.is_well_formed()
            })
    }

    fn check_dim(&self, x: &FeatureVector) -> Result<()> {
        if x.dim() != self.n_features {
            return Err(Error::DimensionMismatch {
                expected: self.n_features,
                actual: x.dim(),
            });
        }
        Ok(())
    }
}
