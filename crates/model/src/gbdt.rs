//! Gradient boosted trees for the binary conversion outcome.
//!
//! Boosting follows the usual second-order recipe for logistic loss: start
//! from the prior log-odds, then per round fit a regression tree to the
//! gradients g = p - y and hessians h = p * (1 - p), with per-round row
//! subsampling and per-tree column subsampling. An optional evaluation set
//! drives early stopping on AUC; the kept ensemble is truncated to the best
//! observed iteration.

use lift_core::{LiftError, LiftResult};
use lift_features::FeatureMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::roc_auc;
use crate::tree::RegressionTree;

/// Boosting hyperparameters, the set the randomized search samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    /// Boosting rounds (trees).
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf weight.
    pub learning_rate: f32,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Row fraction sampled per boosting round.
    pub subsample: f32,
    /// Column fraction sampled per tree.
    pub colsample_bytree: f32,
    /// Minimum loss reduction required to keep a split.
    pub gamma: f32,
    /// L2 regularization on leaf weights.
    pub lambda: f32,
    /// Minimum hessian sum per child.
    pub min_child_weight: f32,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
            colsample_bytree: 1.0,
            gamma: 0.0,
            lambda: 1.0,
            min_child_weight: 1.0,
        }
    }
}

impl GbdtParams {
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn validate(&self) -> LiftResult<()> {
        let fraction_ok = |v: f32| v > 0.0 && v <= 1.0;
        if self.n_estimators == 0
            || self.learning_rate <= 0.0
            || self.max_depth == 0
            || !fraction_ok(self.subsample)
            || !fraction_ok(self.colsample_bytree)
            || self.gamma < 0.0
            || self.lambda < 0.0
            || self.min_child_weight < 0.0
        {
            return Err(LiftError::Config(format!(
                "invalid boosting parameters: {self:?}"
            )));
        }
        Ok(())
    }
}

/// Held-out slice evaluated after every boosting round.
pub struct EvalSet<'a> {
    pub x: &'a FeatureMatrix,
    pub y: &'a [f32],
    pub early_stopping_rounds: usize,
}

/// A fitted conversion classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionModel {
    params: GbdtParams,
    init_score: f32,
    n_features: usize,
    trees: Vec<RegressionTree>,
    best_iteration: Option<usize>,
    best_eval_score: Option<f64>,
}

impl ConversionModel {
    /// Fit on `x`/`y`, optionally early-stopping against `eval`.
    ///
    /// A single-class evaluation slice makes the stopping metric undefined
    /// and aborts the fit; the training slice itself may be single-class
    /// (the ensemble then just learns the prior).
    pub fn fit(
        x: &FeatureMatrix,
        y: &[f32],
        params: &GbdtParams,
        seed: u64,
        eval: Option<EvalSet<'_>>,
    ) -> LiftResult<Self> {
        params.validate()?;
        if x.n_rows() != y.len() {
            return Err(LiftError::Config(format!(
                "{} rows for {} labels",
                x.n_rows(),
                y.len()
            )));
        }
        if x.n_rows() == 0 {
            return Err(LiftError::Config("cannot fit on an empty matrix".to_string()));
        }

        let n = x.n_rows();
        let m = x.n_features();
        let mut rng = StdRng::seed_from_u64(seed);

        let positives = y.iter().filter(|&&v| v >= 0.5).count();
        let p = positives as f32 / n as f32;
        let init_score = if p > 0.0 && p < 1.0 {
            (p / (1.0 - p)).ln()
        } else if p >= 1.0 {
            5.0
        } else {
            -5.0
        };

        let mut raw: Vec<f32> = vec![init_score; n];
        let mut eval_raw: Vec<f32> = eval.as_ref().map_or_else(Vec::new, |e| {
            vec![init_score; e.x.n_rows()]
        });

        let mut trees: Vec<RegressionTree> = Vec::with_capacity(params.n_estimators);
        let mut best_auc: Option<f64> = None;
        let mut best_iteration = 0usize;
        let mut rounds_since_best = 0usize;

        let mut grad = vec![0.0f32; n];
        let mut hess = vec![0.0f32; n];

        for round in 0..params.n_estimators {
            for i in 0..n {
                let prob = sigmoid(raw[i]);
                grad[i] = prob - y[i];
                hess[i] = prob * (1.0 - prob);
            }

            let rows = sample_indices(n, params.subsample, &mut rng);
            let columns = sample_indices(m, params.colsample_bytree, &mut rng);
            let tree = RegressionTree::fit(x.values(), &grad, &hess, rows, &columns, params);

            for i in 0..n {
                raw[i] += params.learning_rate * tree.predict_row(&x.row(i));
            }
            if let Some(eval_set) = eval.as_ref() {
                for i in 0..eval_set.x.n_rows() {
                    eval_raw[i] += params.learning_rate * tree.predict_row(&eval_set.x.row(i));
                }
            }
            trees.push(tree);

            if let Some(eval_set) = eval.as_ref() {
                let scores: Vec<f32> = eval_raw.iter().map(|&r| sigmoid(r)).collect();
                let auc = roc_auc(&scores, eval_set.y)?;
                if best_auc.map_or(true, |b| auc > b) {
                    best_auc = Some(auc);
                    best_iteration = round + 1;
                    rounds_since_best = 0;
                } else {
                    rounds_since_best += 1;
                    if rounds_since_best >= eval_set.early_stopping_rounds {
                        debug!(
                            round,
                            best_iteration,
                            best_auc = best_auc.unwrap_or(f64::NAN),
                            "Early stopping"
                        );
                        break;
                    }
                }
            }
        }

        if eval.is_some() {
            trees.truncate(best_iteration);
        }

        Ok(Self {
            params: params.clone(),
            init_score,
            n_features: m,
            trees,
            best_iteration: eval.as_ref().map(|_| best_iteration),
            best_eval_score: best_auc,
        })
    }

    /// Conversion probability per row. The matrix must already be aligned
    /// to the columns the model was fit on.
    pub fn predict_proba(&self, x: &FeatureMatrix) -> LiftResult<Vec<f32>> {
        if x.n_features() != self.n_features {
            return Err(LiftError::FeatureMismatch(format!(
                "model expects {} features, matrix has {}",
                self.n_features,
                x.n_features()
            )));
        }
        let mut probs = Vec::with_capacity(x.n_rows());
        for i in 0..x.n_rows() {
            let row = x.row(i);
            let mut raw = self.init_score;
            for tree in &self.trees {
                raw += self.params.learning_rate * tree.predict_row(&row);
            }
            probs.push(sigmoid(raw));
        }
        Ok(probs)
    }

    /// Gain-based importance ranking over the named input features,
    /// normalized to sum to 1.0, highest first.
    pub fn feature_importance(&self, names: &[String]) -> LiftResult<Vec<(String, f32)>> {
        if names.len() != self.n_features {
            return Err(LiftError::FeatureMismatch(format!(
                "model expects {} features, got {} names",
                self.n_features,
                names.len()
            )));
        }
        let mut gains = vec![0.0f32; self.n_features];
        for tree in &self.trees {
            tree.for_each_split(|feature, gain| gains[feature] += gain);
        }
        let total: f32 = gains.iter().sum();
        let mut ranked: Vec<(String, f32)> = names
            .iter()
            .cloned()
            .zip(gains.into_iter().map(|g| if total > 0.0 { g / total } else { 0.0 }))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    /// Best round observed against the eval set, if one was supplied.
    pub fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }

    /// Eval AUC at the best iteration, if an eval set was supplied.
    pub fn best_eval_score(&self) -> Option<f64> {
        self.best_eval_score
    }
}

fn sample_indices(n: usize, fraction: f32, rng: &mut StdRng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    if fraction < 1.0 {
        let keep = ((fraction as f64 * n as f64).floor() as usize).max(1);
        indices.shuffle(rng);
        indices.truncate(keep);
    }
    indices
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
