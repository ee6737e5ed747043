//! Randomized hyperparameter search scored on the tuning slice.

use lift_core::config::SearchConfig;
use lift_core::{LiftError, LiftResult};
use lift_features::FeatureMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::gbdt::{ConversionModel, EvalSet, GbdtParams};
use crate::metrics::roc_auc;

/// Bounded sampling ranges for the searched parameters. L2 lambda and the
/// minimum child weight stay at their defaults rather than being searched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpace {
    pub n_estimators: (usize, usize),
    pub max_depth: (usize, usize),
    pub learning_rate: (f32, f32),
    pub subsample: (f32, f32),
    pub colsample_bytree: (f32, f32),
    pub gamma: (f32, f32),
}

impl Default for ParamSpace {
    fn default() -> Self {
        Self {
            n_estimators: (100, 1000),
            max_depth: (3, 9),
            learning_rate: (0.01, 0.3),
            subsample: (0.6, 1.0),
            colsample_bytree: (0.6, 1.0),
            gamma: (0.0, 5.0),
        }
    }
}

impl ParamSpace {
    pub fn sample(&self, rng: &mut StdRng) -> GbdtParams {
        GbdtParams {
            n_estimators: rng.gen_range(self.n_estimators.0..=self.n_estimators.1),
            max_depth: rng.gen_range(self.max_depth.0..=self.max_depth.1),
            learning_rate: rng.gen_range(self.learning_rate.0..self.learning_rate.1),
            subsample: rng.gen_range(self.subsample.0..=self.subsample.1),
            colsample_bytree: rng.gen_range(self.colsample_bytree.0..=self.colsample_bytree.1),
            gamma: rng.gen_range(self.gamma.0..self.gamma.1),
            ..GbdtParams::default()
        }
    }
}

/// One completed trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: usize,
    pub params: GbdtParams,
    pub tune_auc: f64,
    /// Early-stopped round count the trial settled on.
    pub best_iteration: usize,
}

/// The retained winner plus the full trial history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best: TrialResult,
    pub trials: Vec<TrialResult>,
}

/// Run the fixed trial budget. Every trial fits on the training slice with
/// early stopping against the tuning slice and is scored by tuning AUC; the
/// incumbent is replaced only on strictly greater AUC, so ties go to the
/// first-found parameter set. An undefined tuning AUC aborts the search.
pub fn random_search(
    train_x: &FeatureMatrix,
    train_y: &[f32],
    tune_x: &FeatureMatrix,
    tune_y: &[f32],
    config: &SearchConfig,
    space: &ParamSpace,
) -> LiftResult<SearchOutcome> {
    if config.trials == 0 {
        return Err(LiftError::Config("trial budget must be positive".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut trials = Vec::with_capacity(config.trials);
    let mut best: Option<TrialResult> = None;

    for trial in 0..config.trials {
        let params = space.sample(&mut rng);
        let model = ConversionModel::fit(
            train_x,
            train_y,
            &params,
            config.seed.wrapping_add(trial as u64),
            Some(EvalSet {
                x: tune_x,
                y: tune_y,
                early_stopping_rounds: config.early_stopping_rounds,
            }),
        )?;

        let scores = model.predict_proba(tune_x)?;
        let tune_auc = roc_auc(&scores, tune_y)?;
        let result = TrialResult {
            trial,
            params,
            tune_auc,
            best_iteration: model.best_iteration().unwrap_or(model.n_trees()),
        };

        info!(
            trial,
            tune_auc,
            n_estimators = result.params.n_estimators,
            max_depth = result.params.max_depth,
            best_iteration = result.best_iteration,
            "Search trial finished"
        );

        if best.as_ref().map_or(true, |b| tune_auc > b.tune_auc) {
            best = Some(result.clone());
        }
        trials.push(result);
    }

    let best = best
        .ok_or_else(|| LiftError::Config("no search trial completed".to_string()))?;
    info!(
        best_trial = best.trial,
        best_auc = best.tune_auc,
        "Hyperparameter search finished"
    );
    Ok(SearchOutcome { best, trials })
}
