//! The end-to-end training workflow: order, encode, split, search, refit,
//! and evaluate exactly once on the held-out test slice.

use chrono::{DateTime, Utc};
use lift_core::config::{SearchConfig, SplitConfig};
use lift_core::types::AnalysisRow;
use lift_core::LiftResult;
use lift_features::OneHotEncoder;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gbdt::{ConversionModel, GbdtParams};
use crate::metrics::roc_auc;
use crate::search::{random_search, ParamSpace, SearchOutcome};
use crate::split::{chronological_split, sort_chronologically};

/// A held-out AUC below this is reported as a quality problem.
pub const QUALITY_FLOOR: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f32,
}

/// Everything the run reports: slice sizes, the winning parameters, the
/// single test evaluation, and the importance ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: DateTime<Utc>,
    pub rows_total: usize,
    pub rows_train: usize,
    pub rows_tune: usize,
    pub rows_test: usize,
    pub best_params: GbdtParams,
    pub best_tune_auc: f64,
    pub final_trees: usize,
    pub test_auc: f64,
    pub low_quality: bool,
    pub feature_names: Vec<String>,
    pub feature_importance: Vec<FeatureImportance>,
}

/// Train the conversion model on the analysis table.
///
/// The table is sorted chronologically in place, encoded, and cut into the
/// 70/15/15 slices. The randomized search sees only train and tune; the
/// final model refits on train+tune (a contiguous chronological prefix)
/// with the winning parameters capped at the winning trial's early-stopped
/// iteration, and the test slice is scored once at the very end.
pub fn train_conversion_model(
    rows: &mut [AnalysisRow],
    split_config: &SplitConfig,
    search_config: &SearchConfig,
    space: &ParamSpace,
) -> LiftResult<(ConversionModel, TrainingReport)> {
    sort_chronologically(rows);

    let encoder = OneHotEncoder::fit(rows);
    let (matrix, labels) = encoder.transform(rows)?;
    info!(
        rows = matrix.n_rows(),
        features = matrix.n_features(),
        "Encoded analysis table"
    );

    let split = chronological_split(
        matrix.n_rows(),
        split_config.train_fraction,
        split_config.tune_fraction,
    )?;

    let train_x = matrix.slice_rows(split.train.clone());
    let tune_x = matrix.slice_rows(split.tune.clone());
    let test_x = matrix.slice_rows(split.test.clone());
    let train_y = &labels[split.train.clone()];
    let tune_y = &labels[split.tune.clone()];
    let test_y = &labels[split.test.clone()];

    let SearchOutcome { best, .. } =
        random_search(&train_x, train_y, &tune_x, tune_y, search_config, space)?;

    // Refit on the train+tune prefix. The tree count comes from the winning
    // trial's early-stopped iteration so the test slice never steers it.
    let final_params = GbdtParams {
        n_estimators: best.best_iteration.max(1),
        ..best.params.clone()
    };
    let head_x = matrix.slice_rows(0..split.tune.end);
    let head_y = &labels[0..split.tune.end];
    let model = ConversionModel::fit(&head_x, head_y, &final_params, search_config.seed, None)?;

    let test_scores = model.predict_proba(&test_x)?;
    let test_auc = roc_auc(&test_scores, test_y)?;
    let low_quality = test_auc < QUALITY_FLOOR;
    if low_quality {
        warn!(
            test_auc,
            floor = QUALITY_FLOOR,
            "Held-out AUC is below the quality floor; model ranks worse than chance"
        );
    }

    let feature_importance = model
        .feature_importance(matrix.names())?
        .into_iter()
        .map(|(feature, importance)| FeatureImportance {
            feature,
            importance,
        })
        .collect();

    let report = TrainingReport {
        trained_at: Utc::now(),
        rows_total: matrix.n_rows(),
        rows_train: split.train.len(),
        rows_tune: split.tune.len(),
        rows_test: split.test.len(),
        best_params: best.params,
        best_tune_auc: best.tune_auc,
        final_trees: model.n_trees(),
        test_auc,
        low_quality,
        feature_names: matrix.names().to_vec(),
        feature_importance,
    };

    info!(
        test_auc = report.test_auc,
        tune_auc = report.best_tune_auc,
        trees = report.final_trees,
        "Training finished"
    );
    Ok((model, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    /// Rows spread over a year where the High tier converts far more often,
    /// mirroring the shape of the upstream mock data.
    fn signal_rows(n: usize) -> Vec<AnalysisRow> {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let high_tier = i % 4 == 0;
                let converted = if high_tier { i % 8 != 4 } else { i % 10 == 3 };
                AnalysisRow {
                    session_id: format!("session_{i}"),
                    user_id: format!("user_{}", i % 25),
                    session_start: start + Duration::hours(i as i64 * 3),
                    utm_source: Some(if i % 2 == 0 { "google" } else { "facebook" }.to_string()),
                    utm_medium: Some("cpc".to_string()),
                    campaign_id: Some(format!("campaign_{}", i % 5)),
                    converted,
                    campaign_name: None,
                    campaign_start: Some(start),
                    spend: if high_tier { 20_000.0 } else { 2_000.0 },
                    creative_format: Some(if high_tier { "video" } else { "static" }.to_string()),
                    creative_theme: Some("Evergreen".to_string()),
                    effectiveness_tier: Some(if high_tier { "High" } else { "Low" }.to_string()),
                    matched_campaign: true,
                    gross_revenue: 0.0,
                }
            })
            .collect()
    }

    fn fast_search() -> (SearchConfig, ParamSpace) {
        (
            SearchConfig {
                trials: 3,
                seed: 42,
                early_stopping_rounds: 5,
            },
            ParamSpace {
                n_estimators: (10, 30),
                max_depth: (2, 4),
                ..ParamSpace::default()
            },
        )
    }

    #[test]
    fn reports_slice_sizes_and_learns_the_signal() {
        let mut rows = signal_rows(200);
        let (config, space) = fast_search();
        let (model, report) =
            train_conversion_model(&mut rows, &SplitConfig::default(), &config, &space).unwrap();

        assert_eq!(report.rows_train, 140);
        assert_eq!(report.rows_tune, 30);
        assert_eq!(report.rows_test, 30);
        assert_eq!(report.rows_total, 200);
        assert!(report.test_auc > 0.6, "test AUC {} too low", report.test_auc);
        assert!(!report.low_quality);
        assert_eq!(report.final_trees, model.n_trees());
        assert_eq!(report.feature_names.len(), model.n_features());
        assert_eq!(
            report.feature_importance.len(),
            report.feature_names.len()
        );
    }

    #[test]
    fn tiny_table_fails_with_degenerate_split() {
        let mut rows = signal_rows(6);
        let (config, space) = fast_search();
        let err =
            train_conversion_model(&mut rows, &SplitConfig::default(), &config, &space)
                .unwrap_err();
        assert!(matches!(err, lift_core::LiftError::DegenerateSplit(_)));
    }

    #[test]
    fn importance_sums_to_one_and_is_sorted() {
        let mut rows = signal_rows(200);
        let (config, space) = fast_search();
        let (_, report) =
            train_conversion_model(&mut rows, &SplitConfig::default(), &config, &space).unwrap();

        let total: f32 = report.feature_importance.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-4);
        for pair in report.feature_importance.windows(2) {
            assert!(pair[0].importance >= pair[1].importance);
        }
    }
}
