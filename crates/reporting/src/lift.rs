//! Budget lift forecasting through the trained conversion model.
//!
//! The forecast scores a sample twice: once as-is and once with the spend
//! feature scaled up by the proposed budget increase. The summed
//! probability delta is the predicted incremental conversion count.

use lift_core::types::OrderRecord;
use lift_core::{LiftError, LiftResult};
use lift_features::{align_to, FeatureMatrix};
use lift_model::ModelArtifact;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiftForecast {
    pub budget_increase_pct: f64,
    pub sessions_scored: usize,
    pub baseline_expected_conversions: f64,
    pub incremental_conversions: f64,
    pub incremental_revenue: f64,
}

/// Mean order value used to turn incremental conversions into revenue.
pub fn average_order_value(orders: &[OrderRecord]) -> f64 {
    if orders.is_empty() {
        return 0.0;
    }
    orders.iter().map(|o| o.gross_revenue).sum::<f64>() / orders.len() as f64
}

/// Forecast the incremental conversions and revenue of raising spend by
/// `budget_increase_pct` percent on the given (not yet aligned) feature
/// matrix. The matrix must produce a `spend` column after alignment.
pub fn forecast_lift(
    artifact: &ModelArtifact,
    matrix: &FeatureMatrix,
    budget_increase_pct: f64,
    avg_order_value: f64,
) -> LiftResult<LiftForecast> {
    if budget_increase_pct < 0.0 {
        return Err(LiftError::Config(format!(
            "budget increase must be non-negative, got {budget_increase_pct}"
        )));
    }

    let aligned = align_to(matrix, &artifact.feature_names)?;
    let spend_column = aligned.column_index("spend").ok_or_else(|| {
        LiftError::FeatureMismatch(
            "model feature list has no 'spend' column to scale".to_string(),
        )
    })?;

    let baseline = artifact.model.predict_proba(&aligned)?;

    let mut scaled = aligned;
    scaled.scale_column(spend_column, 1.0 + (budget_increase_pct / 100.0) as f32);
    let lifted = artifact.model.predict_proba(&scaled)?;

    let baseline_expected_conversions: f64 = baseline.iter().map(|&p| p as f64).sum();
    let incremental_conversions: f64 = lifted
        .iter()
        .zip(baseline.iter())
        .map(|(&new, &old)| (new - old) as f64)
        .sum();
    let incremental_revenue = incremental_conversions * avg_order_value;

    info!(
        budget_increase_pct,
        sessions = baseline.len(),
        incremental_conversions,
        incremental_revenue,
        "Lift forecast computed"
    );
    Ok(LiftForecast {
        budget_increase_pct,
        sessions_scored: baseline.len(),
        baseline_expected_conversions,
        incremental_conversions,
        incremental_revenue,
    })
}
