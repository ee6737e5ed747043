//! Ranking-quality metric for the binary conversion outcome.

use lift_core::{LiftError, LiftResult};

/// Area under the ROC curve, computed rank-based (Mann-Whitney) with
/// average ranks assigned to tied scores.
///
/// A label vector with a single class has no ranking to measure; that is an
/// error, never a defaulted score.
pub fn roc_auc(scores: &[f32], labels: &[f32]) -> LiftResult<f64> {
    if scores.len() != labels.len() {
        return Err(LiftError::UndefinedMetric(format!(
            "{} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }

    let n_pos = labels.iter().filter(|&&y| y >= 0.5).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(LiftError::UndefinedMetric(format!(
            "single-class labels ({n_pos} positive, {n_neg} negative)"
        )));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Sum of positive-sample ranks, averaging ranks across score ties.
    let mut rank_sum_pos = 0.0f64;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j+1 share the average rank.
        let avg_rank = (i + 1 + j + 1) as f64 / 2.0;
        for &idx in &order[i..=j] {
            if labels[idx] >= 0.5 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}
