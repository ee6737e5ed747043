//! Chronological 70/15/15 partitioning of the analysis table.
//!
//! Records are ordered by session start and cut into three contiguous
//! slices: train, tune, test. No shuffling, so nothing later in time can
//! leak into an earlier slice.

use lift_core::types::AnalysisRow;
use lift_core::{LiftError, LiftResult};
use std::ops::Range;
use tracing::info;

/// Contiguous index ranges into the chronologically sorted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Range<usize>,
    pub tune: Range<usize>,
    pub test: Range<usize>,
}

/// Stable sort by session start; equal timestamps keep input order.
pub fn sort_chronologically(rows: &mut [AnalysisRow]) {
    rows.sort_by_key(|row| row.session_start);
}

/// Partition `n` time-ordered records into train/tune/test slices of sizes
/// floor(train_fraction * n), floor(tune_fraction * n), and the remainder.
/// An empty tune or test slice makes downstream AUC scoring meaningless, so
/// it is an error here rather than a degenerate metric later.
pub fn chronological_split(
    n: usize,
    train_fraction: f64,
    tune_fraction: f64,
) -> LiftResult<SplitIndices> {
    if !(train_fraction > 0.0 && tune_fraction > 0.0 && train_fraction + tune_fraction < 1.0) {
        return Err(LiftError::Config(format!(
            "invalid split fractions train={train_fraction} tune={tune_fraction}"
        )));
    }

    let train_len = (train_fraction * n as f64).floor() as usize;
    let tune_len = (tune_fraction * n as f64).floor() as usize;
    let test_len = n - train_len - tune_len;

    if train_len == 0 {
        return Err(LiftError::DegenerateSplit(format!(
            "training slice is empty for {n} records"
        )));
    }
    if tune_len == 0 {
        return Err(LiftError::DegenerateSplit(format!(
            "tuning slice is empty for {n} records"
        )));
    }
    if test_len == 0 {
        return Err(LiftError::DegenerateSplit(format!(
            "test slice is empty for {n} records"
        )));
    }

    let split = SplitIndices {
        train: 0..train_len,
        tune: train_len..train_len + tune_len,
        test: train_len + tune_len..n,
    };
    info!(
        total = n,
        train = train_len,
        tune = tune_len,
        test = test_len,
        "Chronological split computed"
    );
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousand_rows_split_700_150_150() {
        let split = chronological_split(1000, 0.70, 0.15).unwrap();
        assert_eq!(split.train, 0..700);
        assert_eq!(split.tune, 700..850);
        assert_eq!(split.test, 850..1000);
    }

    #[test]
    fn sizes_sum_and_slices_stay_contiguous() {
        for n in [7, 20, 33, 101, 999, 12345] {
            let split = chronological_split(n, 0.70, 0.15).unwrap();
            assert_eq!(split.train.start, 0);
            assert_eq!(split.train.end, split.tune.start);
            assert_eq!(split.tune.end, split.test.start);
            assert_eq!(split.test.end, n);
            assert_eq!(
                split.train.len() + split.tune.len() + split.test.len(),
                n
            );
            assert_eq!(split.train.len(), (0.70 * n as f64).floor() as usize);
            assert_eq!(split.tune.len(), (0.15 * n as f64).floor() as usize);
        }
    }

    #[test]
    fn tiny_table_is_degenerate() {
        for n in [0, 1, 2, 5, 6] {
            let err = chronological_split(n, 0.70, 0.15).unwrap_err();
            assert!(matches!(err, LiftError::DegenerateSplit(_)), "n={n}");
        }
        // 7 is the smallest table with all three slices non-empty.
        assert!(chronological_split(7, 0.70, 0.15).is_ok());
    }

    #[test]
    fn bad_fractions_are_config_errors() {
        assert!(matches!(
            chronological_split(100, 0.0, 0.15),
            Err(LiftError::Config(_))
        ));
        assert!(matches!(
            chronological_split(100, 0.9, 0.2),
            Err(LiftError::Config(_))
        ));
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        use chrono::{TimeZone, Utc};
        use lift_core::types::AnalysisRow;

        let make = |id: &str, hour: u32| AnalysisRow {
            session_id: id.to_string(),
            user_id: "user_1".to_string(),
            session_start: Utc.with_ymd_and_hms(2023, 5, 1, hour, 0, 0).unwrap(),
            utm_source: None,
            utm_medium: None,
            campaign_id: None,
            converted: false,
            campaign_name: None,
            campaign_start: None,
            spend: 0.0,
            creative_format: None,
            creative_theme: None,
            effectiveness_tier: None,
            matched_campaign: false,
            gross_revenue: 0.0,
        };

        let mut rows = vec![make("b", 9), make("a", 8), make("c", 9)];
        sort_chronologically(&mut rows);
        let ids: Vec<&str> = rows.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
