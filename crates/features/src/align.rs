//! Alignment of an encoded matrix to a persisted feature list.
//!
//! The persisted list is authoritative: missing columns are filled with a
//! neutral 0.0, extra columns are dropped, and order is forced to match.
//! Silent NaN propagation is never an acceptable outcome here; a malformed
//! target list is an explicit error.

use std::collections::HashSet;

use lift_core::{LiftError, LiftResult};
use ndarray::Array2;
use tracing::debug;

use crate::matrix::FeatureMatrix;

/// Reindex `matrix` to the `target` feature list.
pub fn align_to(matrix: &FeatureMatrix, target: &[String]) -> LiftResult<FeatureMatrix> {
    let mut seen = HashSet::with_capacity(target.len());
    for name in target {
        if !seen.insert(name.as_str()) {
            return Err(LiftError::FeatureMismatch(format!(
                "duplicate feature name '{name}' in target list"
            )));
        }
    }

    let source_columns: Vec<Option<usize>> = target
        .iter()
        .map(|name| matrix.column_index(name))
        .collect();
    let missing = source_columns.iter().filter(|c| c.is_none()).count();
    let dropped = matrix.n_features() + missing - target.len();
    if missing > 0 || dropped > 0 {
        debug!(missing, dropped, "Aligning feature matrix to persisted list");
    }

    let mut values = Array2::<f32>::zeros((matrix.n_rows(), target.len()));
    for (out_col, source) in source_columns.iter().enumerate() {
        if let Some(in_col) = source {
            values
                .column_mut(out_col)
                .assign(&matrix.values().column(*in_col));
        }
    }

    FeatureMatrix::new(target.to_vec(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn reorders_fills_and_drops() {
        let matrix = FeatureMatrix::new(
            names(&["b", "a", "extra"]),
            array![[2.0, 1.0, 9.0], [4.0, 3.0, 9.0]],
        )
        .unwrap();

        let aligned = align_to(&matrix, &names(&["a", "b", "missing"])).unwrap();
        assert_eq!(aligned.names(), names(&["a", "b", "missing"]).as_slice());
        assert_eq!(aligned.values()[[0, 0]], 1.0);
        assert_eq!(aligned.values()[[0, 1]], 2.0);
        assert_eq!(aligned.values()[[0, 2]], 0.0);
        assert_eq!(aligned.values()[[1, 2]], 0.0);
    }

    #[test]
    fn duplicate_target_name_is_rejected() {
        let matrix = FeatureMatrix::new(names(&["a"]), array![[1.0]]).unwrap();
        let err = align_to(&matrix, &names(&["a", "a"])).unwrap_err();
        assert!(matches!(err, LiftError::FeatureMismatch(_)));
    }

    #[test]
    fn identity_alignment_is_a_noop() {
        let matrix = FeatureMatrix::new(names(&["a", "b"]), array![[1.0, 2.0]]).unwrap();
        let aligned = align_to(&matrix, &names(&["a", "b"])).unwrap();
        assert_eq!(aligned.values(), matrix.values());
    }
}
