//! Named feature matrix shared between training and inference.

use lift_core::{LiftError, LiftResult};
use ndarray::{s, Array2, ArrayView1};

/// A dense feature matrix with one named column per feature. The column
/// names are the contract between training and inference: a persisted model
/// carries this list and incoming matrices are aligned to it.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f32>,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, values: Array2<f32>) -> LiftResult<Self> {
        if names.len() != values.ncols() {
            return Err(LiftError::FeatureMismatch(format!(
                "{} feature names for {} columns",
                names.len(),
                values.ncols()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn row(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.values.row(idx)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Owned copy of a contiguous row range, keeping the column names.
    pub fn slice_rows(&self, range: std::ops::Range<usize>) -> Self {
        Self {
            names: self.names.clone(),
            values: self.values.slice(s![range, ..]).to_owned(),
        }
    }

    /// Multiply one column in place, used by the lift forecast to scale
    /// spend.
    pub fn scale_column(&mut self, idx: usize, factor: f32) {
        self.values.column_mut(idx).mapv_inplace(|v| v * factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> FeatureMatrix {
        FeatureMatrix::new(
            vec!["spend".to_string(), "month".to_string()],
            array![[1.0, 3.0], [2.0, 4.0], [3.0, 5.0]],
        )
        .unwrap()
    }

    #[test]
    fn name_count_must_match_columns() {
        let err = FeatureMatrix::new(vec!["spend".to_string()], array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, LiftError::FeatureMismatch(_)));
    }

    #[test]
    fn slicing_preserves_names() {
        let sliced = sample().slice_rows(1..3);
        assert_eq!(sliced.n_rows(), 2);
        assert_eq!(sliced.names(), sample().names());
        assert_eq!(sliced.values()[[0, 0]], 2.0);
    }

    #[test]
    fn scale_column_multiplies_in_place() {
        let mut matrix = sample();
        matrix.scale_column(0, 1.5);
        assert_eq!(matrix.values()[[1, 0]], 3.0);
        assert_eq!(matrix.values()[[1, 1]], 4.0);
    }
}
