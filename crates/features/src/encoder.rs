//! One-hot encoding of the categorical session/campaign attributes.
//!
//! The encoded layout mirrors the analysis table the model was designed
//! around: the numeric passthrough columns come first, then one dummy group
//! per categorical column with categories sorted lexicographically and an
//! explicit `<column>_nan` absence indicator closing each group. An absent
//! value sets only the `_nan` indicator; a value never seen at fit time
//! sets nothing.

use lift_core::types::AnalysisRow;
use lift_core::LiftResult;
use ndarray::Array2;

use crate::calendar::CalendarFeatures;
use crate::matrix::FeatureMatrix;

/// Categorical columns encoded as dummy groups, in layout order.
pub const CATEGORICAL_COLUMNS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "creative_format",
    "creative_theme",
    "effectiveness_tier",
];

/// Numeric columns passed through ahead of the dummy groups.
pub const NUMERIC_COLUMNS: &[&str] = &["spend", "hour_of_day", "day_of_week", "month"];

/// Fitted vocabularies for the categorical columns.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    /// (column, sorted distinct categories) per categorical column.
    vocabularies: Vec<(String, Vec<String>)>,
}

impl OneHotEncoder {
    /// Collect the per-column category vocabularies from the analysis rows.
    pub fn fit(rows: &[AnalysisRow]) -> Self {
        let vocabularies = CATEGORICAL_COLUMNS
            .iter()
            .map(|column| {
                let mut categories: Vec<String> = rows
                    .iter()
                    .filter_map(|row| categorical_value(row, column))
                    .map(str::to_string)
                    .collect();
                categories.sort();
                categories.dedup();
                ((*column).to_string(), categories)
            })
            .collect();
        Self { vocabularies }
    }

    /// The ordered feature-name list this encoder produces.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        for (column, categories) in &self.vocabularies {
            for category in categories {
                names.push(format!("{column}_{category}"));
            }
            names.push(format!("{column}_nan"));
        }
        names
    }

    /// Encode rows into a feature matrix plus the binary outcome vector.
    pub fn transform(&self, rows: &[AnalysisRow]) -> LiftResult<(FeatureMatrix, Vec<f32>)> {
        let names = self.feature_names();
        let mut values = Array2::<f32>::zeros((rows.len(), names.len()));
        let mut labels = Vec::with_capacity(rows.len());

        for (r, row) in rows.iter().enumerate() {
            let calendar = CalendarFeatures::from_timestamp(row.session_start);
            values[[r, 0]] = row.spend as f32;
            values[[r, 1]] = calendar.hour_of_day;
            values[[r, 2]] = calendar.day_of_week;
            values[[r, 3]] = calendar.month;

            let mut offset = NUMERIC_COLUMNS.len();
            for (column, categories) in &self.vocabularies {
                match categorical_value(row, column) {
                    Some(value) => {
                        // Unseen categories encode as all zeros in the group.
                        if let Ok(pos) = categories.binary_search_by(|c| c.as_str().cmp(value)) {
                            values[[r, offset + pos]] = 1.0;
                        }
                    }
                    None => {
                        values[[r, offset + categories.len()]] = 1.0;
                    }
                }
                offset += categories.len() + 1;
            }

            labels.push(if row.converted { 1.0 } else { 0.0 });
        }

        Ok((FeatureMatrix::new(names, values)?, labels))
    }
}

fn categorical_value<'a>(row: &'a AnalysisRow, column: &str) -> Option<&'a str> {
    match column {
        "utm_source" => row.utm_source.as_deref(),
        "utm_medium" => row.utm_medium.as_deref(),
        "creative_format" => row.creative_format.as_deref(),
        "creative_theme" => row.creative_theme.as_deref(),
        "effectiveness_tier" => row.effectiveness_tier.as_deref(),
        _ => None,
    }
}
