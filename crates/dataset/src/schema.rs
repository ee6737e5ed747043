//! Required column sets for the three input files, validated against CSV
//! headers before any row is parsed. A missing column is fatal for the run.

use std::collections::HashMap;

use lift_core::{LiftError, LiftResult};

pub const SESSION_COLUMNS: &[&str] = &[
    "session_id",
    "user_id",
    "session_start",
    "utm_source",
    "utm_medium",
    "campaign_id",
    "converted",
];

pub const CAMPAIGN_COLUMNS: &[&str] = &[
    "campaign_id",
    "campaign_name",
    "start_date",
    "spend",
    "creative_format",
    "creative_theme",
    "effectiveness_tier",
];

pub const ORDER_COLUMNS: &[&str] = &["order_id", "user_id", "order_datetime", "gross_revenue"];

/// Map required column names to their header positions. Extra columns are
/// tolerated and ignored; a missing required column is a schema error.
pub fn column_index(
    file: &str,
    headers: &csv::StringRecord,
    required: &[&str],
) -> LiftResult<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(required.len());
    for (pos, name) in headers.iter().enumerate() {
        index.entry(name.trim().to_string()).or_insert(pos);
    }

    for column in required {
        if !index.contains_key(*column) {
            return Err(LiftError::Schema {
                file: file.to_string(),
                column: (*column).to_string(),
            });
        }
    }

    index.retain(|name, _| required.contains(&name.as_str()));
    Ok(index)
}
