//! Last-touch revenue attribution: each order credits the user's most
//! recent session at or before the order time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lift_core::types::{AnalysisRow, OrderRecord};
use tracing::info;

/// Attribute order revenue onto the analysis rows in place. Orders with no
/// qualifying session (unknown user, or every session after the order) are
/// left unattributed; sessions that win no order keep 0.0 revenue.
pub fn attribute_revenue(rows: &mut [AnalysisRow], orders: &[OrderRecord]) {
    let mut sessions_by_user: HashMap<String, Vec<(DateTime<Utc>, usize)>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        sessions_by_user
            .entry(row.user_id.clone())
            .or_default()
            .push((row.session_start, idx));
    }
    for sessions in sessions_by_user.values_mut() {
        sessions.sort_by_key(|(start, _)| *start);
    }

    let mut attributed = 0usize;
    let mut unattributed = 0usize;
    for order in orders {
        let Some(sessions) = sessions_by_user.get(order.user_id.as_str()) else {
            unattributed += 1;
            continue;
        };
        // Last session at or before the order time.
        let cut = sessions.partition_point(|(start, _)| *start <= order.order_datetime);
        if cut == 0 {
            unattributed += 1;
            continue;
        }
        let (_, row_idx) = sessions[cut - 1];
        rows[row_idx].gross_revenue += order.gross_revenue;
        attributed += 1;
    }

    info!(
        orders = orders.len(),
        attributed, unattributed, "Attributed order revenue to sessions"
    );
}
