//! ROAS and CAC per creative tag combination.

use std::collections::HashMap;

use lift_core::types::AnalysisRow;
use serde::{Deserialize, Serialize};

/// Aggregated performance of one (creative_format, creative_theme) cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeSummary {
    pub creative_format: String,
    pub creative_theme: String,
    pub total_spend: f64,
    pub total_revenue: f64,
    pub total_conversions: u64,
    /// Revenue divided by spend; 0.0 when nothing was spent.
    pub roas: f64,
    /// Spend divided by conversions; 0.0 when nothing converted.
    pub cac: f64,
}

/// Aggregate attributed revenue and conversions per creative tag pair.
///
/// Spend is counted once per campaign, not once per session, so a campaign
/// with many sessions does not inflate its own cost. Sessions without a
/// matched campaign carry no creative tags and are excluded, as are
/// campaigns missing either tag.
pub fn creative_summary(rows: &[AnalysisRow]) -> Vec<CreativeSummary> {
    struct CampaignAgg {
        format: String,
        theme: String,
        spend: f64,
        revenue: f64,
        conversions: u64,
    }

    let mut per_campaign: HashMap<&str, CampaignAgg> = HashMap::new();
    for row in rows {
        let (Some(campaign_id), Some(format), Some(theme)) = (
            row.campaign_id.as_deref(),
            row.creative_format.as_deref(),
            row.creative_theme.as_deref(),
        ) else {
            continue;
        };
        if !row.matched_campaign {
            continue;
        }
        let agg = per_campaign.entry(campaign_id).or_insert_with(|| CampaignAgg {
            format: format.to_string(),
            theme: theme.to_string(),
            spend: row.spend,
            revenue: 0.0,
            conversions: 0,
        });
        agg.revenue += row.gross_revenue;
        if row.converted {
            agg.conversions += 1;
        }
    }

    let mut per_cell: HashMap<(String, String), CreativeSummary> = HashMap::new();
    for agg in per_campaign.into_values() {
        let cell = per_cell
            .entry((agg.format.clone(), agg.theme.clone()))
            .or_insert_with(|| CreativeSummary {
                creative_format: agg.format.clone(),
                creative_theme: agg.theme.clone(),
                total_spend: 0.0,
                total_revenue: 0.0,
                total_conversions: 0,
                roas: 0.0,
                cac: 0.0,
            });
        cell.total_spend += agg.spend;
        cell.total_revenue += agg.revenue;
        cell.total_conversions += agg.conversions;
    }

    let mut cells: Vec<CreativeSummary> = per_cell
        .into_values()
        .map(|mut cell| {
            cell.roas = if cell.total_spend > 0.0 {
                cell.total_revenue / cell.total_spend
            } else {
                0.0
            };
            cell.cac = if cell.total_conversions > 0 {
                cell.total_spend / cell.total_conversions as f64
            } else {
                0.0
            };
            cell
        })
        .collect();

    cells.sort_by(|a, b| {
        b.roas
            .partial_cmp(&a.roas)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.creative_format.cmp(&b.creative_format))
            .then_with(|| a.creative_theme.cmp(&b.creative_theme))
    });
    cells
}
