//! Cumulative revenue payback per campaign.

use lift_core::types::{AnalysisRow, CampaignRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackPoint {
    pub days_since_launch: i64,
    pub cumulative_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackCurve {
    pub campaign_id: String,
    pub campaign_name: String,
    pub spend: f64,
    pub points: Vec<PaybackPoint>,
    /// First day the cumulative revenue covered the spend, if it ever did.
    pub break_even_day: Option<i64>,
}

/// Cumulative attributed revenue over days since launch, for sessions of
/// this campaign at or after its start date.
pub fn payback_curve(rows: &[AnalysisRow], campaign: &CampaignRecord) -> PaybackCurve {
    let mut sessions: Vec<&AnalysisRow> = rows
        .iter()
        .filter(|row| {
            row.campaign_id.as_deref() == Some(campaign.campaign_id.as_str())
                && row.session_start >= campaign.start_date
        })
        .collect();
    sessions.sort_by_key(|row| row.session_start);

    let mut cumulative = 0.0;
    let mut break_even_day = None;
    let points: Vec<PaybackPoint> = sessions
        .iter()
        .map(|row| {
            cumulative += row.gross_revenue;
            let days_since_launch = (row.session_start - campaign.start_date).num_days();
            if break_even_day.is_none() && campaign.spend > 0.0 && cumulative >= campaign.spend {
                break_even_day = Some(days_since_launch);
            }
            PaybackPoint {
                days_since_launch,
                cumulative_revenue: cumulative,
            }
        })
        .collect();

    PaybackCurve {
        campaign_id: campaign.campaign_id.clone(),
        campaign_name: campaign.campaign_name.clone(),
        spend: campaign.spend,
        points,
        break_even_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn campaign(spend: f64) -> CampaignRecord {
        CampaignRecord {
            campaign_id: "campaign_1".to_string(),
            campaign_name: "Campaign 1".to_string(),
            start_date: Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
            spend,
            creative_format: None,
            creative_theme: None,
            effectiveness_tier: None,
        }
    }

    fn row(campaign_id: &str, days_after_launch: i64, revenue: f64) -> AnalysisRow {
        let launch = Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap();
        AnalysisRow {
            session_id: format!("session_{days_after_launch}"),
            user_id: "user".to_string(),
            session_start: launch + Duration::days(days_after_launch) + Duration::hours(6),
            utm_source: None,
            utm_medium: None,
            campaign_id: Some(campaign_id.to_string()),
            converted: revenue > 0.0,
            campaign_name: None,
            campaign_start: Some(launch),
            spend: 0.0,
            creative_format: None,
            creative_theme: None,
            effectiveness_tier: None,
            matched_campaign: true,
            gross_revenue: revenue,
        }
    }

    #[test]
    fn revenue_accumulates_in_time_order() {
        let rows = vec![
            row("campaign_1", 5, 300.0),
            row("campaign_1", 1, 100.0),
            row("campaign_1", 10, 200.0),
        ];
        let curve = payback_curve(&rows, &campaign(1_000.0));
        assert_eq!(curve.points.len(), 3);
        assert_eq!(curve.points[0].days_since_launch, 1);
        assert!((curve.points[2].cumulative_revenue - 600.0).abs() < f64::EPSILON);
        assert_eq!(curve.break_even_day, None);
    }

    #[test]
    fn break_even_is_the_first_covering_day() {
        let rows = vec![
            row("campaign_1", 1, 400.0),
            row("campaign_1", 3, 400.0),
            row("campaign_1", 8, 400.0),
        ];
        let curve = payback_curve(&rows, &campaign(700.0));
        assert_eq!(curve.break_even_day, Some(3));
    }

    #[test]
    fn pre_launch_and_foreign_sessions_are_excluded() {
        let mut early = row("campaign_1", 0, 500.0);
        early.session_start = campaign(100.0).start_date - Duration::days(2);
        let rows = vec![early, row("campaign_2", 1, 500.0)];
        let curve = payback_curve(&rows, &campaign(100.0));
        assert!(curve.points.is_empty());
        assert_eq!(curve.break_even_day, None);
    }
}
