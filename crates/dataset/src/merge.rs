//! Left join of sessions onto campaign reference data.

use std::collections::HashMap;

use lift_core::types::{AnalysisRow, CampaignRecord, SessionRecord};
use tracing::{debug, info};

/// Join each session to its campaign by `campaign_id`. A session with a
/// missing or unknown key is kept: spend defaults to 0.0 and the creative
/// fields stay absent so the encoder flags them, matching the left-join
/// semantics of the analysis table.
pub fn merge_sessions(sessions: &[SessionRecord], campaigns: &[CampaignRecord]) -> Vec<AnalysisRow> {
    let by_id: HashMap<&str, &CampaignRecord> = campaigns
        .iter()
        .map(|c| (c.campaign_id.as_str(), c))
        .collect();

    let mut unmatched = 0usize;
    let rows: Vec<AnalysisRow> = sessions
        .iter()
        .map(|session| {
            let campaign = session
                .campaign_id
                .as_deref()
                .and_then(|id| by_id.get(id).copied());
            if campaign.is_none() {
                unmatched += 1;
            }
            to_row(session, campaign)
        })
        .collect();

    info!(
        sessions = rows.len(),
        campaigns = campaigns.len(),
        unmatched,
        "Merged sessions with campaign metadata"
    );
    if unmatched > 0 {
        debug!(unmatched, "Sessions without a campaign match kept with zero spend");
    }
    rows
}

fn to_row(session: &SessionRecord, campaign: Option<&CampaignRecord>) -> AnalysisRow {
    AnalysisRow {
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
        session_start: session.session_start,
        utm_source: session.utm_source.clone(),
        utm_medium: session.utm_medium.clone(),
        campaign_id: session.campaign_id.clone(),
        converted: session.converted,
        campaign_name: campaign.map(|c| c.campaign_name.clone()),
        campaign_start: campaign.map(|c| c.start_date),
        spend: campaign.map(|c| c.spend).unwrap_or(0.0),
        creative_format: campaign.and_then(|c| c.creative_format.clone()),
        creative_theme: campaign.and_then(|c| c.creative_theme.clone()),
        effectiveness_tier: campaign.and_then(|c| c.effectiveness_tier.clone()),
        matched_campaign: campaign.is_some(),
        gross_revenue: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session(id: &str, campaign_id: Option<&str>) -> SessionRecord {
        SessionRecord {
            session_id: id.to_string(),
            user_id: "user_1".to_string(),
            session_start: Utc.with_ymd_and_hms(2023, 3, 1, 10, 0, 0).unwrap(),
            utm_source: Some("google".to_string()),
            utm_medium: Some("cpc".to_string()),
            campaign_id: campaign_id.map(str::to_string),
            converted: false,
        }
    }

    fn campaign(id: &str, spend: f64) -> CampaignRecord {
        CampaignRecord {
            campaign_id: id.to_string(),
            campaign_name: format!("Campaign {id}"),
            start_date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            spend,
            creative_format: Some("video".to_string()),
            creative_theme: Some("Evergreen".to_string()),
            effectiveness_tier: Some("High".to_string()),
        }
    }

    #[test]
    fn joins_matching_campaign_metadata() {
        let rows = merge_sessions(
            &[session("session_1", Some("campaign_1"))],
            &[campaign("campaign_1", 5000.0)],
        );
        assert_eq!(rows.len(), 1);
        assert!(rows[0].matched_campaign);
        assert!((rows[0].spend - 5000.0).abs() < f64::EPSILON);
        assert_eq!(rows[0].creative_format.as_deref(), Some("video"));
    }

    #[test]
    fn unknown_key_keeps_row_with_zero_spend() {
        let rows = merge_sessions(
            &[session("session_1", Some("campaign_99"))],
            &[campaign("campaign_1", 5000.0)],
        );
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].matched_campaign);
        assert_eq!(rows[0].spend, 0.0);
        assert_eq!(rows[0].creative_format, None);
        assert_eq!(rows[0].effectiveness_tier, None);
    }

    #[test]
    fn missing_key_keeps_row_with_zero_spend() {
        let rows = merge_sessions(&[session("session_1", None)], &[campaign("campaign_1", 5000.0)]);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].matched_campaign);
        assert_eq!(rows[0].spend, 0.0);
    }
}
