use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked website session, one row of `sessions.csv`. Immutable once
/// generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: String,
    pub session_start: DateTime<Utc>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    /// Join key into the campaign table. Absent for untagged traffic.
    pub campaign_id: Option<String>,
    pub converted: bool,
}

/// Campaign reference data, one row of `campaigns.csv`. Joined onto
/// sessions, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub campaign_id: String,
    pub campaign_name: String,
    pub start_date: DateTime<Utc>,
    pub spend: f64,
    pub creative_format: Option<String>,
    pub creative_theme: Option<String>,
    pub effectiveness_tier: Option<String>,
}

/// A completed order, one row of `orders.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub user_id: String,
    pub order_datetime: DateTime<Utc>,
    pub gross_revenue: f64,
}

/// The analysis-ready row: a session with its campaign metadata joined on
/// and revenue attributed. Sessions whose campaign key misses the campaign
/// table are kept with `spend = 0.0` and absent creative fields, never
/// dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub session_id: String,
    pub user_id: String,
    pub session_start: DateTime<Utc>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub campaign_id: Option<String>,
    pub converted: bool,
    pub campaign_name: Option<String>,
    pub campaign_start: Option<DateTime<Utc>>,
    pub spend: f64,
    pub creative_format: Option<String>,
    pub creative_theme: Option<String>,
    pub effectiveness_tier: Option<String>,
    /// Whether the campaign join found a matching campaign row.
    pub matched_campaign: bool,
    /// Last-touch attributed revenue for this session.
    pub gross_revenue: f64,
}
