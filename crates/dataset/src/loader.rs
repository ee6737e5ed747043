//! CSV loaders for the three input files. Each loader validates the header
//! schema up front, then parses rows with row-numbered errors so a bad cell
//! is reported with its offending location.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lift_core::types::{CampaignRecord, OrderRecord, SessionRecord};
use lift_core::{LiftError, LiftResult};
use tracing::info;

use crate::schema::{self, column_index};

pub fn load_sessions(path: &Path) -> LiftResult<Vec<SessionRecord>> {
    let file = path.display().to_string();
    let mut reader = csv::Reader::from_path(path)?;
    let index = column_index(&file, reader.headers()?, schema::SESSION_COLUMNS)?;

    let mut sessions = Vec::new();
    for (row_no, row) in reader.records().enumerate() {
        let record = row?;
        let row_no = row_no + 2; // header is row 1
        sessions.push(SessionRecord {
            session_id: required_field(&file, row_no, &record, &index, "session_id")?,
            user_id: required_field(&file, row_no, &record, &index, "user_id")?,
            session_start: parse_timestamp(
                &file,
                row_no,
                &required_field(&file, row_no, &record, &index, "session_start")?,
            )?,
            utm_source: optional_field(&record, &index, "utm_source"),
            utm_medium: optional_field(&record, &index, "utm_medium"),
            campaign_id: optional_field(&record, &index, "campaign_id"),
            converted: parse_flag(
                &file,
                row_no,
                &required_field(&file, row_no, &record, &index, "converted")?,
            )?,
        });
    }

    info!(file = %file, rows = sessions.len(), "Loaded sessions");
    Ok(sessions)
}

pub fn load_campaigns(path: &Path) -> LiftResult<Vec<CampaignRecord>> {
    let file = path.display().to_string();
    let mut reader = csv::Reader::from_path(path)?;
    let index = column_index(&file, reader.headers()?, schema::CAMPAIGN_COLUMNS)?;

    let mut campaigns = Vec::new();
    for (row_no, row) in reader.records().enumerate() {
        let record = row?;
        let row_no = row_no + 2;
        campaigns.push(CampaignRecord {
            campaign_id: required_field(&file, row_no, &record, &index, "campaign_id")?,
            campaign_name: required_field(&file, row_no, &record, &index, "campaign_name")?,
            start_date: parse_timestamp(
                &file,
                row_no,
                &required_field(&file, row_no, &record, &index, "start_date")?,
            )?,
            spend: parse_number(
                &file,
                row_no,
                "spend",
                &required_field(&file, row_no, &record, &index, "spend")?,
            )?,
            creative_format: optional_field(&record, &index, "creative_format"),
            creative_theme: optional_field(&record, &index, "creative_theme"),
            effectiveness_tier: optional_field(&record, &index, "effectiveness_tier"),
        });
    }

    info!(file = %file, rows = campaigns.len(), "Loaded campaigns");
    Ok(campaigns)
}

pub fn load_orders(path: &Path) -> LiftResult<Vec<OrderRecord>> {
    let file = path.display().to_string();
    let mut reader = csv::Reader::from_path(path)?;
    let index = column_index(&file, reader.headers()?, schema::ORDER_COLUMNS)?;

    let mut orders = Vec::new();
    for (row_no, row) in reader.records().enumerate() {
        let record = row?;
        let row_no = row_no + 2;
        orders.push(OrderRecord {
            order_id: required_field(&file, row_no, &record, &index, "order_id")?,
            user_id: required_field(&file, row_no, &record, &index, "user_id")?,
            order_datetime: parse_timestamp(
                &file,
                row_no,
                &required_field(&file, row_no, &record, &index, "order_datetime")?,
            )?,
            gross_revenue: parse_number(
                &file,
                row_no,
                "gross_revenue",
                &required_field(&file, row_no, &record, &index, "gross_revenue")?,
            )?,
        });
    }

    info!(file = %file, rows = orders.len(), "Loaded orders");
    Ok(orders)
}

fn required_field(
    file: &str,
    row_no: usize,
    record: &csv::StringRecord,
    index: &HashMap<String, usize>,
    column: &str,
) -> LiftResult<String> {
    let value = record.get(index[column]).unwrap_or("").trim();
    if value.is_empty() {
        return Err(LiftError::Malformed {
            file: file.to_string(),
            row: row_no,
            message: format!("empty value in required column '{column}'"),
        });
    }
    Ok(value.to_string())
}

fn optional_field(
    record: &csv::StringRecord,
    index: &HashMap<String, usize>,
    column: &str,
) -> Option<String> {
    let value = record.get(index[column]).unwrap_or("").trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a timestamp in any of the shapes the upstream exports produce:
/// RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`, or a bare date.
fn parse_timestamp(file: &str, row_no: usize, value: &str) -> LiftResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(LiftError::Malformed {
        file: file.to_string(),
        row: row_no,
        message: format!("unparseable timestamp '{value}'"),
    })
}

fn parse_number(file: &str, row_no: usize, column: &str, value: &str) -> LiftResult<f64> {
    value.parse::<f64>().map_err(|_| LiftError::Malformed {
        file: file.to_string(),
        row: row_no,
        message: format!("unparseable number '{value}' in column '{column}'"),
    })
}

fn parse_flag(file: &str, row_no: usize, value: &str) -> LiftResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(LiftError::Malformed {
            file: file.to_string(),
            row: row_no,
            message: format!("unparseable conversion flag '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_sessions_with_blank_campaign_key() {
        let file = write_csv(
            "session_id,user_id,session_start,utm_source,utm_medium,campaign_id,converted\n\
             session_1,user_1,2023-03-01 10:30:00,google,cpc,campaign_1,1\n\
             session_2,user_2,2023-03-01 11:00:00,direct,organic,,0\n",
        );
        let sessions = load_sessions(file.path()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].converted);
        assert_eq!(sessions[1].campaign_id, None);
    }

    #[test]
    fn missing_header_is_a_schema_error() {
        let file = write_csv("session_id,user_id,session_start\nsession_1,user_1,2023-03-01\n");
        let err = load_sessions(file.path()).unwrap_err();
        assert!(matches!(err, LiftError::Schema { .. }));
    }

    #[test]
    fn bad_timestamp_reports_row_number() {
        let file = write_csv(
            "session_id,user_id,session_start,utm_source,utm_medium,campaign_id,converted\n\
             session_1,user_1,not-a-date,google,cpc,campaign_1,0\n",
        );
        let err = load_sessions(file.path()).unwrap_err();
        match err {
            LiftError::Malformed { row, .. } => assert_eq!(row, 2),
            other => panic!("expected malformed error, got {other}"),
        }
    }

    #[test]
    fn parses_rfc3339_and_bare_dates() {
        assert!(parse_timestamp("t", 1, "2023-06-01T08:00:00+00:00").is_ok());
        assert!(parse_timestamp("t", 1, "2023-06-01 08:00:00.250").is_ok());
        assert!(parse_timestamp("t", 1, "2023-06-01").is_ok());
    }

    #[test]
    fn loads_campaign_spend() {
        let file = write_csv(
            "campaign_id,campaign_name,start_date,spend,creative_format,creative_theme,effectiveness_tier\n\
             campaign_1,Campaign 1 (High),2023-01-15,12000,video,Promo / Sale,High\n",
        );
        let campaigns = load_campaigns(file.path()).unwrap();
        assert_eq!(campaigns.len(), 1);
        assert!((campaigns[0].spend - 12000.0).abs() < f64::EPSILON);
        assert_eq!(campaigns[0].creative_theme.as_deref(), Some("Promo / Sale"));
    }
}
