//! Calendar features derived from the session timestamp.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Hour, weekday, and month of a timestamp, as model inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarFeatures {
    /// 0..=23
    pub hour_of_day: f32,
    /// Monday = 0 .. Sunday = 6
    pub day_of_week: f32,
    /// 1..=12
    pub month: f32,
}

impl CalendarFeatures {
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self {
            hour_of_day: ts.hour() as f32,
            day_of_week: ts.weekday().num_days_from_monday() as f32,
            month: ts.month() as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monday_is_zero() {
        // 2023-03-06 was a Monday.
        let ts = Utc.with_ymd_and_hms(2023, 3, 6, 14, 30, 0).unwrap();
        let features = CalendarFeatures::from_timestamp(ts);
        assert_eq!(features.day_of_week, 0.0);
        assert_eq!(features.hour_of_day, 14.0);
        assert_eq!(features.month, 3.0);
    }

    #[test]
    fn sunday_is_six() {
        let ts = Utc.with_ymd_and_hms(2023, 3, 12, 0, 0, 0).unwrap();
        assert_eq!(CalendarFeatures::from_timestamp(ts).day_of_week, 6.0);
    }
}
