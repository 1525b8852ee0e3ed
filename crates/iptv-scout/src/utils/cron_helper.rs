//! Cron expression parsing and fire-time lookup
//!
//! Expressions use the six-field form with seconds, e.g. `0 0 4 * * *`.

use chrono::{DateTime, TimeZone};
use cron::Schedule;
use std::str::FromStr;

/// Parse a cron expression, returning a readable error when it is invalid
pub fn validate_cron_expression(cron_expression: &str) -> Result<Schedule, String> {
    Schedule::from_str(cron_expression)
        .map_err(|e| format!("Invalid cron expression '{cron_expression}': {e}"))
}

/// First fire time strictly after `after`
pub fn next_fire_after<Tz: TimeZone>(
    schedule: &Schedule,
    after: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    schedule.after(after).next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Local, Timelike, Utc, Weekday};

    #[test]
    fn test_valid_cron_expression_fires_in_the_future() {
        let schedule = validate_cron_expression("0 0 4 * * *").unwrap();
        let now = Local::now();
        let next = next_fire_after(&schedule, &now).unwrap();
        assert!(next > now);
    }

    #[test]
    fn test_invalid_cron_expression() {
        assert!(validate_cron_expression("invalid").is_err());
        let err = validate_cron_expression("every day").unwrap_err();
        assert!(err.contains("Invalid cron expression"));
    }

    #[test]
    fn test_weekly_harvest_fires_on_monday_midnight() {
        let schedule = validate_cron_expression("0 0 0 * * Mon").unwrap();
        // 2025-01-01 was a Wednesday
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let next = next_fire_after(&schedule, &start).unwrap();

        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!(next.day(), 6);
        assert_eq!((next.hour(), next.minute(), next.second()), (0, 0, 0));
    }

    #[test]
    fn test_daily_publish_next_fire_is_same_day_when_before_four() {
        let schedule = validate_cron_expression("0 0 4 * * *").unwrap();
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 3, 59, 59).unwrap();
        let next = next_fire_after(&schedule, &start).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap());
    }
}
