//! Working-hours-aware notification scheduling
//!
//! Superintendents do not read hold point notices at 2am on a Sunday.
//! Given a requested send time, this module rolls it into the configured
//! working window and reports whether (and why) an adjustment happened, so
//! the operator can confirm the actual send time.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::models::WorkingHoursConfig;

/// Result of adjusting a requested send time into working hours
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleAdjustment {
    /// When the notification should actually go out
    pub send_at: DateTime<Utc>,
    /// Whether the requested time was moved
    pub adjusted: bool,
    /// Why it was moved, for audit/confirmation messaging
    pub reason: Option<String>,
}

impl ScheduleAdjustment {
    fn unchanged(send_at: DateTime<Utc>) -> Self {
        Self {
            send_at,
            adjusted: false,
            reason: None,
        }
    }

    fn moved(send_at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            send_at,
            adjusted: true,
            reason: Some(reason.into()),
        }
    }
}

/// Adjust a requested timestamp into the working window:
/// - non-working day: roll forward to the next working day at start
/// - before start of day: same day at start
/// - at or after end of day: next working day at start
/// - otherwise: unchanged
pub fn adjust_to_working_hours(
    requested: DateTime<Utc>,
    hours: &WorkingHoursConfig,
) -> ScheduleAdjustment {
    let start = hours.start_time();
    let end = hours.end_time();

    if !hours.is_working_day(requested.weekday()) {
        let send_at = next_working_day_at(requested, hours, start);
        return ScheduleAdjustment::moved(
            send_at,
            format!("{} is not a working day", requested.weekday()),
        );
    }

    let time = requested.time();
    if time < start {
        let send_at = at_time(requested, start);
        return ScheduleAdjustment::moved(send_at, "before working hours");
    }

    if time >= end {
        let send_at = next_working_day_at(requested, hours, start);
        return ScheduleAdjustment::moved(send_at, "after working hours");
    }

    ScheduleAdjustment::unchanged(requested)
}

fn at_time(day: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    day.date_naive()
        .and_time(time)
        .and_utc()
}

/// First working day strictly after `from`, at the given time of day
fn next_working_day_at(
    from: DateTime<Utc>,
    hours: &WorkingHoursConfig,
    time: NaiveTime,
) -> DateTime<Utc> {
    let mut day = from + Duration::days(1);
    // A working-day set can be empty in a broken config; cap the walk at
    // two weeks rather than spinning forever
    for _ in 0..14 {
        if hours.is_working_day(day.weekday()) {
            break;
        }
        day += Duration::days(1);
    }
    at_time(day, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn hours() -> WorkingHoursConfig {
        WorkingHoursConfig::default()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_saturday_rolls_to_monday_start() {
        // Saturday 10:00
        let requested = utc(2024, 6, 8, 10, 0);
        assert_eq!(requested.weekday(), Weekday::Sat);

        let adjustment = adjust_to_working_hours(requested, &hours());
        assert!(adjustment.adjusted);
        assert_eq!(adjustment.send_at, utc(2024, 6, 10, 7, 0));
        assert_eq!(adjustment.send_at.weekday(), Weekday::Mon);
        assert!(adjustment.reason.unwrap().contains("not a working day"));
    }

    #[test]
    fn test_before_start_moves_to_same_day_start() {
        // Tuesday 05:30
        let requested = utc(2024, 6, 11, 5, 30);
        let adjustment = adjust_to_working_hours(requested, &hours());
        assert!(adjustment.adjusted);
        assert_eq!(adjustment.send_at, utc(2024, 6, 11, 7, 0));
    }

    #[test]
    fn test_at_end_rolls_to_next_working_day() {
        // Friday exactly 17:00 rolls over the weekend
        let requested = utc(2024, 6, 14, 17, 0);
        assert_eq!(requested.weekday(), Weekday::Fri);

        let adjustment = adjust_to_working_hours(requested, &hours());
        assert!(adjustment.adjusted);
        assert_eq!(adjustment.send_at, utc(2024, 6, 17, 7, 0));
        assert_eq!(adjustment.reason.as_deref(), Some("after working hours"));
    }

    #[test]
    fn test_inside_window_is_unchanged() {
        // Wednesday 10:15
        let requested = utc(2024, 6, 12, 10, 15);
        let adjustment = adjust_to_working_hours(requested, &hours());
        assert!(!adjustment.adjusted);
        assert_eq!(adjustment.send_at, requested);
        assert!(adjustment.reason.is_none());
    }

    #[test]
    fn test_custom_working_days() {
        let mut hours = hours();
        hours.days = vec!["sat".to_string(), "sun".to_string()];

        // Monday rolls forward to Saturday
        let requested = utc(2024, 6, 10, 9, 0);
        let adjustment = adjust_to_working_hours(requested, &hours);
        assert!(adjustment.adjusted);
        assert_eq!(adjustment.send_at.weekday(), Weekday::Sat);
    }
}
