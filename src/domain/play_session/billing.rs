//! Billing rules for play time.

use chrono::Duration;

/// Minimum charge for any session, in minutes.
pub const MINIMUM_BILLABLE_MINUTES: u32 = 1;

/// Minutes charged for a session of the given wall-clock length.
///
/// Partial minutes round up; anything shorter than a minute (including a
/// zero or negative span) is charged the one-minute floor.
pub fn billable_minutes(elapsed: Duration) -> u32 {
    let millis = elapsed.num_milliseconds();
    if millis <= 0 {
        return MINIMUM_BILLABLE_MINUTES;
    }
    let minutes = (millis + 59_999) / 60_000;
    u32::try_from(minutes)
        .unwrap_or(u32::MAX)
        .max(MINIMUM_BILLABLE_MINUTES)
}

/// Renders minutes as `"Xh Ym"`, e.g. `"1h 5m"` or `"0h 45m"`.
pub fn format_duration(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sixty_five_seconds_bills_two_minutes() {
        assert_eq!(billable_minutes(Duration::seconds(65)), 2);
    }

    #[test]
    fn exact_minutes_are_not_rounded_up() {
        assert_eq!(billable_minutes(Duration::seconds(120)), 2);
    }

    #[test]
    fn sub_minute_sessions_bill_the_floor() {
        assert_eq!(billable_minutes(Duration::zero()), 1);
        assert_eq!(billable_minutes(Duration::milliseconds(1)), 1);
        assert_eq!(billable_minutes(Duration::seconds(59)), 1);
    }

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(65), "1h 5m");
        assert_eq!(format_duration(600), "10h 0m");
    }

    proptest! {
        #[test]
        fn billing_is_ceiling_of_elapsed(millis in 1i64..10_000_000_000) {
            let minutes = i64::from(billable_minutes(Duration::milliseconds(millis)));
            prop_assert!(minutes >= 1);
            prop_assert!(minutes * 60_000 >= millis);
            prop_assert!((minutes - 1) * 60_000 < millis);
        }
    }
}
