//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp offset by the given number of seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Creates a new timestamp offset by the given number of days.
    pub fn plus_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Midnight UTC at the start of this timestamp's day.
    pub fn start_of_day(&self) -> Self {
        Self(self.0.date_naive().and_time(NaiveTime::MIN).and_utc())
    }

    /// Last representable millisecond of the given UTC calendar day.
    ///
    /// Returns `None` for the final date chrono can represent.
    pub fn end_of_date(date: NaiveDate) -> Option<Self> {
        date.and_time(NaiveTime::MIN)
            .and_utc()
            .checked_add_signed(Duration::days(1))?
            .checked_sub_signed(Duration::milliseconds(1))
            .map(Self)
    }

    /// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
    ///
    /// A bare date resolves to the end of that UTC day, so a validity window
    /// ending on a date includes the whole date.
    pub fn parse_inclusive(field: &str, input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }
        let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
            ValidationError::invalid_format(field, "expected RFC 3339 timestamp or YYYY-MM-DD")
        })?;
        Self::end_of_date(date)
            .ok_or_else(|| ValidationError::invalid_format(field, "date is out of range"))
    }

    /// Like [`Timestamp::parse_inclusive`], but a bare date resolves to the
    /// start of that UTC day. Used for `since` bounds.
    pub fn parse_lower_bound(field: &str, input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .map(|date| Self(date.and_time(NaiveTime::MIN).and_utc()))
            .map_err(|_| {
                ValidationError::invalid_format(field, "expected RFC 3339 timestamp or YYYY-MM-DD")
            })
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn fixed(s: &str) -> Timestamp {
        Timestamp::from_datetime(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc))
    }

    #[test]
    fn inclusive_date_at_calendar_limit_is_rejected() {
        let err = Timestamp::parse_inclusive("end_date", "+262142-12-31").unwrap_err();
        assert_eq!(err.field(), "end_date");
        assert!(Timestamp::parse_inclusive("end_date", "+262142-12-30").is_ok());
    }

    #[test]
    fn lower_bound_date_starts_at_midnight() {
        let ts = Timestamp::parse_lower_bound("since", "2025-06-01").unwrap();
        assert_eq!(ts, fixed("2025-06-01T00:00:00Z"));
        assert!(Timestamp::parse_lower_bound("since", "yesterday").is_err());
    }

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn ordering_helpers_agree_with_ord() {
        let a = fixed("2024-01-15T10:30:00Z");
        let b = a.plus_secs(1);
        assert!(a.is_before(&b));
        assert!(b.is_after(&a));
        assert!(a < b);
    }

    #[test]
    fn duration_since_is_signed() {
        let a = fixed("2024-01-15T10:30:00Z");
        let b = a.plus_secs(65);
        assert_eq!(b.duration_since(&a).num_seconds(), 65);
        assert_eq!(a.duration_since(&b).num_seconds(), -65);
    }

    #[test]
    fn start_of_day_truncates_time() {
        let ts = fixed("2024-01-15T10:30:45Z").start_of_day();
        assert_eq!(ts.as_datetime().hour(), 0);
        assert_eq!(ts.as_datetime().minute(), 0);
        assert_eq!(ts.as_datetime().day(), 15);
    }

    #[test]
    fn parse_inclusive_accepts_rfc3339() {
        let ts = Timestamp::parse_inclusive("end_date", "2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(ts, fixed("2024-03-01T10:00:00Z"));
    }

    #[test]
    fn parse_inclusive_bare_date_covers_whole_day() {
        let ts = Timestamp::parse_inclusive("end_date", "2024-03-01").unwrap();
        assert_eq!(ts.as_datetime().day(), 1);
        assert_eq!(ts.as_datetime().hour(), 23);
        assert!(ts.is_after(&fixed("2024-03-01T23:59:59Z")));
        assert!(ts.is_before(&fixed("2024-03-02T00:00:00Z")));
    }

    #[test]
    fn parse_inclusive_rejects_garbage() {
        let err = Timestamp::parse_inclusive("end_date", "next tuesday").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { ref field, .. } if field == "end_date"));
    }

    #[test]
    fn timestamp_serializes_to_json() {
        let ts = fixed("2024-01-15T10:30:00Z");
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15"));
    }
}
