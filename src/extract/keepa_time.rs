//! Keepa time: integer minutes since 2011-01-01 00:00 UTC.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Unix timestamp of the Keepa epoch (2011-01-01T00:00:00Z)
pub const KEEPA_EPOCH_UNIX: i64 = 1_293_840_000;

/// Convert Keepa minutes to a UTC instant. `m <= 0` has no meaning.
pub fn to_utc(minutes: i64) -> Option<DateTime<Utc>> {
    if minutes <= 0 {
        return None;
    }
    let secs = minutes.checked_mul(60)?.checked_add(KEEPA_EPOCH_UNIX)?;
    DateTime::<Utc>::from_timestamp(secs, 0)
}

pub fn from_utc(at: DateTime<Utc>) -> i64 {
    (at.timestamp() - KEEPA_EPOCH_UNIX) / 60
}

/// `YYYY-MM-DD` in the given zone, `None` for sentinel minutes
pub fn format_date(minutes: i64, tz: Tz) -> Option<String> {
    to_utc(minutes).map(|t| t.with_timezone(&tz).format("%Y-%m-%d").to_string())
}

/// `YYYY-MM-DD HH:MM:SS` in the given zone
pub fn format_datetime(minutes: i64, tz: Tz) -> Option<String> {
    to_utc(minutes).map(|t| {
        t.with_timezone(&tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Toronto;

    #[test]
    fn test_epoch_offset() {
        let t = to_utc(1).unwrap();
        assert_eq!(t.to_rfc3339(), "2011-01-01T00:01:00+00:00");
        assert_eq!(from_utc(t), 1);
    }

    #[test]
    fn test_sentinels_have_no_date() {
        assert!(to_utc(0).is_none());
        assert!(to_utc(-1).is_none());
        assert!(format_date(-1, Toronto).is_none());
    }

    #[test]
    fn test_offset_shifts_calendar_day() {
        // 2011-01-02 03:00 UTC is still the 1st in Toronto
        let minutes = 24 * 60 + 3 * 60;
        assert_eq!(format_date(minutes, Toronto).unwrap(), "2011-01-01");
        assert_eq!(
            format_datetime(minutes, Toronto).unwrap(),
            "2011-01-01 22:00:00"
        );
        assert_eq!(format_date(minutes, Tz::UTC).unwrap(), "2011-01-02");
    }

    #[test]
    fn test_summer_dates_use_daylight_time() {
        // 2011-07-01 12:00 UTC is 08:00 EDT
        let minutes = 181 * 24 * 60 + 12 * 60;
        assert_eq!(
            format_datetime(minutes, Toronto).unwrap(),
            "2011-07-01 08:00:00"
        );
        assert_eq!(
            format_datetime(minutes, Tz::UTC).unwrap(),
            "2011-07-01 12:00:00"
        );
    }
}
