//! ISO-8601 time handling for request bounds.
//!
//! HAPI restricts timestamps to `YYYY-MM-DDThh:mm:ss.sssZ` or the
//! day-of-year form `YYYY-DDDThh:mm:ss.sssZ`, where any trailing part of the
//! time (and the `Z`) may be omitted.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::HapiError;

/// Parses a HAPI ISO-8601 timestamp.
///
/// # Errors
///
/// Returns [`HapiError::Time`] if the text is not a recognised form.
///
/// # Example
///
/// ```
/// use hapi_types::parse_iso;
///
/// let t = parse_iso("2020-032T12:30Z").unwrap();
/// assert_eq!(t.to_rfc3339(), "2020-02-01T12:30:00+00:00");
/// ```
pub fn parse_iso(text: &str) -> Result<DateTime<Utc>, HapiError> {
    let bad = || HapiError::Time(text.to_string());
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    let (date_part, time_part) = match trimmed.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (trimmed, None),
    };

    let date = parse_date(date_part).ok_or_else(bad)?;
    let time = match time_part {
        None | Some("") => NaiveTime::MIN,
        Some(t) => parse_time(t).ok_or_else(bad)?,
    };
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // YYYY-MM-DD has two dashes, YYYY-DDD has one.
    match text.matches('-').count() {
        2 => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
        1 => NaiveDate::parse_from_str(text, "%Y-%j").ok(),
        _ => None,
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let padded = match text.matches(':').count() {
        0 => format!("{text}:00:00"),
        1 => format!("{text}:00"),
        _ => text.to_string(),
    };
    NaiveTime::parse_from_str(&padded, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(&padded, "%H:%M:%S"))
        .ok()
}

/// Converts a HAPI timestamp to fractional seconds since the Unix epoch.
///
/// # Errors
///
/// Returns [`HapiError::Time`] if the text cannot be parsed.
pub fn iso_to_seconds(text: &str) -> Result<f64, HapiError> {
    let t = parse_iso(text)?;
    Ok(t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9)
}

/// Formats seconds since the epoch as `YYYY-MM-DDThh:mm:ssZ`.
///
/// Sub-second precision is truncated.
///
/// # Errors
///
/// Returns [`HapiError::Time`] if the value is outside chrono's range.
pub fn seconds_to_iso(seconds: f64) -> Result<String, HapiError> {
    let whole = seconds.trunc() as i64;
    DateTime::from_timestamp(whole, 0)
        .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .ok_or_else(|| HapiError::Time(seconds.to_string()))
}

/// Returns the midpoint of two timestamps, to whole-second precision.
///
/// The midpoint loses any sub-second part; repeated bisection of a very
/// short interval therefore converges on whole seconds.
///
/// # Errors
///
/// Returns [`HapiError::Time`] if either bound cannot be parsed.
pub fn iso_midpoint(start: &str, stop: &str) -> Result<String, HapiError> {
    let mid = 0.5 * (iso_to_seconds(start)? + iso_to_seconds(stop)?);
    seconds_to_iso(mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_full() {
        let t = parse_iso("2024-01-15T12:34:56.250Z").unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2024, 1, 15));
        assert_eq!((t.hour(), t.minute(), t.second()), (12, 34, 56));
        assert_eq!(t.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_truncated_forms() {
        let full = parse_iso("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(parse_iso("2024-01-15T12").unwrap(), full);
        assert_eq!(parse_iso("2024-01-15T12:00Z").unwrap(), full);
        assert_eq!(
            parse_iso("2024-01-15").unwrap(),
            parse_iso("2024-01-15T00:00:00.000Z").unwrap()
        );
        assert_eq!(
            parse_iso("2024-01-15T").unwrap(),
            parse_iso("2024-01-15Z").unwrap()
        );
    }

    #[test]
    fn test_parse_day_of_year() {
        assert_eq!(
            parse_iso("2024-060T06:00Z").unwrap(),
            parse_iso("2024-02-29T06:00:00Z").unwrap()
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(parse_iso("yesterday"), Err(HapiError::Time(_))));
        assert!(parse_iso("2024-13-01").is_err());
        assert!(parse_iso("2024-01-01T25:00").is_err());
    }

    #[test]
    fn test_seconds_round_trip() {
        let secs = iso_to_seconds("1970-01-02T00:00:01.5Z").unwrap();
        assert_relative_eq!(secs, 86_401.5);
        assert_eq!(seconds_to_iso(secs).unwrap(), "1970-01-02T00:00:01Z");
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(
            iso_midpoint("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z").unwrap(),
            "2024-01-01T12:00:00Z"
        );
        // Odd second spans truncate.
        assert_eq!(
            iso_midpoint("2024-01-01T00:00:00Z", "2024-01-01T00:00:03Z").unwrap(),
            "2024-01-01T00:00:01Z"
        );
        assert_eq!(
            iso_midpoint("2024-01-01", "2024-01-01T00:00:00.8").unwrap(),
            "2024-01-01T00:00:00Z"
        );
    }
}
