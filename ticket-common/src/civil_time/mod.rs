use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::time::SystemTime;

#[derive(Debug)]
pub enum CivilParseError {
    Unparseable,
    NonexistentLocalTime,
}

impl std::error::Error for CivilParseError {}

impl fmt::Display for CivilParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CivilParseError::Unparseable => write!(f, "Date is not in a recognized format"),
            CivilParseError::NonexistentLocalTime => {
                write!(f, "Date does not exist in the configured time zone")
            }
        }
    }
}

/// Renders a UTC instant as wall-clock time in the given zone. Instants are
/// stored and compared in UTC everywhere; this is the display edge.
pub fn format_civil(time: SystemTime, zone: Tz) -> String {
    let utc: DateTime<Utc> = time.into();
    utc.with_timezone(&zone)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Parses a user-supplied date. RFC 3339 strings carry their own offset;
/// naive `YYYY-MM-DD[ HH:MM:SS]` strings are interpreted in `zone`.
pub fn parse_civil(input: &str, zone: Tz) -> Result<SystemTime, CivilParseError> {
    let input = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc).into());
    }

    let naive = if let Ok(datetime) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        datetime
    } else if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        match date.and_hms_opt(0, 0, 0) {
            Some(datetime) => datetime,
            None => return Err(CivilParseError::Unparseable),
        }
    } else {
        return Err(CivilParseError::Unparseable);
    };

    match zone.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc).into()),
        // DST fold; the earlier instant is as good a choice as any
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc).into()),
        LocalResult::None => Err(CivilParseError::NonexistentLocalTime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_format_civil_applies_zone_offset() {
        // 2024-03-01T12:00:00Z is 17:30 in Colombo (UTC+5:30)
        let instant = UNIX_EPOCH + Duration::from_secs(1_709_294_400);

        assert_eq!(
            format_civil(instant, chrono_tz::Asia::Colombo),
            "2024-03-01 17:30:00",
        );
        assert_eq!(format_civil(instant, chrono_tz::UTC), "2024-03-01 12:00:00");
    }

    #[test]
    fn test_parse_civil_naive_formats() {
        let zone = chrono_tz::Asia::Colombo;

        let from_datetime = parse_civil("2024-03-01 17:30:00", zone).unwrap();
        assert_eq!(
            from_datetime,
            UNIX_EPOCH + Duration::from_secs(1_709_294_400),
        );

        // Midnight Colombo on 2024-03-01 is 2024-02-29T18:30:00Z
        let from_date = parse_civil("2024-03-01", zone).unwrap();
        assert_eq!(from_date, UNIX_EPOCH + Duration::from_secs(1_709_231_400));
    }

    #[test]
    fn test_parse_civil_rfc3339_ignores_zone_argument() {
        let parsed = parse_civil("2024-03-01T12:00:00+00:00", chrono_tz::Asia::Colombo).unwrap();
        assert_eq!(parsed, UNIX_EPOCH + Duration::from_secs(1_709_294_400));
    }

    #[test]
    fn test_parse_civil_round_trips_through_format() {
        let zone = chrono_tz::Asia::Colombo;
        let instant = UNIX_EPOCH + Duration::from_secs(1_709_294_400);

        let formatted = format_civil(instant, zone);
        assert_eq!(parse_civil(&formatted, zone).unwrap(), instant);
    }

    #[test]
    fn test_parse_civil_rejects_garbage() {
        assert!(parse_civil("yesterday", chrono_tz::UTC).is_err());
        assert!(parse_civil("03/01/2024", chrono_tz::UTC).is_err());
        assert!(parse_civil("", chrono_tz::UTC).is_err());
    }
}
