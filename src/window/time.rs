use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("could not parse relative or absolute time: '{input}'")]
pub struct TimeParseError {
    pub input: String,
}

/// Absolute formats, tried in order after relative offsets.
#[derive(Debug, Clone, Copy)]
enum AbsoluteFormat {
    Rfc3339,
    SimpleDate,
    SimpleDateTime,
}

const ABSOLUTE_FORMATS: [AbsoluteFormat; 3] = [
    AbsoluteFormat::Rfc3339,
    AbsoluteFormat::SimpleDate,
    AbsoluteFormat::SimpleDateTime,
];

/// Parse a time expression into an absolute instant.
///
/// Accepts `now`, a signed offset such as `-2h` or `-1h15m` (units `ns`,
/// `us`/`µs`, `ms`, `s`, `m`, `h`) applied to `now`, an RFC3339 timestamp,
/// a `YYYY-MM-DD` date or a `YYYY-MM-DD HH:MM:SS` date and time. Dates
/// without an offset are read as UTC.
pub fn parse_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
    if input == "now" {
        return Ok(now);
    }

    if let Some(offset) = parse_offset(input) {
        return Ok(now + offset);
    }

    ABSOLUTE_FORMATS
        .iter()
        .find_map(|format| parse_absolute(input, *format))
        .ok_or_else(|| TimeParseError {
            input: input.to_string(),
        })
}

fn parse_absolute(input: &str, format: AbsoluteFormat) -> Option<DateTime<Utc>> {
    match format {
        AbsoluteFormat::Rfc3339 => DateTime::parse_from_rfc3339(input)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        AbsoluteFormat::SimpleDate => NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|ndt| Utc.from_utc_datetime(&ndt)),
        AbsoluteFormat::SimpleDateTime => NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|ndt| Utc.from_utc_datetime(&ndt)),
    }
}

/// Parse a signed sequence of `<number><unit>` terms into a duration.
///
/// Returns None when the input is not an offset at all, so the caller can
/// fall through to the absolute formats.
fn parse_offset(input: &str) -> Option<Duration> {
    let (negative, mut rest) = match input.as_bytes().first()? {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Some(Duration::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total_nanos: f64 = 0.0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        if number.is_empty() || number == "." {
            return None;
        }
        let value: f64 = number.parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = unit_nanos(&rest[..unit_len])?;
        rest = &rest[unit_len..];

        total_nanos += value * nanos_per_unit;
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return None;
    }

    let nanos = total_nanos.round() as i64;
    Some(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

fn unit_nanos(unit: &str) -> Option<f64> {
    let nanos = match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1_000.0,
        "ms" => 1_000_000.0,
        "s" => 1_000_000_000.0,
        "m" => 60.0 * 1_000_000_000.0,
        "h" => 3_600.0 * 1_000_000_000.0,
        _ => return None,
    };
    Some(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 12, 1, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_now_returns_reference() {
        assert_eq!(parse_time("now", reference()).unwrap(), reference());
    }

    #[test]
    fn test_relative_hours() {
        let result = parse_time("-2h", reference()).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2018, 12, 1, 13, 30, 0).unwrap());
    }

    #[test]
    fn test_relative_compound() {
        let result = parse_time("-1h15m", reference()).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2018, 12, 1, 14, 15, 0).unwrap());
    }

    #[test]
    fn test_relative_fractional_and_small_units() {
        let result = parse_time("1.5h", reference()).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2018, 12, 1, 17, 0, 0).unwrap());

        let result = parse_time("-300ms", reference()).unwrap();
        assert_eq!(result, reference() - Duration::milliseconds(300));

        let result = parse_time("-5us", reference()).unwrap();
        assert_eq!(result, reference() - Duration::microseconds(5));
    }

    #[test]
    fn test_zero_offset() {
        assert_eq!(parse_time("0", reference()).unwrap(), reference());
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let result = parse_time("2006-01-02T15:04:05-08:00", reference()).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2006, 1, 2, 23, 4, 5).unwrap());
    }

    #[test]
    fn test_simple_date_is_midnight_utc() {
        let expected = Utc.with_ymd_and_hms(2018, 6, 26, 0, 0, 0).unwrap();
        assert_eq!(parse_time("2018-06-26", reference()).unwrap(), expected);

        // Independent of the reference instant
        let other = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_time("2018-06-26", other).unwrap(), expected);
    }

    #[test]
    fn test_simple_date_and_time() {
        let result = parse_time("2018-06-26 12:43:30", reference()).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2018, 6, 26, 12, 43, 30).unwrap());
    }

    #[test]
    fn test_garbage_fails_with_input() {
        let err = parse_time("not-a-time", reference()).unwrap_err();
        assert_eq!(err.input, "not-a-time");
        assert!(err.to_string().contains("not-a-time"));
    }

    #[test]
    fn test_unitless_and_unknown_units_fail() {
        assert!(parse_time("-2", reference()).is_err());
        assert!(parse_time("-2d", reference()).is_err());
        assert!(parse_time("-", reference()).is_err());
        assert!(parse_time("", reference()).is_err());
        assert!(parse_time("h", reference()).is_err());
    }
}
