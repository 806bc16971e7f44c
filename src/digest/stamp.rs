use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampError {
    #[error("no YYYY-MM-DD-H(H) stamp in `{0}`")]
    NoMatch(String),
    #[error("invalid calendar date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("invalid hour {0}")]
    InvalidHour(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawStamp {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
}

fn digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0')),
    )
}

// `dddd-dd-dd-d` with a greedy optional second hour digit.
fn match_at(bytes: &[u8], start: usize) -> Option<RawStamp> {
    let rest = bytes.get(start..)?;
    if rest.len() < 12 || rest[4] != b'-' || rest[7] != b'-' || rest[10] != b'-' {
        return None;
    }
    let year = digits(&rest[0..4])?;
    let month = digits(&rest[5..7])?;
    let day = digits(&rest[8..10])?;
    let hour_len = if rest.get(12).is_some_and(u8::is_ascii_digit) {
        2
    } else {
        1
    };
    let hour = digits(&rest[11..11 + hour_len])?;
    Some(RawStamp {
        year: year as i32,
        month,
        day,
        hour,
    })
}

/// Parse the hour stamp embedded in an event archive's base name, e.g.
/// `2024-01-05-9.json.gz` becomes `2024-01-05T09:00:00Z`. The first position
/// in the name that matches the pattern wins.
pub fn parse_hour_stamp(file_name: &str) -> Result<DateTime<Utc>, StampError> {
    let bytes = file_name.as_bytes();
    let raw = (0..bytes.len())
        .find_map(|start| match_at(bytes, start))
        .ok_or_else(|| StampError::NoMatch(file_name.to_string()))?;

    let date = NaiveDate::from_ymd_opt(raw.year, raw.month, raw.day).ok_or(
        StampError::InvalidDate {
            year: raw.year,
            month: raw.month,
            day: raw.day,
        },
    )?;
    let naive = date
        .and_hms_opt(raw.hour, 0, 0)
        .ok_or(StampError::InvalidHour(raw.hour))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::{StampError, parse_hour_stamp};
    use chrono::{TimeZone, Utc};

    #[test]
    fn single_digit_hour_parses() {
        let got = parse_hour_stamp("2024-01-05-9.json.gz").expect("stamp");
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap());
        assert_eq!(got.to_rfc3339(), "2024-01-05T09:00:00+00:00");
    }

    #[test]
    fn two_digit_hour_parses() {
        let got = parse_hour_stamp("2015-03-31-23.json.gz").expect("stamp");
        assert_eq!(got, Utc.with_ymd_and_hms(2015, 3, 31, 23, 0, 0).unwrap());
    }

    #[test]
    fn stamp_may_follow_a_prefix() {
        let got = parse_hour_stamp("events-2024-12-01-0.json.gz").expect("stamp");
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn missing_hour_is_rejected() {
        assert_eq!(
            parse_hour_stamp("2024-01-05.json.gz"),
            Err(StampError::NoMatch("2024-01-05.json.gz".to_string()))
        );
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        assert_eq!(
            parse_hour_stamp("2024-02-30-1.json.gz"),
            Err(StampError::InvalidDate {
                year: 2024,
                month: 2,
                day: 30
            })
        );
        assert_eq!(
            parse_hour_stamp("2024-02-03-24.json.gz"),
            Err(StampError::InvalidHour(24))
        );
    }
}
