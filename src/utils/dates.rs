use crate::error::{ProcessingError, Result};
use chrono::NaiveDate;

/// Parse a `YYYYMMDD` token. Anything but eight ASCII digits forming a real
/// calendar date is a `MalformedDate`.
pub fn parse_yyyymmdd(raw: &str) -> Result<NaiveDate> {
    let malformed = || ProcessingError::MalformedDate {
        value: raw.to_string(),
    };

    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_dates() {
        assert_eq!(
            parse_yyyymmdd("20200229").unwrap(),
            NaiveDate::from_ymd_opt(2020, 2, 29).unwrap()
        );
        assert_eq!(
            parse_yyyymmdd("19291001").unwrap(),
            NaiveDate::from_ymd_opt(1929, 10, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_malformed_dates() {
        for raw in ["2019022", "201902290", "20190229", "2019-2-1", "+2019011", "", "abcdefgh"] {
            assert!(
                matches!(parse_yyyymmdd(raw), Err(ProcessingError::MalformedDate { .. })),
                "{:?} should be malformed",
                raw
            );
        }
    }
}
