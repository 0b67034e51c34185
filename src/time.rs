use chrono::{DateTime, NaiveDate, Utc};

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// ISO-8601 timestamp used for operation bookkeeping fields.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Parse an issued-date field into epoch millis for sorting.
///
/// Accepts full RFC 3339 timestamps and bare `YYYY-MM-DD` dates; anything
/// else sorts first (epoch zero), matching how unparsable dates behave in
/// the history views.
pub fn issued_ms(value: &str) -> i64 {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.timestamp_millis();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return dt.and_utc().timestamp_millis();
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_is_reasonable() {
        let a = now_ms();
        assert!(a > 1_500_000_000_000); // after 2017
        assert!(a < 4_100_000_000_000); // before year ~2100
    }

    #[test]
    fn issued_ms_parses_bare_dates() {
        assert_eq!(issued_ms("1970-01-01"), 0);
        assert!(issued_ms("2024-03-15") > issued_ms("2024-03-14"));
    }

    #[test]
    fn issued_ms_falls_back_to_zero() {
        assert_eq!(issued_ms("not a date"), 0);
        assert_eq!(issued_ms(""), 0);
    }

    #[test]
    fn issued_ms_accepts_rfc3339() {
        assert_eq!(issued_ms("1970-01-01T00:00:01Z"), 1000);
    }
}
