use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// Parse a timestamp as stored by SQLite. `datetime('now')` produces
/// "YYYY-MM-DD HH:MM:SS" without a timezone; treat it as UTC. Corrupt values
/// degrade to the epoch rather than failing the whole response.
pub fn parse_db_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_datetime() {
        let ts = parse_db_timestamp("2025-06-01 12:30:00");
        assert_eq!(ts.to_rfc3339(), "2025-06-01T12:30:00+00:00");
    }

    #[test]
    fn parses_rfc3339() {
        let ts = parse_db_timestamp("2025-06-01T12:30:00Z");
        assert_eq!(ts.to_rfc3339(), "2025-06-01T12:30:00+00:00");
    }

    #[test]
    fn corrupt_value_degrades_to_epoch() {
        assert_eq!(parse_db_timestamp("not a date"), DateTime::<Utc>::default());
    }
}
