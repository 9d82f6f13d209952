//! Custom askama filters for prices and stored timestamps.

use crate::hours;

pub fn money(cents: &i64) -> askama::Result<String> {
    let sign = if *cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    Ok(format!("{sign}${}.{:02}", cents / 100, cents % 100))
}

pub fn time_of_day(ts: &str) -> askama::Result<String> {
    Ok(formatted(ts, "%H:%M"))
}

pub fn day_of_month(ts: &str) -> askama::Result<String> {
    Ok(formatted(ts, "%d"))
}

pub fn month_name(ts: &str) -> askama::Result<String> {
    Ok(formatted(ts, "%B"))
}

pub fn long_date(ts: &str) -> askama::Result<String> {
    Ok(formatted(ts, "%B %-d"))
}

fn formatted(ts: &str, pattern: &str) -> String {
    hours::parse_timestamp(ts)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_renders_dollars_and_cents() {
        assert_eq!(money(&4500).unwrap(), "$45.00");
        assert_eq!(money(&305).unwrap(), "$3.05");
        assert_eq!(money(&0).unwrap(), "$0.00");
        assert_eq!(money(&-1250).unwrap(), "-$12.50");
    }

    #[test]
    fn timestamp_fragments() {
        let ts = "2026-08-10T09:30:00Z";
        assert_eq!(time_of_day(ts).unwrap(), "09:30");
        assert_eq!(day_of_month(ts).unwrap(), "10");
        assert_eq!(month_name(ts).unwrap(), "August");
        assert_eq!(long_date(ts).unwrap(), "August 10");
    }

    #[test]
    fn malformed_timestamps_render_empty() {
        assert_eq!(time_of_day("yesterday").unwrap(), "");
    }
}
