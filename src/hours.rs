use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Opening hours shared by every shop. Slots start on the half hour.
pub const OPEN_HOUR: u32 = 9;
pub const CLOSE_HOUR: u32 = 21;
pub const SLOT_MINUTES: i64 = 30;

/// How many days ahead the booking sheet lets a client pick.
pub const BOOKING_WINDOW_DAYS: usize = 14;

/// All bookable times for one day, from opening to closing inclusive.
/// The grid is the same for every day; only the date part changes.
pub fn day_time_slots(day: NaiveDate) -> Vec<NaiveDateTime> {
    let open = NaiveTime::from_hms_opt(OPEN_HOUR, 0, 0).unwrap_or_default();
    let close = NaiveTime::from_hms_opt(CLOSE_HOUR, 0, 0).unwrap_or_default();

    let mut slots = Vec::new();
    let mut current = day.and_time(open);
    let end = day.and_time(close);
    while current <= end {
        slots.push(current);
        current += Duration::minutes(SLOT_MINUTES);
    }
    slots
}

/// Consecutive selectable days starting at `from`.
pub fn upcoming_days(from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .filter_map(|offset| from.checked_add_signed(Duration::days(offset as i64)))
        .collect()
}

/// Timestamps are stored as RFC 3339 UTC with second precision and a `Z`
/// suffix, so lexicographic order matches chronological order in SQL.
pub fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn naive_to_timestamp(naive: NaiveDateTime) -> String {
    timestamp(Utc.from_utc_datetime(&naive))
}

pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A booking is confirmed while its date is strictly in the future.
/// Anything unparseable counts as finished.
pub fn is_confirmed(scheduled_for: &str, now: DateTime<Utc>) -> bool {
    parse_timestamp(scheduled_for)
        .map(|dt| dt > now)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn slots_cover_business_hours() {
        let slots = day_time_slots(day("2026-03-14"));
        assert_eq!(slots.len(), 25);
        assert_eq!(slots.first().unwrap().format("%H:%M").to_string(), "09:00");
        assert_eq!(slots.last().unwrap().format("%H:%M").to_string(), "21:00");
        assert!(slots.iter().all(|s| {
            let hour = s.format("%H:%M").to_string();
            hour.as_str() >= "09:00" && hour.as_str() <= "21:00"
        }));
    }

    #[test]
    fn slots_are_half_hour_spaced_and_deterministic() {
        let slots = day_time_slots(day("2026-03-14"));
        for pair in slots.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::minutes(30));
        }
        assert_eq!(slots, day_time_slots(day("2026-03-14")));
        // Same grid on a different day.
        let other = day_time_slots(day("2027-11-02"));
        let times: Vec<String> = slots.iter().map(|s| s.format("%H:%M").to_string()).collect();
        let other_times: Vec<String> = other.iter().map(|s| s.format("%H:%M").to_string()).collect();
        assert_eq!(times, other_times);
    }

    #[test]
    fn upcoming_days_starts_at_from() {
        let days = upcoming_days(day("2026-03-14"), 3);
        assert_eq!(days, vec![day("2026-03-14"), day("2026-03-15"), day("2026-03-16")]);
    }

    #[test]
    fn timestamps_round_trip_and_sort_lexicographically() {
        let earlier = naive_to_timestamp(day("2026-03-14").and_hms_opt(9, 30, 0).unwrap());
        let later = naive_to_timestamp(day("2026-03-14").and_hms_opt(15, 0, 0).unwrap());
        assert_eq!(earlier, "2026-03-14T09:30:00Z");
        assert!(earlier < later);
        assert_eq!(parse_timestamp(&earlier).unwrap(), Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap());
    }

    #[test]
    fn confirmed_means_strictly_future() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        assert!(is_confirmed("2026-03-14T12:30:00Z", now));
        assert!(!is_confirmed("2026-03-14T11:30:00Z", now));
        // A booking happening exactly now is no longer confirmed.
        assert!(!is_confirmed("2026-03-14T12:00:00Z", now));
        assert!(!is_confirmed("not-a-date", now));
    }
}
