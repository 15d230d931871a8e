//! Calendar-day boundaries for daily quests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

/// Maps instants to the local calendar day of a fixed time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayClock {
    tz: Tz,
}

impl DayClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA zone name such as `Asia/Ho_Chi_Minh`.
    pub fn from_name(name: &str) -> Result<Self, String> {
        name.parse::<Tz>().map(Self::new).map_err(|e| e.to_string())
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// `YYYY-MM-DD` of the local day containing `now`.
    pub fn day_key(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.tz).format("%Y-%m-%d").to_string()
    }

    /// The next local midnight after `now`, as UTC.
    pub fn next_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.tz).date_naive();
        let next_midnight = local_date
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|naive| self.tz.from_local_datetime(&naive).earliest());

        match next_midnight {
            Some(local) => local.with_timezone(&Utc),
            None => now + Duration::hours(24),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn day_key_follows_local_midnight() {
        let clock = DayClock::from_name("Asia/Ho_Chi_Minh").unwrap();
        // 16:59 UTC is 23:59 in UTC+7, 17:00 UTC is the next local day.
        assert_eq!(clock.day_key(at("2026-01-01T16:59:00Z")), "2026-01-01");
        assert_eq!(clock.day_key(at("2026-01-01T17:00:00Z")), "2026-01-02");
    }

    #[test]
    fn next_boundary_is_local_midnight() {
        let clock = DayClock::from_name("Asia/Ho_Chi_Minh").unwrap();
        let boundary = clock.next_boundary(at("2026-01-01T10:00:00Z"));
        assert_eq!(boundary, at("2026-01-01T17:00:00Z"));
    }

    #[test]
    fn rejects_unknown_zone() {
        assert!(DayClock::from_name("Mars/Olympus").is_err());
    }
}
