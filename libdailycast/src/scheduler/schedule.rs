//! Daily fire-time computation

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ConfigError;

/// A validated daily schedule: a local time of day in an IANA timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    time_of_day: NaiveTime,
    timezone: Tz,
}

impl Schedule {
    pub fn new(time_of_day: NaiveTime, timezone: Tz) -> Self {
        Self {
            time_of_day,
            timezone,
        }
    }

    /// Parse `"HH:MM"` (24-hour, zero padded) and an IANA timezone name
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidTime` or `ConfigError::UnknownTimezone`
    pub fn parse(time: &str, timezone: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_time_of_day(time)?, parse_timezone(timezone)?))
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.time_of_day
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The next fire time strictly after `now`
    ///
    /// If today's local time has not passed yet it is today's, otherwise
    /// tomorrow's.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let candidate = self.occurrence_on(today);
        if candidate.with_timezone(&Utc) > now {
            return candidate;
        }

        let mut date = today;
        loop {
            date = next_day(date);
            let candidate = self.occurrence_on(date);
            if candidate.with_timezone(&Utc) > now {
                return candidate;
            }
        }
    }

    /// The fire time on the local day after `fired`
    ///
    /// Anchored to the previous fire, not to the current time, so that run
    /// duration never shifts the schedule.
    pub fn following(&self, fired: &DateTime<Tz>) -> DateTime<Tz> {
        let fired_date = fired.with_timezone(&self.timezone).date_naive();
        self.occurrence_on(next_day(fired_date))
    }

    /// The instant `time_of_day` happens on `date`
    ///
    /// When DST skips the local time, the first valid instant after the gap
    /// is used. When DST repeats it, the earlier instant is used.
    pub fn occurrence_on(&self, date: NaiveDate) -> DateTime<Tz> {
        let local = date.and_time(self.time_of_day);
        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                let mut candidate = local;
                for _ in 0..(24 * 60) {
                    candidate += Duration::minutes(1);
                    if let Some(dt) = self.timezone.from_local_datetime(&candidate).earliest() {
                        return dt;
                    }
                }
                self.timezone.from_utc_datetime(&local)
            }
        }
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "daily at {} {}", self.time_of_day.format("%H:%M"), self.timezone)
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}

fn parse_time_of_day(time: &str) -> Result<NaiveTime, ConfigError> {
    let invalid = || ConfigError::InvalidTime(time.to_string());

    let (hours, minutes) = time.trim().split_once(':').ok_or_else(invalid)?;
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err(invalid());
    }

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

fn parse_timezone(timezone: &str) -> Result<Tz, ConfigError> {
    timezone
        .trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone(timezone.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(time: &str, tz: &str) -> Schedule {
        Schedule::parse(time, tz).unwrap()
    }

    fn local(tz: Tz, s: &str) -> DateTime<Utc> {
        let naive = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        tz.from_local_datetime(&naive).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(
            schedule("19:00", "Asia/Kolkata").time_of_day(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap()
        );
        assert_eq!(
            schedule("00:05", "UTC").time_of_day(),
            NaiveTime::from_hms_opt(0, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_bad_times() {
        for bad in ["24:00", "19:60", "7:00", "19", "19:00:00", "ab:cd", "", "1900"] {
            assert!(
                matches!(Schedule::parse(bad, "UTC"), Err(ConfigError::InvalidTime(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_rejects_unknown_timezone() {
        assert!(matches!(
            Schedule::parse("19:00", "Asia/Atlantis"),
            Err(ConfigError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn test_next_fire_later_today() {
        let tz = chrono_tz::Asia::Kolkata;
        let s = schedule("19:00", "Asia/Kolkata");

        let next = s.next_fire_after(local(tz, "2025-06-10 18:00"));
        assert_eq!(next.with_timezone(&Utc), local(tz, "2025-06-10 19:00"));
    }

    #[test]
    fn test_next_fire_tomorrow_when_time_has_passed() {
        let tz = chrono_tz::Asia::Kolkata;
        let s = schedule("19:00", "Asia/Kolkata");

        let next = s.next_fire_after(local(tz, "2025-06-10 20:00"));
        assert_eq!(next.with_timezone(&Utc), local(tz, "2025-06-11 19:00"));
    }

    #[test]
    fn test_next_fire_is_strictly_after_now() {
        let tz = chrono_tz::Asia::Kolkata;
        let s = schedule("19:00", "Asia/Kolkata");

        let next = s.next_fire_after(local(tz, "2025-06-10 19:00"));
        assert_eq!(next.with_timezone(&Utc), local(tz, "2025-06-11 19:00"));
    }

    #[test]
    fn test_next_fire_uses_schedule_timezone_not_utc() {
        // 20:00 UTC is already 01:30 the next day in Kolkata
        let s = schedule("01:00", "Asia/Kolkata");
        let now = DateTime::parse_from_rfc3339("2025-06-10T20:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let next = s.next_fire_after(now);
        assert_eq!(next.format("%Y-%m-%d %H:%M").to_string(), "2025-06-12 01:00");
    }

    #[test]
    fn test_following_is_anchored_to_fire_time() {
        let s = schedule("19:00", "Asia/Kolkata");
        let fired = s.occurrence_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());

        let next = s.following(&fired);
        assert_eq!(next - fired, Duration::days(1));
        assert_eq!(next.format("%Y-%m-%d %H:%M").to_string(), "2025-06-11 19:00");
    }

    #[test]
    fn test_following_keeps_local_time_across_dst_change() {
        let s = schedule("19:00", "Europe/Amsterdam");
        // Clocks go back on 2025-10-26, so that day is 25 hours long
        let fired = s.occurrence_on(NaiveDate::from_ymd_opt(2025, 10, 25).unwrap());

        let next = s.following(&fired);
        assert_eq!(next.format("%Y-%m-%d %H:%M").to_string(), "2025-10-26 19:00");
        assert_eq!(next - fired, Duration::hours(25));
    }

    #[test]
    fn test_spring_forward_gap_moves_to_first_valid_instant() {
        // 02:30 does not exist in Amsterdam on 2025-03-30
        let s = schedule("02:30", "Europe/Amsterdam");
        let fire = s.occurrence_on(NaiveDate::from_ymd_opt(2025, 3, 30).unwrap());
        assert_eq!(fire.format("%H:%M").to_string(), "03:00");
    }

    #[test]
    fn test_fall_back_ambiguity_uses_earlier_instant() {
        // 02:30 happens twice in Amsterdam on 2025-10-26
        let s = schedule("02:30", "Europe/Amsterdam");
        let fire = s.occurrence_on(NaiveDate::from_ymd_opt(2025, 10, 26).unwrap());
        assert_eq!(fire.with_timezone(&Utc).format("%H:%M").to_string(), "00:30");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            schedule("07:45", "America/New_York").to_string(),
            "daily at 07:45 America/New_York"
        );
    }
}
