use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSchedule {
    #[error("weekday: {0} is out of range, expected 0 (Monday) to 6 (Sunday)")]
    WeekdayOutOfRange(u32),
    #[error("hour: {0} is out of range, expected 0 to 23")]
    HourOutOfRange(u32),
    #[error("minute: {0} is out of range, expected 0 to 59")]
    MinuteOutOfRange(u32),
    #[error("recurrence descriptor: `{0}` is malformed")]
    Malformed(String),
}

/// A weekly repeating schedule: fires every week on `weekday` at
/// `hour:minute` (UTC).
///
/// Only constructable through [`WeeklyRecurrence::new`], so every value in
/// circulation holds validated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyRecurrence {
    weekday: Weekday,
    hour: u32,
    minute: u32,
}

impl WeeklyRecurrence {
    /// `weekday` uses the Monday=0 convention.
    pub fn new(weekday: u32, hour: u32, minute: u32) -> Result<Self, InvalidSchedule> {
        let weekday = match weekday {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            6 => Weekday::Sun,
            _ => return Err(InvalidSchedule::WeekdayOutOfRange(weekday)),
        };
        if hour > 23 {
            return Err(InvalidSchedule::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(InvalidSchedule::MinuteOutOfRange(minute));
        }
        Ok(Self {
            weekday,
            hour,
            minute,
        })
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// The earliest occurrence of this rule strictly after `now`.
    ///
    /// When the time of day on the target weekday has already passed, or is
    /// exactly `now`, the result is 7 days out. Never returns a timestamp in
    /// the past, and re-arming at the fire instant itself always lands on
    /// next week's occurrence.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let days_ahead = (self.weekday.num_days_from_monday() + 7
            - now.weekday().num_days_from_monday())
            % 7;
        let candidate = (now.date_naive() + Duration::days(days_ahead as i64))
            .and_hms_opt(self.hour, self.minute, 0)
            .expect("hour and minute are validated on construction")
            .and_utc();
        if candidate <= now {
            candidate + Duration::days(7)
        } else {
            candidate
        }
    }
}

/// Wire form used in the persisted `recurrence` column:
/// `"{minute} {hour} * * {weekday}"` with Monday=0.
impl Display for WeeklyRecurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} * * {}",
            self.minute,
            self.hour,
            self.weekday.num_days_from_monday()
        )
    }
}

impl FromStr for WeeklyRecurrence {
    type Err = InvalidSchedule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || InvalidSchedule::Malformed(s.to_string());
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 5 || fields[2] != "*" || fields[3] != "*" {
            return Err(malformed());
        }
        let minute = fields[0].parse::<u32>().map_err(|_| malformed())?;
        let hour = fields[1].parse::<u32>().map_err(|_| malformed())?;
        let weekday = fields[4].parse::<u32>().map_err(|_| malformed())?;
        Self::new(weekday, hour, minute)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn it_rejects_out_of_range_fields() {
        assert_eq!(
            WeeklyRecurrence::new(7, 10, 0),
            Err(InvalidSchedule::WeekdayOutOfRange(7))
        );
        assert_eq!(
            WeeklyRecurrence::new(0, 24, 0),
            Err(InvalidSchedule::HourOutOfRange(24))
        );
        assert_eq!(
            WeeklyRecurrence::new(0, 10, 60),
            Err(InvalidSchedule::MinuteOutOfRange(60))
        );
        assert!(WeeklyRecurrence::new(6, 23, 59).is_ok());
    }

    #[test]
    fn it_computes_first_fire_from_a_saturday() {
        // Friday 18:30, asked on Saturday 2021-02-20: this week's Friday has
        // passed, so the first fire is next Friday 2021-02-26 18:30.
        let rule = WeeklyRecurrence::new(4, 18, 30).unwrap();
        let now = utc(2021, 2, 20, 12, 0, 0);
        assert_eq!(rule.next_fire(now), utc(2021, 2, 26, 18, 30, 0));
    }

    #[test]
    fn it_fires_today_when_time_of_day_is_still_ahead() {
        // 2021-02-22 is a Monday.
        let rule = WeeklyRecurrence::new(0, 18, 30).unwrap();
        let now = utc(2021, 2, 22, 9, 0, 0);
        assert_eq!(rule.next_fire(now), utc(2021, 2, 22, 18, 30, 0));
    }

    #[test]
    fn it_skips_to_next_week_when_time_of_day_has_passed() {
        let rule = WeeklyRecurrence::new(0, 18, 30).unwrap();
        let now = utc(2021, 2, 22, 19, 0, 0);
        assert_eq!(rule.next_fire(now), utc(2021, 3, 1, 18, 30, 0));
    }

    #[test]
    fn it_skips_to_next_week_at_the_exact_fire_instant() {
        let rule = WeeklyRecurrence::new(0, 18, 30).unwrap();
        let now = utc(2021, 2, 22, 18, 30, 0);
        assert_eq!(rule.next_fire(now), utc(2021, 3, 1, 18, 30, 0));
    }

    #[test]
    fn it_never_schedules_in_the_past() {
        let rule = WeeklyRecurrence::new(3, 6, 15).unwrap();
        let now = utc(2021, 7, 14, 23, 59, 59);
        assert!(rule.next_fire(now) > now);
    }

    #[test]
    fn it_round_trips_the_wire_format() {
        let rule = WeeklyRecurrence::new(4, 18, 30).unwrap();
        let descriptor = rule.to_string();
        assert_eq!(descriptor, "30 18 * * 4");
        assert_eq!(descriptor.parse::<WeeklyRecurrence>().unwrap(), rule);
    }

    #[test]
    fn it_rejects_malformed_descriptors() {
        for descriptor in ["", "30 18", "30 18 1 * 4", "a b * * c", "30 18 * * 7"] {
            assert!(descriptor.parse::<WeeklyRecurrence>().is_err());
        }
    }
}
