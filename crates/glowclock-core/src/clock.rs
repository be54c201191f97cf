//! Civil date/time for the clock face.

use core::fmt::Write;

use heapless::String;

use crate::render::{DATE_BYTES, Frame, TIME_BYTES};

const SECS_PER_DAY: i64 = 86_400;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    fn from_days_since_epoch(days: i64) -> Self {
        // 1970-01-01 was a Thursday.
        match (days + 4).rem_euclid(7) {
            0 => Self::Sunday,
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            _ => Self::Saturday,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sunday => "Sunday",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LocalDateTime {
    /// Seconds since the Unix epoch, already shifted into local time.
    pub local_seconds: i64,
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub weekday: Weekday,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalDateTime {
    pub fn from_unix(unix_seconds: i64, utc_offset_seconds: i32) -> Self {
        let local_seconds = unix_seconds.saturating_add(utc_offset_seconds as i64);
        let days = local_seconds.div_euclid(SECS_PER_DAY);
        let secs_of_day = local_seconds.rem_euclid(SECS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        Self {
            local_seconds,
            year,
            month,
            day,
            weekday: Weekday::from_days_since_epoch(days),
            hour: (secs_of_day / 3_600) as u8,
            minute: (secs_of_day / 60 % 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }

    /// Clock face: weekday, `M/D/YYYY`, `H:MM:SS`.
    pub fn clock_frame(&self) -> Frame {
        let mut date: String<DATE_BYTES> = String::new();
        let _ = write!(date, "{}/{}/{}", self.month, self.day, self.year);

        let mut time: String<TIME_BYTES> = String::new();
        let _ = write!(time, "{}:{:02}:{:02}", self.hour, self.minute, self.second);

        Frame::Clock {
            weekday: self.weekday.name(),
            date,
            time,
        }
    }
}

/// Source of local wall-clock time. Timezone resolution lives behind it.
pub trait WallClock {
    fn now(&self) -> LocalDateTime;
}

// Days since 1970-01-01 to proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);

    (year as i32, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_thursday_first_of_january() {
        let t = LocalDateTime::from_unix(0, 0);

        assert_eq!((t.year, t.month, t.day), (1970, 1, 1));
        assert_eq!(t.weekday, Weekday::Thursday);
        assert_eq!((t.hour, t.minute, t.second), (0, 0, 0));
    }

    #[test]
    fn leap_day_and_weekday() {
        // 2024-02-29T13:05:09Z
        let t = LocalDateTime::from_unix(1_709_211_909, 0);

        assert_eq!((t.year, t.month, t.day), (2024, 2, 29));
        assert_eq!(t.weekday, Weekday::Thursday);
        assert_eq!((t.hour, t.minute, t.second), (13, 5, 9));
    }

    #[test]
    fn utc_offset_can_cross_midnight_backwards() {
        // 2023-01-01T03:00:00Z in UTC-6 is still New Year's Eve.
        let t = LocalDateTime::from_unix(1_672_542_000, -6 * 3_600);

        assert_eq!((t.year, t.month, t.day), (2022, 12, 31));
        assert_eq!(t.weekday, Weekday::Saturday);
        assert_eq!(t.hour, 21);
    }

    #[test]
    fn clock_frame_formats_like_the_face() {
        // 2026-10-19T09:07:03Z, a Monday.
        let t = LocalDateTime::from_unix(1_792_400_823, 0);

        assert_eq!(
            t.clock_frame(),
            Frame::Clock {
                weekday: "Monday",
                date: String::try_from("10/19/2026").unwrap(),
                time: String::try_from("9:07:03").unwrap(),
            }
        );
    }
}
