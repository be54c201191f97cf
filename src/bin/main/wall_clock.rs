use embassy_time::Instant;
use glowclock_core::clock::{LocalDateTime, WallClock};

/// Wall clock seeded at build time and advanced by the monotonic uptime timer.
pub struct UptimeWallClock {
    epoch_at_boot: i64,
    utc_offset_secs: i32,
    boot: Instant,
}

impl UptimeWallClock {
    pub fn new(epoch_at_boot: i64, utc_offset_minutes: i32) -> Self {
        Self {
            epoch_at_boot,
            utc_offset_secs: utc_offset_minutes.saturating_mul(60),
            boot: Instant::now(),
        }
    }

    pub fn unix_now(&self) -> i64 {
        let uptime_secs = self.boot.elapsed().as_secs() as i64;
        self.epoch_at_boot.saturating_add(uptime_secs)
    }
}

impl WallClock for UptimeWallClock {
    fn now(&self) -> LocalDateTime {
        LocalDateTime::from_unix(self.unix_now(), self.utc_offset_secs)
    }
}

/// Parses an optional signed decimal build setting, falling back on garbage.
pub fn parse_setting_i64(raw: Option<&str>, fallback: i64) -> i64 {
    raw.and_then(|text| text.trim().parse::<i64>().ok())
        .unwrap_or(fallback)
}
