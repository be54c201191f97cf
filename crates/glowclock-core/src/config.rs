//! Tunables shared by the supervisor, router and pomodoro engine.

use crate::{command::Rgb, display::DisplayMode};

/// Fixed delay between a reported link failure and the next connect attempt.
pub const RETRY_DELAY_MS: u64 = 10_000;

/// Namespace every command topic lives under.
pub const TOPIC_PREFIX: &str = "display/";
/// Wildcard subscription covering the whole namespace.
pub const SUBSCRIBE_FILTER: &str = "display/#";
/// Retained counter of completed work intervals.
pub const POMODORO_COUNT_TOPIC: &str = "display/pomodoro/count";

/// Number of blink frames shown after a phase completes.
pub const PHASE_BLINKS: u8 = 5;
/// Every n-th completed work interval earns a long break.
pub const LONG_BREAK_EVERY: u32 = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PomodoroMinutes {
    pub work: u8,
    pub short_break: u8,
    pub long_break: u8,
}

impl Default for PomodoroMinutes {
    fn default() -> Self {
        Self {
            work: 25,
            short_break: 15,
            long_break: 5,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AppConfig {
    retry_delay_ms: u64,
    pomodoro: PomodoroMinutes,
    initial_mode: DisplayMode,
    initial_color: Rgb,
    initial_brightness: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: RETRY_DELAY_MS,
            pomodoro: PomodoroMinutes::default(),
            initial_mode: DisplayMode::Clock,
            initial_color: Rgb::WHITE,
            initial_brightness: 127,
        }
    }
}

impl AppConfig {
    pub const fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub const fn with_pomodoro_minutes(mut self, pomodoro: PomodoroMinutes) -> Self {
        self.pomodoro = pomodoro;
        self
    }

    pub const fn with_initial_mode(mut self, initial_mode: DisplayMode) -> Self {
        self.initial_mode = initial_mode;
        self
    }

    pub const fn with_initial_color(mut self, initial_color: Rgb) -> Self {
        self.initial_color = initial_color;
        self
    }

    pub const fn with_initial_brightness(mut self, initial_brightness: u8) -> Self {
        self.initial_brightness = initial_brightness;
        self
    }

    pub const fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms
    }

    pub const fn pomodoro_minutes(&self) -> PomodoroMinutes {
        self.pomodoro
    }

    pub const fn initial_mode(&self) -> DisplayMode {
        self.initial_mode
    }

    pub const fn initial_color(&self) -> Rgb {
        self.initial_color
    }

    pub const fn initial_brightness(&self) -> u8 {
        self.initial_brightness
    }
}
