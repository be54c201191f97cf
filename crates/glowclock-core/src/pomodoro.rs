//! Tick-driven pomodoro state machine.
//!
//! One call to [`PomodoroEngine::tick`] per wall-clock second. A finished phase
//! switches mode right away and then shows [`PHASE_BLINKS`] blink frames; the next
//! phase's countdown is loaded when the last blink is shown, so the clock stays at
//! zero for the whole blink sequence.

use core::fmt::Write;

use heapless::String;
use log::{info, warn};

use crate::{
    command::PomodoroPhase,
    config::{LONG_BREAK_EVERY, PHASE_BLINKS, POMODORO_COUNT_TOPIC, PomodoroMinutes},
    outbox::{PublishOutbox, PublishRequest},
    render::{COUNTDOWN_BYTES, Frame},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PomodoroMode {
    None,
    Work,
    ShortBreak,
    LongBreak,
}

impl PomodoroMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Work => "WORK!",
            Self::ShortBreak | Self::LongBreak => "BREAK!",
            Self::None => "",
        }
    }
}

/// `MM:SS`, minutes widen past two digits for durations over 99 minutes.
pub fn countdown_text(seconds: u32) -> String<COUNTDOWN_BYTES> {
    let mut out = String::new();
    let _ = write!(out, "{:02}:{:02}", seconds / 60, seconds % 60);
    out
}

#[derive(Debug)]
pub struct PomodoroEngine {
    minutes: PomodoroMinutes,
    mode: PomodoroMode,
    seconds_remaining: u32,
    blinks_remaining: u8,
    completed_count: u32,
}

impl PomodoroEngine {
    pub const fn new(minutes: PomodoroMinutes) -> Self {
        Self {
            minutes,
            mode: PomodoroMode::None,
            seconds_remaining: 0,
            blinks_remaining: 0,
            completed_count: 0,
        }
    }

    pub const fn mode(&self) -> PomodoroMode {
        self.mode
    }

    pub const fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub const fn blinks_remaining(&self) -> u8 {
        self.blinks_remaining
    }

    pub const fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub const fn minutes(&self) -> PomodoroMinutes {
        self.minutes
    }

    /// Takes effect the next time `phase` is entered.
    pub fn set_duration(&mut self, phase: PomodoroPhase, minutes: u8) {
        match phase {
            PomodoroPhase::Work => self.minutes.work = minutes,
            PomodoroPhase::ShortBreak => self.minutes.short_break = minutes,
            PomodoroPhase::LongBreak => self.minutes.long_break = minutes,
        }
        info!("pomodoro: {} set to {} min", phase.as_str(), minutes);
    }

    pub fn reset<O: PublishOutbox>(&mut self, outbox: &mut O) {
        self.mode = PomodoroMode::Work;
        self.seconds_remaining = self.phase_seconds(PomodoroMode::Work);
        self.blinks_remaining = 0;
        self.completed_count = 0;
        info!("pomodoro: reset to work");
        self.publish_count(outbox);
    }

    pub fn tick<O: PublishOutbox>(&mut self, outbox: &mut O) -> Frame {
        if self.mode == PomodoroMode::None {
            self.reset(outbox);
        }

        if self.blinks_remaining > 0 {
            let lit = self.blinks_remaining % 2 == 1;
            self.blinks_remaining -= 1;
            if self.blinks_remaining == 0 {
                self.seconds_remaining = self.phase_seconds(self.mode);
            }
            return Frame::Blink { lit };
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        let frame = Frame::Pomodoro {
            label: self.mode.label(),
            countdown: countdown_text(self.seconds_remaining),
        };

        if self.seconds_remaining == 0 {
            self.complete_phase(outbox);
        }

        frame
    }

    fn complete_phase<O: PublishOutbox>(&mut self, outbox: &mut O) {
        self.blinks_remaining = PHASE_BLINKS;

        self.mode = match self.mode {
            PomodoroMode::Work | PomodoroMode::None => {
                self.completed_count = self.completed_count.saturating_add(1);
                if self.completed_count % LONG_BREAK_EVERY == 0 {
                    PomodoroMode::LongBreak
                } else {
                    PomodoroMode::ShortBreak
                }
            }
            PomodoroMode::ShortBreak | PomodoroMode::LongBreak => PomodoroMode::Work,
        };

        info!(
            "pomodoro: phase complete, next={:?} completed={}",
            self.mode, self.completed_count
        );
        self.publish_count(outbox);
    }

    fn phase_seconds(&self, mode: PomodoroMode) -> u32 {
        let minutes = match mode {
            PomodoroMode::Work | PomodoroMode::None => self.minutes.work,
            PomodoroMode::ShortBreak => self.minutes.short_break,
            PomodoroMode::LongBreak => self.minutes.long_break,
        };
        minutes as u32 * 60
    }

    fn publish_count<O: PublishOutbox>(&self, outbox: &mut O) {
        let request = PublishRequest::retained_count(POMODORO_COUNT_TOPIC, self.completed_count);
        if outbox.enqueue(request).is_err() {
            warn!("pomodoro: could not queue count publish");
        }
    }
}
