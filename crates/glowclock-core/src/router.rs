//! Turns inbound `display/...` publishes into typed [`Command`]s.

use core::str;

use log::{debug, error, info, warn};

use crate::{
    command::{Command, PomodoroPhase, Rgb},
    config::{POMODORO_COUNT_TOPIC, SUBSCRIBE_FILTER, TOPIC_PREFIX},
    display::DisplayMode,
    error::{FatalError, Rejection},
    event::InboundMessage,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Subtopic {
    Mode,
    Color,
    Brightness,
    Duration(PomodoroPhase),
    Reset,
}

impl Subtopic {
    fn classify(subtopic: &str) -> Option<Self> {
        match subtopic {
            "mode" => Some(Self::Mode),
            "color" => Some(Self::Color),
            "brightness" => Some(Self::Brightness),
            "pomodoro/work" => Some(Self::Duration(PomodoroPhase::Work)),
            "pomodoro/short_break" => Some(Self::Duration(PomodoroPhase::ShortBreak)),
            "pomodoro/long_break" => Some(Self::Duration(PomodoroPhase::LongBreak)),
            "pomodoro/reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Parses one topic/payload pair. Pure; logging is left to [`Router`].
pub fn route(topic: &str, payload: &[u8]) -> Result<Command, Rejection> {
    if topic == POMODORO_COUNT_TOPIC {
        return Err(Rejection::OwnPublication);
    }

    let subtopic = topic
        .strip_prefix(TOPIC_PREFIX)
        .ok_or(Rejection::ForeignTopic)?;
    let kind = Subtopic::classify(subtopic).ok_or(Rejection::UnknownSubtopic)?;

    match kind {
        Subtopic::Reset => Ok(Command::ResetPomodoro),
        Subtopic::Mode => {
            let value = parse_decimal(payload)?;
            DisplayMode::from_wire(value)
                .map(Command::SetMode)
                .ok_or(Rejection::OutOfRange(value))
        }
        Subtopic::Color => {
            let value = parse_hex(payload)?;
            u32::try_from(value)
                .ok()
                .and_then(Rgb::from_rgb888)
                .map(Command::SetColor)
                .ok_or(Rejection::OutOfRange(value))
        }
        Subtopic::Brightness => parse_u8(payload).map(Command::SetBrightness),
        Subtopic::Duration(phase) => {
            let minutes = parse_u8(payload)?;
            Ok(Command::SetPomodoroDuration { phase, minutes })
        }
    }
}

fn payload_text(payload: &[u8]) -> Result<&str, Rejection> {
    str::from_utf8(payload)
        .map(str::trim)
        .map_err(|_| Rejection::NotUtf8)
}

fn parse_decimal(payload: &[u8]) -> Result<i64, Rejection> {
    payload_text(payload)?
        .parse::<i64>()
        .map_err(|_| Rejection::NotANumber)
}

fn parse_hex(payload: &[u8]) -> Result<i64, Rejection> {
    let text = payload_text(payload)?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Rejection::NotANumber);
    }

    // Too wide for i64 is certainly too wide for a color.
    i64::from_str_radix(text, 16).map_err(|_| Rejection::OutOfRange(i64::MAX))
}

fn parse_u8(payload: &[u8]) -> Result<u8, Rejection> {
    let value = parse_decimal(payload)?;
    u8::try_from(value).map_err(|_| Rejection::OutOfRange(value))
}

/// Subscription bookkeeping plus the fatal/recoverable split around [`route`].
#[derive(Debug, Default)]
pub struct Router {
    subscribed: bool,
    accepted: u32,
    rejected: u32,
}

impl Router {
    pub const fn new() -> Self {
        Self {
            subscribed: false,
            accepted: 0,
            rejected: 0,
        }
    }

    pub const fn filter(&self) -> &'static str {
        SUBSCRIBE_FILTER
    }

    pub const fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub const fn accepted(&self) -> u32 {
        self.accepted
    }

    pub const fn rejected(&self) -> u32 {
        self.rejected
    }

    pub fn on_subscribed(&mut self, ok: bool) -> Result<(), FatalError> {
        if !ok {
            error!("router: subscribing to {} failed", SUBSCRIBE_FILTER);
            self.subscribed = false;
            return Err(FatalError::SubscribeFailed);
        }

        info!("router: subscribed to {}", SUBSCRIBE_FILTER);
        self.subscribed = true;
        Ok(())
    }

    /// A new session starts unsubscribed.
    pub fn on_session_down(&mut self) {
        self.subscribed = false;
    }

    /// Returns `Ok(None)` for rejected input, which is logged and otherwise ignored.
    pub fn dispatch(&mut self, message: &InboundMessage) -> Result<Option<Command>, FatalError> {
        if !message.is_complete() {
            error!(
                "router: partial message on {} ({}+{}/{} bytes) is unsupported",
                message.topic.as_str(),
                message.offset,
                message.payload.len(),
                message.total_len
            );
            return Err(FatalError::FragmentedMessage {
                offset: message.offset,
                len: message.payload.len(),
                total_len: message.total_len,
            });
        }

        debug!(
            "router: {} <- {:?}",
            message.topic.as_str(),
            message.payload.as_slice()
        );

        match route(message.topic.as_str(), &message.payload) {
            Ok(command) => {
                self.accepted = self.accepted.saturating_add(1);
                info!("router: {} -> {:?}", message.topic.as_str(), command);
                Ok(Some(command))
            }
            Err(Rejection::OwnPublication) => {
                debug!("router: ignoring echo of {}", message.topic.as_str());
                Ok(None)
            }
            Err(rejection) => {
                self.rejected = self.rejected.saturating_add(1);
                warn!(
                    "router: rejected {} ({}, {:?})",
                    message.topic.as_str(),
                    rejection.as_str(),
                    rejection
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests;
