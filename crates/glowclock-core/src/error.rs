//! Failure tiers.
//!
//! [`Rejection`] covers bad remote input and is logged and dropped. [`FatalError`]
//! means the device can no longer be trusted to act on remote commands and must
//! restart.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rejection {
    ForeignTopic,
    UnknownSubtopic,
    OwnPublication,
    NotUtf8,
    NotANumber,
    OutOfRange(i64),
}

impl Rejection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForeignTopic => "foreign_topic",
            Self::UnknownSubtopic => "unknown_subtopic",
            Self::OwnPublication => "own_publication",
            Self::NotUtf8 => "not_utf8",
            Self::NotANumber => "not_a_number",
            Self::OutOfRange(_) => "out_of_range",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FatalError {
    SubscribeFailed,
    FragmentedMessage {
        offset: usize,
        len: usize,
        total_len: usize,
    },
    OversizedMessage,
}

impl FatalError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubscribeFailed => "subscribe_failed",
            Self::FragmentedMessage { .. } => "fragmented_message",
            Self::OversizedMessage => "oversized_message",
        }
    }

    /// Distinguished restart code logged before the board resets.
    pub const fn restart_code(self) -> u8 {
        match self {
            Self::SubscribeFailed => 1,
            Self::FragmentedMessage { .. } => 2,
            Self::OversizedMessage => 3,
        }
    }
}
