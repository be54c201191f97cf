//! Everything the asynchronous link workers hand to the control loop.

use heapless::{String, Vec};

pub const TOPIC_BYTES: usize = 64;
pub const PAYLOAD_BYTES: usize = 64;

/// One inbound publish, as much of it as fits.
///
/// Topics and payloads longer than the buffers keep their prefix and record the
/// real length in `total_len`, so the router can tell the message is incomplete.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InboundMessage {
    pub topic: String<TOPIC_BYTES>,
    pub payload: Vec<u8, PAYLOAD_BYTES>,
    pub offset: usize,
    pub total_len: usize,
}

impl InboundMessage {
    pub fn new(topic: &str, payload: &[u8]) -> Self {
        Self::fragment(topic, payload, 0, payload.len())
    }

    pub fn fragment(topic: &str, payload: &[u8], offset: usize, total_len: usize) -> Self {
        let mut stored_topic = String::new();
        for c in topic.chars() {
            if stored_topic.push(c).is_err() {
                break;
            }
        }

        let kept = payload.len().min(PAYLOAD_BYTES);
        let mut stored_payload = Vec::new();
        let _ = stored_payload.extend_from_slice(&payload[..kept]);

        let total_len = if kept < payload.len() {
            total_len.max(payload.len())
        } else {
            total_len
        };

        Self {
            topic: stored_topic,
            payload: stored_payload,
            offset,
            total_len,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.offset == 0 && self.payload.len() == self.total_len
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    NetworkUp,
    NetworkDown,
    SessionUp,
    SessionDown,
    Subscribed { ok: bool },
    Message(InboundMessage),
    /// The session dropped a publish that did not fit its receive buffer.
    MessageOverflow,
}

impl Event {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkUp => "network_up",
            Self::NetworkDown => "network_down",
            Self::SessionUp => "session_up",
            Self::SessionDown => "session_down",
            Self::Subscribed { .. } => "subscribed",
            Self::Message(_) => "message",
            Self::MessageOverflow => "message_overflow",
        }
    }
}
