//! Publish requests queued by the core and sent by the session worker.
//!
//! Nothing in the core performs I/O; components enqueue here and the firmware
//! drains the queue towards the broker after each control-loop step.

use core::fmt::Write;

use heapless::{Deque, String};

pub const PUBLISH_PAYLOAD_BYTES: usize = 16;
pub const OUTBOX_DEPTH: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishRequest {
    pub topic: &'static str,
    pub payload: String<PUBLISH_PAYLOAD_BYTES>,
    pub qos: Qos,
    pub retain: bool,
}

impl PublishRequest {
    /// Retained QoS 1 publish of a decimal counter.
    pub fn retained_count(topic: &'static str, count: u32) -> Self {
        let mut payload = String::new();
        // u32::MAX is 10 digits, always fits.
        let _ = write!(payload, "{count}");
        Self {
            topic,
            payload,
            qos: Qos::AtLeastOnce,
            retain: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OutboxFull;

pub trait PublishOutbox {
    fn enqueue(&mut self, request: PublishRequest) -> Result<(), OutboxFull>;
}

/// Bounded FIFO outbox.
///
/// When full, the oldest request is dropped in favour of the newest: a retained
/// counter only ever needs its latest value.
#[derive(Debug, Default)]
pub struct BufferedOutbox<const N: usize = OUTBOX_DEPTH> {
    queue: Deque<PublishRequest, N>,
    dropped: u32,
}

impl<const N: usize> BufferedOutbox<N> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn pop(&mut self) -> Option<PublishRequest> {
        self.queue.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PublishRequest> + '_ {
        core::iter::from_fn(move || self.queue.pop_front())
    }
}

impl<const N: usize> PublishOutbox for BufferedOutbox<N> {
    fn enqueue(&mut self, request: PublishRequest) -> Result<(), OutboxFull> {
        if self.queue.is_full() {
            let _ = self.queue.pop_front();
            self.dropped = self.dropped.saturating_add(1);
            log::warn!("outbox: full, dropped oldest publish");
        }

        self.queue.push_back(request).map_err(|_| OutboxFull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_payload_is_decimal_retained_qos1() {
        let request = PublishRequest::retained_count("display/pomodoro/count", 12);

        assert_eq!(request.payload.as_str(), "12");
        assert_eq!(request.qos, Qos::AtLeastOnce);
        assert!(request.retain);
    }

    #[test]
    fn full_outbox_keeps_newest() {
        let mut outbox = BufferedOutbox::<2>::new();
        for count in 0..3 {
            outbox
                .enqueue(PublishRequest::retained_count("t", count))
                .unwrap();
        }

        let payloads: Vec<std::string::String> =
            outbox.drain().map(|r| r.payload.as_str().into()).collect();
        assert_eq!(payloads, ["1", "2"]);
        assert_eq!(outbox.dropped(), 1);
        assert!(outbox.is_empty());
    }
}
