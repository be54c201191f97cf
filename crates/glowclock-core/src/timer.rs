//! One-shot retry timer driven by the caller's monotonic millisecond clock.

/// Countdown that fires at most once per arm.
///
/// Arming an armed timer replaces its deadline, so there is never more than one
/// pending fire. A fired timer stays disarmed until the next [`RetryTimer::arm`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RetryTimer {
    deadline_ms: Option<u64>,
}

impl RetryTimer {
    pub const fn new() -> Self {
        Self { deadline_ms: None }
    }

    pub fn arm(&mut self, now_ms: u64, delay_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(delay_ms));
    }

    pub fn disarm(&mut self) {
        self.deadline_ms = None;
    }

    pub const fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub const fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// Returns `true` exactly once when the deadline has passed, then disarms.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}
