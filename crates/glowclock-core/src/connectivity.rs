//! Link supervision for the WiFi transport and the MQTT session.
//!
//! The supervisor never performs I/O. Link workers report transitions through the
//! `on_*` handlers, and [`Supervisor::poll`] tells the control loop which connect
//! attempts to start. A failure arms a one-shot retry; the fire is drained once, so
//! a link never has two connect attempts queued.

use log::{info, warn};

use crate::timer::RetryTimer;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkState {
    Down,
    Connecting,
    Up,
}

impl LinkState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Connecting => "connecting",
            Self::Up => "up",
        }
    }
}

/// Connect attempts the control loop must start this iteration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Reconnect {
    pub network: bool,
    pub session: bool,
}

impl Reconnect {
    pub const NONE: Self = Self {
        network: false,
        session: false,
    };

    pub const fn is_empty(self) -> bool {
        !self.network && !self.session
    }

    fn merge(&mut self, other: Self) {
        self.network |= other.network;
        self.session |= other.session;
    }
}

/// Immutable view for logs and tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LinkSnapshot {
    pub network: LinkState,
    pub session: LinkState,
    pub network_retry_armed: bool,
    pub session_retry_armed: bool,
}

#[derive(Debug)]
pub struct Supervisor {
    retry_delay_ms: u64,
    network: LinkState,
    session: LinkState,
    network_timer: RetryTimer,
    session_timer: RetryTimer,
    network_retry_due: bool,
    session_retry_due: bool,
    pending: Reconnect,
}

impl Supervisor {
    pub const fn new(retry_delay_ms: u64) -> Self {
        Self {
            retry_delay_ms,
            network: LinkState::Down,
            session: LinkState::Down,
            network_timer: RetryTimer::new(),
            session_timer: RetryTimer::new(),
            network_retry_due: false,
            session_retry_due: false,
            pending: Reconnect::NONE,
        }
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            network: self.network,
            session: self.session,
            network_retry_armed: self.network_timer.is_armed(),
            session_retry_armed: self.session_timer.is_armed(),
        }
    }

    pub const fn network(&self) -> LinkState {
        self.network
    }

    pub const fn session(&self) -> LinkState {
        self.session
    }

    /// Begins the first network connect without arming anything.
    pub fn start(&mut self) {
        self.request_network();
    }

    pub fn on_network_up(&mut self) {
        info!("link: network up");
        self.network = LinkState::Up;
        self.network_timer.disarm();
        self.network_retry_due = false;

        if self.session == LinkState::Down {
            self.request_session();
        }
    }

    pub fn on_network_down(&mut self, now_ms: u64) {
        warn!(
            "link: network lost (was {}), retry in {}ms",
            self.network.as_str(),
            self.retry_delay_ms
        );
        self.network = LinkState::Down;
        self.session = LinkState::Down;
        self.session_timer.disarm();
        self.session_retry_due = false;
        self.pending.session = false;
        self.network_timer.arm(now_ms, self.retry_delay_ms);
    }

    pub fn on_session_up(&mut self) {
        if self.network != LinkState::Up {
            warn!("link: session up reported without network; ignoring");
            return;
        }

        info!("link: session up");
        self.session = LinkState::Up;
        self.session_timer.disarm();
        self.session_retry_due = false;
    }

    pub fn on_session_down(&mut self, now_ms: u64) {
        if self.network != LinkState::Up {
            // The network-down path already reset the session.
            return;
        }

        warn!(
            "link: session lost (was {}), retry in {}ms",
            self.session.as_str(),
            self.retry_delay_ms
        );
        self.session = LinkState::Down;
        self.session_timer.arm(now_ms, self.retry_delay_ms);
    }

    /// Fires due retry timers and drains the resulting flags into connect requests.
    pub fn poll(&mut self, now_ms: u64) -> Reconnect {
        self.network_retry_due |= self.network_timer.fire_if_due(now_ms);
        self.session_retry_due |= self.session_timer.fire_if_due(now_ms);

        if self.network_retry_due {
            self.network_retry_due = false;
            info!("link: network retry due");
            self.request_network();
        }

        if self.session_retry_due && self.network == LinkState::Up {
            self.session_retry_due = false;
            info!("link: session retry due");
            self.request_session();
        }

        let mut out = Reconnect::NONE;
        out.merge(self.pending);
        self.pending = Reconnect::NONE;
        out
    }

    fn request_network(&mut self) {
        self.network = LinkState::Connecting;
        self.pending.network = true;
    }

    fn request_session(&mut self) {
        self.session = LinkState::Connecting;
        self.pending.session = true;
    }
}

#[cfg(test)]
mod tests;
