//! Plumbing between the async link workers and the control loop.
//!
//! Workers never touch the app context: they post [`Event`]s and wait for
//! connect signals. The control loop is the only consumer of `events` and the
//! only producer of `publishes`.

use core::net::Ipv4Addr;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal};
use glowclock_core::{
    event::Event,
    outbox::{OUTBOX_DEPTH, PublishRequest},
};
use log::warn;

pub mod mqtt;

pub const EVENT_QUEUE_DEPTH: usize = 8;

pub type EventChannel = Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_DEPTH>;
pub type ConnectSignal = Signal<CriticalSectionRawMutex, ()>;
pub type PublishChannel = Channel<CriticalSectionRawMutex, PublishRequest, OUTBOX_DEPTH>;

/// Wi-Fi credentials source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl WifiConfig {
    pub const fn new(ssid: &'static str, password: &'static str) -> Self {
        Self { ssid, password }
    }
}

/// Broker endpoint and session identity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MqttConfig {
    pub host: Ipv4Addr,
    pub port: u16,
    pub client_id: &'static str,
    pub keep_alive_secs: u16,
}

impl MqttConfig {
    pub const DEFAULT_PORT: u16 = 1883;
    pub const DEFAULT_KEEP_ALIVE_SECS: u16 = 60;

    pub const fn new(host: Ipv4Addr, client_id: &'static str) -> Self {
        Self {
            host,
            port: Self::DEFAULT_PORT,
            client_id,
            keep_alive_secs: Self::DEFAULT_KEEP_ALIVE_SECS,
        }
    }

    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub const fn with_keep_alive_secs(mut self, keep_alive_secs: u16) -> Self {
        self.keep_alive_secs = keep_alive_secs;
        self
    }
}

/// Everything the workers and the control loop share.
pub struct LinkBus {
    pub events: EventChannel,
    pub connect_network: ConnectSignal,
    pub connect_session: ConnectSignal,
    pub publishes: PublishChannel,
}

impl LinkBus {
    pub const fn new() -> Self {
        Self {
            events: Channel::new(),
            connect_network: Signal::new(),
            connect_session: Signal::new(),
            publishes: Channel::new(),
        }
    }

    /// Worker side: waits for room rather than dropping a link event.
    pub async fn post(&self, event: Event) {
        self.events.send(event).await;
    }

    /// Control-loop side: hands a publish to the session worker.
    ///
    /// Returns `false` when the session worker is behind and the request was dropped.
    pub fn offer_publish(&self, request: PublishRequest) -> bool {
        match self.publishes.try_send(request) {
            Ok(()) => true,
            Err(_) => {
                warn!("bus: publish queue full, dropping request");
                false
            }
        }
    }
}

impl Default for LinkBus {
    fn default() -> Self {
        Self::new()
    }
}
