//! rust-mqtt glue that needs no socket: client settings, inbound framing and
//! QoS 1 acknowledgement bookkeeping.

use core::cell::Cell;

use glowclock_core::{
    event::InboundMessage,
    outbox::{PublishRequest, Qos},
};
use heapless::Vec;
use log::warn;
use rust_mqtt::{
    client::{
        client_config::{ClientConfig, MqttVersion},
        raw_client::Event as MqttEvent,
    },
    packet::v5::{publish_packet::QualityOfService, reason_codes::ReasonCode},
    utils::rng_generator::CountingRng,
};

use super::MqttConfig;

pub const MAX_PROPERTIES: usize = 5;
/// Unacknowledged QoS 1 publishes remembered across a reconnect.
pub const INFLIGHT_DEPTH: usize = 4;

const PACKET_ID_SEED: u64 = 20_000;
const MAX_LENGTH_BYTES: usize = 4;

/// MQTT v5 settings for one session.
///
/// Commands are subscribed at QoS 1, and the broker is told the largest packet
/// the device accepts so it drops oversized publishes instead of sending them.
pub fn client_config(
    config: &MqttConfig,
    max_packet_len: usize,
) -> ClientConfig<'static, MAX_PROPERTIES, CountingRng> {
    let mut client_config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(PACKET_ID_SEED));
    client_config.add_client_id(config.client_id);
    client_config.add_max_subscribe_qos(QualityOfService::QoS1);
    client_config.keep_alive = config.keep_alive_secs;
    client_config.max_packet_size = u32::try_from(max_packet_len).unwrap_or(u32::MAX);
    client_config
}

pub const fn publish_qos(qos: Qos) -> QualityOfService {
    match qos {
        Qos::AtMostOnce => QualityOfService::QoS0,
        Qos::AtLeastOnce => QualityOfService::QoS1,
    }
}

/// `true` when a failed subscribe was the broker saying no, rather than the
/// link or the byte stream failing underneath it.
pub fn subscribe_refused(code: &ReasonCode) -> bool {
    !matches!(code, ReasonCode::NetworkError | ReasonCode::BuffError)
}

/// An inbound packet copied out of the client buffers.
#[derive(Debug, PartialEq)]
pub enum Inbound {
    Message(InboundMessage),
    Acknowledged { id: u16, matched: bool },
    Pong,
    Disconnect(ReasonCode),
    Unexpected,
}

impl From<MqttEvent<'_>> for Inbound {
    fn from(event: MqttEvent<'_>) -> Self {
        match event {
            MqttEvent::Message(topic, payload) => Self::Message(InboundMessage::new(topic, payload)),
            MqttEvent::Puback(id, matched) => Self::Acknowledged { id, matched },
            MqttEvent::Pingresp => Self::Pong,
            MqttEvent::Disconnect(code) => Self::Disconnect(code),
            MqttEvent::Connack | MqttEvent::Suback(_) | MqttEvent::Unsuback(_) => Self::Unexpected,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Oversized {
    pub packet_len: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Framing {
    Header,
    Length {
        value: usize,
        shift: u32,
        header_len: usize,
    },
    Body {
        remaining: usize,
    },
}

/// Follows MQTT fixed headers through the inbound byte stream.
///
/// rust-mqtt sizes its reads by the announced remaining length, so a packet
/// larger than the receive buffer has to be refused while its header is read.
/// Once tripped the guard stays tripped for the rest of the session.
#[derive(Debug)]
pub struct PacketGuard {
    limit: usize,
    framing: Cell<Framing>,
    oversized: Cell<Option<usize>>,
}

impl PacketGuard {
    pub const fn new(limit: usize) -> Self {
        Self {
            limit,
            framing: Cell::new(Framing::Header),
            oversized: Cell::new(None),
        }
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Length of the packet that tripped the guard, if one did.
    pub fn oversized(&self) -> Option<usize> {
        self.oversized.get()
    }

    pub fn observe(&self, bytes: &[u8]) -> Result<(), Oversized> {
        if let Some(packet_len) = self.oversized.get() {
            return Err(Oversized { packet_len });
        }

        let mut framing = self.framing.get();
        let mut rest = bytes;
        while let Some((&byte, tail)) = rest.split_first() {
            match framing {
                Framing::Body { remaining } => {
                    let taken = remaining.min(rest.len());
                    rest = &rest[taken..];
                    framing = if taken == remaining {
                        Framing::Header
                    } else {
                        Framing::Body {
                            remaining: remaining - taken,
                        }
                    };
                    continue;
                }
                Framing::Header => {
                    framing = Framing::Length {
                        value: 0,
                        shift: 0,
                        header_len: 1,
                    };
                }
                Framing::Length {
                    value,
                    shift,
                    header_len,
                } => {
                    let value = value | (usize::from(byte & 0x7F) << shift);
                    let header_len = header_len + 1;
                    if byte & 0x80 != 0 && header_len <= MAX_LENGTH_BYTES {
                        framing = Framing::Length {
                            value,
                            shift: shift + 7,
                            header_len,
                        };
                    } else {
                        let packet_len = header_len + value;
                        if packet_len > self.limit {
                            self.oversized.set(Some(packet_len));
                            self.framing.set(Framing::Header);
                            return Err(Oversized { packet_len });
                        }
                        framing = if value == 0 {
                            Framing::Header
                        } else {
                            Framing::Body { remaining: value }
                        };
                    }
                }
            }
            rest = tail;
        }

        self.framing.set(framing);
        Ok(())
    }
}

/// QoS 1 publishes sent but not yet acknowledged by the broker.
#[derive(Debug, Default)]
pub struct Inflight {
    pending: Vec<(u16, PublishRequest), INFLIGHT_DEPTH>,
}

impl Inflight {
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// When full, the oldest pending publish is forgotten.
    pub fn track(&mut self, id: u16, request: PublishRequest) {
        if self.pending.is_full() {
            let (stale_id, stale) = self.pending.remove(0);
            warn!(
                "mqtt: inflight full, giving up on id {} ({})",
                stale_id, stale.topic
            );
        }
        let _ = self.pending.push((id, request));
    }

    /// Returns `false` for ids this session is not waiting on.
    pub fn acknowledge(&mut self, id: u16) -> bool {
        match self.pending.iter().position(|(pending, _)| *pending == id) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Hands back everything still unacknowledged, oldest first.
    pub fn take_unacknowledged(&mut self) -> Vec<PublishRequest, INFLIGHT_DEPTH> {
        let mut requests = Vec::new();
        for (_, request) in self.pending.iter() {
            let _ = requests.push(request.clone());
        }
        self.pending.clear();
        requests
    }
}

#[cfg(test)]
mod tests {
    use core::net::Ipv4Addr;

    use embassy_futures::block_on;
    use embedded_io_async::{ErrorKind, ErrorType, Read, ReadReady, Write};
    use rust_mqtt::client::raw_client::RawMqttClient;

    use super::*;

    /// Replays canned broker bytes through a [`PacketGuard`] and swallows writes.
    struct ScriptedBroker<'a> {
        inbound: &'a [u8],
        guard: &'a PacketGuard,
    }

    impl ErrorType for ScriptedBroker<'_> {
        type Error = ErrorKind;
    }

    impl Read for ScriptedBroker<'_> {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
            let len = buf.len().min(self.inbound.len());
            buf[..len].copy_from_slice(&self.inbound[..len]);
            self.inbound = &self.inbound[len..];
            self.guard
                .observe(&buf[..len])
                .map_err(|_| ErrorKind::InvalidData)?;
            Ok(len)
        }
    }

    impl Write for ScriptedBroker<'_> {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), ErrorKind> {
            Ok(())
        }
    }

    impl ReadReady for ScriptedBroker<'_> {
        fn read_ready(&mut self) -> Result<bool, ErrorKind> {
            Ok(!self.inbound.is_empty())
        }
    }

    fn count(value: u32) -> PublishRequest {
        PublishRequest::retained_count("display/pomodoro/count", value)
    }

    #[test]
    fn session_subscribes_at_qos1_and_caps_packet_size() {
        let config = MqttConfig::new(Ipv4Addr::new(192, 168, 1, 10), "glowclock")
            .with_keep_alive_secs(30);

        let client_config = client_config(&config, 256);

        assert_eq!(client_config.max_subscribe_qos, QualityOfService::QoS1);
        assert_eq!(client_config.keep_alive, 30);
        assert_eq!(client_config.max_packet_size, 256);
        assert_eq!(client_config.client_id.string, "glowclock");
    }

    #[test]
    fn count_publishes_go_out_at_qos1() {
        assert_eq!(publish_qos(count(1).qos), QualityOfService::QoS1);
        assert_eq!(publish_qos(Qos::AtMostOnce), QualityOfService::QoS0);
    }

    #[test]
    fn only_broker_answers_count_as_refusals() {
        assert!(subscribe_refused(&ReasonCode::NotAuthorized));
        assert!(subscribe_refused(&ReasonCode::Success));
        assert!(!subscribe_refused(&ReasonCode::NetworkError));
        assert!(!subscribe_refused(&ReasonCode::BuffError));
    }

    #[test]
    fn echoed_publish_and_puback_convert_to_owned_packets() {
        let echo = Inbound::from(MqttEvent::Message("display/pomodoro/count", b"1"));
        let ack = Inbound::from(MqttEvent::Puback(7, false));

        assert_eq!(
            echo,
            Inbound::Message(InboundMessage::new("display/pomodoro/count", b"1"))
        );
        assert_eq!(
            ack,
            Inbound::Acknowledged {
                id: 7,
                matched: false
            }
        );
        assert_eq!(Inbound::from(MqttEvent::Suback(3)), Inbound::Unexpected);
    }

    #[test]
    fn own_echo_before_puback_is_delivered_then_acknowledged() {
        const TOPIC: &[u8] = b"display/pomodoro/count";
        // QoS 0 echo of our own publish: topic, empty properties, payload.
        let mut script = std::vec![0x30, 26, 0x00, TOPIC.len() as u8];
        script.extend_from_slice(TOPIC);
        script.extend_from_slice(&[0x00, b'1']);
        // PUBACK for id 20001 with reason code and empty properties.
        script.extend_from_slice(&[0x40, 0x04, 0x4E, 0x21, 0x00, 0x00]);

        let guard = PacketGuard::new(64);
        let config = MqttConfig::new(Ipv4Addr::LOCALHOST, "glowclock");
        let mut tx = [0u8; 64];
        let mut rx = [0u8; 64];
        let mut client = RawMqttClient::<_, MAX_PROPERTIES, _>::new(
            ScriptedBroker {
                inbound: &script,
                guard: &guard,
            },
            &mut tx,
            64,
            &mut rx,
            64,
            client_config(&config, guard.limit()),
        );
        let mut inflight = Inflight::new();

        block_on(async {
            let request = count(1);
            let id = client
                .send_message(
                    request.topic,
                    request.payload.as_bytes(),
                    publish_qos(request.qos),
                    request.retain,
                )
                .await
                .unwrap();
            assert_eq!(id, 20_001);
            inflight.track(id, request);

            let echo = client.poll_if_ready::<1>().await.unwrap().map(Inbound::from);
            assert_eq!(
                echo,
                Some(Inbound::Message(InboundMessage::new(
                    "display/pomodoro/count",
                    b"1"
                )))
            );

            let ack = client.poll_if_ready::<1>().await.unwrap().map(Inbound::from);
            assert!(matches!(ack, Some(Inbound::Acknowledged { id: 20_001, .. })));
            assert!(inflight.acknowledge(id));
            assert!(client.poll_if_ready::<1>().await.unwrap().is_none());
        });

        assert!(inflight.is_empty());
        assert_eq!(guard.oversized(), None);
    }

    #[test]
    fn guard_follows_packets_read_in_pieces() {
        let guard = PacketGuard::new(16);

        // PUBLISH with remaining length 12, header byte by byte then the body.
        assert_eq!(guard.observe(&[0x30]), Ok(()));
        assert_eq!(guard.observe(&[12]), Ok(()));
        assert_eq!(guard.observe(&[0; 5]), Ok(()));
        assert_eq!(guard.observe(&[0; 7]), Ok(()));
        // PINGRESP has no body.
        assert_eq!(guard.observe(&[0xD0, 0x00]), Ok(()));
        // PUBACK in one read.
        assert_eq!(guard.observe(&[0x40, 0x02, 0x00, 0x07]), Ok(()));
        assert_eq!(guard.oversized(), None);
    }

    #[test]
    fn guard_trips_on_the_length_byte_of_an_oversized_packet() {
        let guard = PacketGuard::new(256);

        assert_eq!(guard.observe(&[0x30]), Ok(()));
        // Remaining length 300 encodes as 0xAC 0x02.
        assert_eq!(guard.observe(&[0xAC]), Ok(()));
        assert_eq!(guard.observe(&[0x02]), Err(Oversized { packet_len: 303 }));
        assert_eq!(guard.oversized(), Some(303));
        assert_eq!(guard.observe(&[0xD0, 0x00]), Err(Oversized { packet_len: 303 }));
    }

    #[test]
    fn packet_exactly_at_the_limit_passes() {
        let guard = PacketGuard::new(14);

        assert_eq!(guard.observe(&[0x30, 12]), Ok(()));
        assert_eq!(guard.observe(&[0; 12]), Ok(()));
        assert_eq!(guard.observe(&[0x30, 13]), Err(Oversized { packet_len: 15 }));
    }

    #[test]
    fn acks_settle_matching_publishes_only() {
        let mut inflight = Inflight::new();
        inflight.track(20_001, count(1));
        inflight.track(20_002, count(2));

        assert!(inflight.acknowledge(20_001));
        assert!(!inflight.acknowledge(20_001));
        assert!(!inflight.acknowledge(9));
        assert_eq!(inflight.len(), 1);
    }

    #[test]
    fn unacknowledged_publishes_survive_for_the_next_session() {
        let mut inflight = Inflight::new();
        for value in 0..=INFLIGHT_DEPTH as u32 {
            inflight.track(value as u16, count(value));
        }

        let resend = inflight.take_unacknowledged();

        assert!(inflight.is_empty());
        assert_eq!(resend.len(), INFLIGHT_DEPTH);
        assert_eq!(resend.first(), Some(&count(1)));
        assert_eq!(resend.last(), Some(&count(INFLIGHT_DEPTH as u32)));
    }
}
