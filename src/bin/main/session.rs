use embassy_futures::select::{Either, select};
use embassy_net::{
    Stack,
    tcp::{self, ConnectError, TcpSocket},
};
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::{Error, ErrorKind, ErrorType, Read, ReadReady, Write};
use glowclock_core::{
    config::SUBSCRIBE_FILTER,
    event::Event,
    outbox::{PublishRequest, Qos},
};
use glowclock_hal_esp32s3::network::{
    LinkBus, MqttConfig,
    mqtt::{
        Inbound, Inflight, MAX_PROPERTIES, Oversized, PacketGuard, client_config, publish_qos,
        subscribe_refused,
    },
};
use log::{debug, info, warn};
use rust_mqtt::{
    client::raw_client::{Event as MqttEvent, RawMqttClient},
    packet::v5::reason_codes::ReasonCode,
    utils::rng_generator::CountingRng,
};

const TCP_BUFFER_BYTES: usize = 1024;
const MQTT_BUFFER_BYTES: usize = 256;
/// How long the session sleeps when there is nothing to read or send.
const IDLE_POLL_MS: u64 = 20;

#[derive(Debug)]
pub enum SessionError {
    Tcp(ConnectError),
    Connect(ReasonCode),
    Subscribe(ReasonCode),
    Publish(ReasonCode),
    Receive(ReasonCode),
    Oversized(usize),
    Ping(ReasonCode),
    PingTimeout,
    Disconnected(ReasonCode),
}

impl SessionError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp(_) => "tcp",
            Self::Connect(_) => "connect",
            Self::Subscribe(_) => "subscribe",
            Self::Publish(_) => "publish",
            Self::Receive(_) => "receive",
            Self::Oversized(_) => "oversized packet",
            Self::Ping(_) => "ping",
            Self::PingTimeout => "ping timeout",
            Self::Disconnected(_) => "broker disconnect",
        }
    }
}

#[derive(Debug)]
pub enum TransportError {
    Tcp(tcp::Error),
    Oversized(Oversized),
}

impl Error for TransportError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Tcp(err) => err.kind(),
            Self::Oversized(_) => ErrorKind::InvalidData,
        }
    }
}

/// `embedded-io-async` view of an embassy-net socket for rust-mqtt.
///
/// Every inbound byte passes the [`PacketGuard`] before rust-mqtt sees it.
pub struct EmbassyNetTransport<'s, 'g> {
    socket: TcpSocket<'s>,
    guard: &'g PacketGuard,
}

impl<'s, 'g> EmbassyNetTransport<'s, 'g> {
    pub fn new(socket: TcpSocket<'s>, guard: &'g PacketGuard) -> Self {
        Self { socket, guard }
    }
}

impl ErrorType for EmbassyNetTransport<'_, '_> {
    type Error = TransportError;
}

impl Read for EmbassyNetTransport<'_, '_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let len = self.socket.read(buf).await.map_err(TransportError::Tcp)?;
        self.guard
            .observe(&buf[..len])
            .map_err(TransportError::Oversized)?;
        Ok(len)
    }
}

impl Write for EmbassyNetTransport<'_, '_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket.write(buf).await.map_err(TransportError::Tcp)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket.flush().await.map_err(TransportError::Tcp)
    }
}

impl ReadReady for EmbassyNetTransport<'_, '_> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.socket.read_ready().map_err(TransportError::Tcp)
    }
}

type Client<'c, 's, 'g> =
    RawMqttClient<'c, EmbassyNetTransport<'s, 'g>, MAX_PROPERTIES, CountingRng>;

/// Opens a broker session whenever the supervisor asks and reports how it ends.
pub async fn session_loop(stack: Stack<'_>, config: MqttConfig, bus: &'static LinkBus) -> ! {
    let mut tcp_rx = [0u8; TCP_BUFFER_BYTES];
    let mut tcp_tx = [0u8; TCP_BUFFER_BYTES];
    let mut mqtt_rx = [0u8; MQTT_BUFFER_BYTES];
    let mut mqtt_tx = [0u8; MQTT_BUFFER_BYTES];
    let mut inflight = Inflight::new();

    loop {
        bus.connect_session.wait().await;
        info!(
            "mqtt: connecting to {}:{} as {}",
            config.host, config.port, config.client_id
        );

        let err = run_session(
            stack,
            &config,
            bus,
            &mut inflight,
            &mut tcp_rx,
            &mut tcp_tx,
            &mut mqtt_rx,
            &mut mqtt_tx,
        )
        .await;
        warn!(
            "mqtt: session ended ({}): {:?}, {} publish(es) awaiting ack",
            err.as_str(),
            err,
            inflight.len()
        );
        bus.post(Event::SessionDown).await;
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_session(
    stack: Stack<'_>,
    config: &MqttConfig,
    bus: &'static LinkBus,
    inflight: &mut Inflight,
    tcp_rx: &mut [u8],
    tcp_tx: &mut [u8],
    mqtt_rx: &mut [u8],
    mqtt_tx: &mut [u8],
) -> SessionError {
    let keep_alive = Duration::from_secs(u64::from(config.keep_alive_secs.max(1)));
    // rust-mqtt assembles inbound packets in both buffers.
    let guard = PacketGuard::new(mqtt_rx.len().min(mqtt_tx.len()));

    let mut socket = TcpSocket::new(stack, tcp_rx, tcp_tx);
    socket.set_timeout(Some(keep_alive * 2));
    if let Err(err) = socket.connect((config.host, config.port)).await {
        return SessionError::Tcp(err);
    }

    let rx_len = mqtt_rx.len();
    let tx_len = mqtt_tx.len();
    let mut client: Client<'_, '_, '_> = RawMqttClient::new(
        EmbassyNetTransport::new(socket, &guard),
        mqtt_tx,
        tx_len,
        mqtt_rx,
        rx_len,
        client_config(config, guard.limit()),
    );

    if let Err(code) = client.connect_to_broker().await {
        return SessionError::Connect(code);
    }
    match client.poll::<0>().await {
        Ok(MqttEvent::Connack) => {}
        Ok(MqttEvent::Disconnect(code)) | Err(code) => return SessionError::Connect(code),
        Ok(_) => return SessionError::Connect(ReasonCode::ProtocolError),
    }
    info!("mqtt: session established");
    bus.post(Event::SessionUp).await;

    let mut filters: heapless::Vec<&str, 1> = heapless::Vec::new();
    let _ = filters.push(SUBSCRIBE_FILTER);
    let subscribe_id = match client.subscribe_to_topics(&filters).await {
        Ok(id) => id,
        Err(code) => return SessionError::Subscribe(code),
    };

    // Retained commands may arrive before the SUBACK; they are forwarded as usual.
    loop {
        let inbound = match client.poll::<1>().await {
            Ok(MqttEvent::Suback(id)) if id == subscribe_id => break,
            Ok(event) => Inbound::from(event),
            Err(code) if guard.oversized().is_none() && subscribe_refused(&code) => {
                warn!("mqtt: broker refused {}: {:?}", SUBSCRIBE_FILTER, code);
                bus.post(Event::Subscribed { ok: false }).await;
                return SessionError::Subscribe(code);
            }
            Err(code) => return receive_failed(code, &guard, bus).await,
        };
        if let Err(err) = handle_inbound(inbound, bus, inflight).await {
            return err;
        }
    }
    bus.post(Event::Subscribed { ok: true }).await;

    for request in inflight.take_unacknowledged() {
        info!("mqtt: resending unacknowledged {}", request.topic);
        if let Err(err) = publish(&mut client, request, inflight).await {
            return err;
        }
    }

    let ping_interval = keep_alive / 2;
    let mut last_ping = Instant::now();
    let mut ping_outstanding = false;

    // Packets are only read once bytes are waiting, and then read whole, so a
    // publish or ping never interrupts a half-received packet.
    loop {
        let inbound = match client.poll_if_ready::<1>().await {
            Ok(Some(event)) => Some(Inbound::from(event)),
            Ok(None) => None,
            Err(code) => return receive_failed(code, &guard, bus).await,
        };
        if let Some(inbound) = inbound {
            if inbound == Inbound::Pong {
                ping_outstanding = false;
            }
            if let Err(err) = handle_inbound(inbound, bus, inflight).await {
                return err;
            }
            continue;
        }

        if last_ping.elapsed() >= ping_interval {
            if ping_outstanding {
                return SessionError::PingTimeout;
            }
            if let Err(code) = client.send_ping().await {
                return SessionError::Ping(code);
            }
            ping_outstanding = true;
            last_ping = Instant::now();
            continue;
        }

        if let Either::First(request) =
            select(bus.publishes.receive(), Timer::after_millis(IDLE_POLL_MS)).await
            && let Err(err) = publish(&mut client, request, inflight).await
        {
            return err;
        }
    }
}

async fn handle_inbound(
    inbound: Inbound,
    bus: &'static LinkBus,
    inflight: &mut Inflight,
) -> Result<(), SessionError> {
    match inbound {
        Inbound::Message(message) => bus.post(Event::Message(message)).await,
        Inbound::Acknowledged { id, matched } => {
            if inflight.acknowledge(id) {
                debug!("mqtt: puback id={} matched={}", id, matched);
            } else {
                warn!("mqtt: puback for unknown id {}", id);
            }
        }
        Inbound::Pong => debug!("mqtt: pong"),
        Inbound::Disconnect(code) => return Err(SessionError::Disconnected(code)),
        Inbound::Unexpected => warn!("mqtt: ignoring unexpected packet"),
    }
    Ok(())
}

/// A stream or decode failure ends the session; only a packet the guard
/// refused is reported as an overflow.
async fn receive_failed(code: ReasonCode, guard: &PacketGuard, bus: &'static LinkBus) -> SessionError {
    match guard.oversized() {
        Some(packet_len) => {
            bus.post(Event::MessageOverflow).await;
            SessionError::Oversized(packet_len)
        }
        None => SessionError::Receive(code),
    }
}

async fn publish(
    client: &mut Client<'_, '_, '_>,
    request: PublishRequest,
    inflight: &mut Inflight,
) -> Result<(), SessionError> {
    info!(
        "mqtt: publish {} = {} retain={}",
        request.topic,
        request.payload.as_str(),
        request.retain
    );
    let id = client
        .send_message(
            request.topic,
            request.payload.as_bytes(),
            publish_qos(request.qos),
            request.retain,
        )
        .await
        .map_err(SessionError::Publish)?;

    if request.qos == Qos::AtLeastOnce {
        inflight.track(id, request);
    }
    Ok(())
}
