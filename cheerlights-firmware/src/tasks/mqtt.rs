//! MQTT transport
//!
//! Opens a TCP connection to the broker, connects with MQTT v5 and
//! subscribes to the alert topic at QoS 1. Every (re)connection
//! subscribes again. Any transport fault ends the session; the caller
//! waits a fixed back-off and starts over. Display state is not touched
//! by reconnects.

use core::net::Ipv4Addr;

use cheerlights_core::config::MqttConfig;
use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::{with_timeout, Duration, Timer};
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;

use crate::channels::{Payload, INBOX, MAX_PAYLOAD};

/// TCP socket buffer size (each direction)
const SOCKET_BUF_SIZE: usize = 4096;

/// MQTT packet buffer size: payload plus topic and header room
const PACKET_BUF_SIZE: usize = MAX_PAYLOAD + 512;

/// MQTT v5 properties kept per packet
const MAX_PROPERTIES: usize = 5;

/// Pause before reconnecting after a fault
pub const RECONNECT_SECS: u64 = 5;

/// Abort a connection attempt or unacknowledged send after this long
const SOCKET_TIMEOUT_SECS: u64 = 10;

/// Connected client borrowing a socket and packet buffers
pub type Client<'a> = MqttClient<'a, TcpSocket<'a>, MAX_PROPERTIES, CountingRng>;

/// Why a session ended
#[derive(defmt::Format)]
pub enum LinkError {
    /// Broker host name did not resolve
    Dns,
    /// TCP connection refused or timed out
    Connect,
    /// Broker or protocol error
    Mqtt(ReasonCode),
}

/// One received message
pub enum Inbound {
    Message(Payload),
    /// Body larger than the inbox can hold (length in bytes)
    Oversized(usize),
}

impl Inbound {
    fn copy(body: &[u8]) -> Self {
        match Payload::from_slice(body) {
            Ok(payload) => Inbound::Message(payload),
            Err(()) => Inbound::Oversized(body.len()),
        }
    }
}

/// Socket and packet buffers for one session at a time
pub struct Buffers {
    rx: [u8; SOCKET_BUF_SIZE],
    tx: [u8; SOCKET_BUF_SIZE],
    read: [u8; PACKET_BUF_SIZE],
    write: [u8; PACKET_BUF_SIZE],
}

impl Buffers {
    pub const fn new() -> Self {
        Self {
            rx: [0; SOCKET_BUF_SIZE],
            tx: [0; SOCKET_BUF_SIZE],
            read: [0; PACKET_BUF_SIZE],
            write: [0; PACKET_BUF_SIZE],
        }
    }
}

/// Half the keep-alive, so a ping always lands inside the window
pub fn ping_interval(config: &MqttConfig) -> Duration {
    Duration::from_secs(u64::from(config.keepalive_s.max(2)) / 2)
}

async fn resolve(stack: Stack<'_>, host: &str) -> Result<IpAddress, LinkError> {
    if let Ok(address) = host.parse::<Ipv4Addr>() {
        return Ok(IpAddress::Ipv4(address));
    }

    let found = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|_| LinkError::Dns)?;
    found.first().copied().ok_or(LinkError::Dns)
}

/// Connect to the broker and subscribe to the alert topic
pub async fn open<'a>(
    stack: Stack<'a>,
    config: &'a MqttConfig,
    buffers: &'a mut Buffers,
) -> Result<Client<'a>, LinkError> {
    stack.wait_config_up().await;

    let address = resolve(stack, &config.broker).await?;
    info!("Connecting to broker {}:{}", config.broker.as_str(), config.port);

    let mut socket = TcpSocket::new(stack, &mut buffers.rx, &mut buffers.tx);
    socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));
    socket
        .connect((address, config.port))
        .await
        .map_err(|_| LinkError::Connect)?;

    let mut client_config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
    client_config.add_max_subscribe_qos(QualityOfService::QoS1);
    client_config.add_client_id(&config.client_id);
    client_config.keep_alive = config.keepalive_s;
    client_config.max_packet_size = PACKET_BUF_SIZE as u32;

    let mut client = MqttClient::new(
        socket,
        &mut buffers.write,
        PACKET_BUF_SIZE,
        &mut buffers.read,
        PACKET_BUF_SIZE,
        client_config,
    );
    client.connect_to_broker().await.map_err(LinkError::Mqtt)?;

    info!("Subscribing to topic: {}", config.topic.as_str());
    client
        .subscribe_to_topic(&config.topic)
        .await
        .map_err(LinkError::Mqtt)?;

    Ok(client)
}

/// Wait for the next message, pinging the broker while idle
///
/// A ping drops the pending `receive_message`. If a publish was partly
/// read at that moment the next read fails and the session reconnects.
pub async fn next_message(client: &mut Client<'_>, ping_every: Duration) -> Result<Inbound, LinkError> {
    loop {
        match select(client.receive_message(), Timer::after(ping_every)).await {
            Either::First(Ok((_topic, body))) => return Ok(Inbound::copy(body)),
            Either::First(Err(code)) => return Err(LinkError::Mqtt(code)),
            Either::Second(()) => {
                trace!("MQTT ping");
                client.send_ping().await.map_err(LinkError::Mqtt)?;
            }
        }
    }
}

/// Wait at most `timeout` for one message
pub async fn poll_message(client: &mut Client<'_>, timeout: Duration) -> Result<Option<Inbound>, LinkError> {
    match with_timeout(timeout, client.receive_message()).await {
        Ok(Ok((_topic, body))) => Ok(Some(Inbound::copy(body))),
        Ok(Err(code)) => Err(LinkError::Mqtt(code)),
        Err(_) => Ok(None),
    }
}

/// Transport task for cooperative scheduling
///
/// Forwards every payload to the inbox. The inbox holds one payload, so
/// while a batch renders the next waits here.
#[embassy_executor::task]
pub async fn mqtt_task(stack: Stack<'static>, config: &'static MqttConfig) {
    info!("MQTT task started");

    let mut buffers = Buffers::new();
    loop {
        if let Err(e) = forward(stack, config, &mut buffers).await {
            warn!("MQTT link down: {}", e);
        }
        Timer::after_secs(RECONNECT_SECS).await;
    }
}

/// Run one session, returning only on a fault
async fn forward(stack: Stack<'_>, config: &MqttConfig, buffers: &mut Buffers) -> Result<(), LinkError> {
    let mut client = open(stack, config, buffers).await?;
    let ping_every = ping_interval(config);

    loop {
        match next_message(&mut client, ping_every).await? {
            Inbound::Message(payload) => {
                debug!("Received {} byte payload", payload.len());
                INBOX.send(payload).await;
            }
            Inbound::Oversized(len) => {
                warn!("Dropping {} byte payload (limit {})", len, MAX_PAYLOAD);
            }
        }
    }
}
