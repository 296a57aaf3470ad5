//! Polling loop
//!
//! One task owns the MQTT session and the display. Each round it takes at
//! most one message, decodes and renders it with blocking pauses between
//! swatches, then sleeps for the poll interval.

use cheerlights_core::config::DeviceConfig;
use cheerlights_core::{BlockingPacer, Intake};
use defmt::*;
use embassy_net::Stack;
use embassy_time::{Delay, Duration, Instant, Timer};

use super::intake::log_outcome;
use super::mqtt::{open, ping_interval, poll_message, Buffers, Inbound, LinkError, RECONNECT_SECS};
use crate::channels::MAX_PAYLOAD;
use crate::matrix::Ws2812Matrix;

/// How long one poll waits for a message
const RECEIVE_WINDOW_MS: u64 = 100;

/// Polling task: transport and display in one loop
#[embassy_executor::task]
pub async fn poll_task(
    stack: Stack<'static>,
    config: &'static DeviceConfig,
    mut intake: Intake,
    mut matrix: Ws2812Matrix,
) {
    info!("Poll task started");

    let mut buffers = Buffers::new();
    loop {
        if let Err(e) = session(stack, config, &mut buffers, &mut intake, &mut matrix).await {
            warn!("MQTT link down: {}", e);
        }
        Timer::after_secs(RECONNECT_SECS).await;
    }
}

/// Poll until the transport fails
async fn session(
    stack: Stack<'_>,
    config: &DeviceConfig,
    buffers: &mut Buffers,
    intake: &mut Intake,
    matrix: &mut Ws2812Matrix,
) -> Result<(), LinkError> {
    let mut client = open(stack, &config.mqtt, buffers).await?;
    let ping_every = ping_interval(&config.mqtt);
    let interval = Duration::from_millis(config.intake.poll_interval_ms.into());
    let mut pacer = BlockingPacer(Delay);
    let mut last_ping = Instant::now();

    loop {
        match poll_message(&mut client, Duration::from_millis(RECEIVE_WINDOW_MS)).await? {
            Some(Inbound::Message(payload)) => {
                let outcome = intake.handle_payload(&payload, matrix, &mut pacer).await;
                log_outcome(&outcome, &intake.state().history);
            }
            Some(Inbound::Oversized(len)) => {
                warn!("Dropping {} byte payload (limit {})", len, MAX_PAYLOAD);
            }
            None => {}
        }

        if last_ping.elapsed() >= ping_every {
            trace!("MQTT ping");
            client.send_ping().await.map_err(LinkError::Mqtt)?;
            last_ping = Instant::now();
        }

        // The network runners need this to be an async sleep
        Timer::after(interval).await;
    }
}
