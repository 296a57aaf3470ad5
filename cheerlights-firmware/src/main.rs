//! CheerLights matrix firmware
//!
//! Subscribes to an MQTT topic carrying Alertmanager notifications and
//! shows the newest CheerLights color in the middle of a 16x16 WS2812
//! panel, with up to twelve earlier colors walking the ring around it.
//!
//! Runs on a Raspberry Pi Pico W: WiFi through the CYW43 on PIO0, the LED
//! strip on PIO1 / GPIO16.

#![no_std]
#![no_main]

use cyw43_pio::{PioSpi, RM2_CLOCK_DIVIDER};
use defmt::*;
use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{PIO0, PIO1};
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_time::Timer;
use rand_core::RngCore;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cheerlights_core::config::{parse_config, DeviceConfig, Scheduling};
use cheerlights_core::{Intake, Palette, Renderer};
use cheerlights_display::brightness_level;

use crate::matrix::{Ws2812Matrix, MATRIX_SIZE};

mod channels;
mod matrix;
mod tasks;

/// Device configuration (compiled into firmware)
/// Edit device.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../device.toml");

/// Interval between "still alive" log lines
const HEARTBEAT_SECS: u64 = 5;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
    PIO1_IRQ_0 => InterruptHandler<PIO1>;
});

// Must live forever for task references
static DEVICE_CONFIG: StaticCell<DeviceConfig> = StaticCell::new();
static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("CheerLights matrix starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config: &'static DeviceConfig = DEVICE_CONFIG.init(load_config());

    // Blank the panel before anything slow happens
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO1, Irqs);
    let program = PioWs2812Program::new(&mut common);
    let strip = PioWs2812::new(&mut common, sm0, p.DMA_CH1, p.PIN_16, &program);
    let mut matrix = Ws2812Matrix::new(strip);

    let layout = match config.display.layout(MATRIX_SIZE, MATRIX_SIZE) {
        Ok(layout) => layout,
        Err(e) => defmt::panic!("Invalid display layout: {}", e),
    };
    let renderer = Renderer::new(layout, Palette::cheerlights(), config.display.pace_ms);
    let intake = Intake::new(config.intake.policy, renderer);

    let level = brightness_level(config.display.brightness);
    if let Err(e) = intake.start(&mut matrix, level) {
        defmt::panic!("Failed to clear display: {}", e);
    }
    info!(
        "Display cleared, brightness {}%, {} swatches",
        config.display.brightness,
        layout.swatch_count()
    );

    // CYW43 blobs are fetched separately, see build.rs
    let fw = include_bytes!("../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../cyw43-firmware/43439A0_clm.bin");

    let pwr = Output::new(p.PIN_23, Level::Low);
    let cs = Output::new(p.PIN_25, Level::High);
    let mut pio = Pio::new(p.PIO0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        RM2_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.PIN_24,
        p.PIN_29,
        p.DMA_CH0,
    );

    let state = CYW43_STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(tasks::cyw43_task(runner)).unwrap();

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;
    info!("WiFi radio initialized");

    let seed = RoscRng.next_u64();
    let (stack, runner) = embassy_net::new(
        net_device,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(tasks::net_task(runner)).unwrap();

    tasks::join_wifi(&mut control, &config.wifi).await;

    match config.intake.scheduling {
        Scheduling::Cooperative => {
            info!("Cooperative scheduling");
            spawner.spawn(tasks::mqtt_task(stack, &config.mqtt)).unwrap();
            spawner.spawn(tasks::intake_task(intake, matrix)).unwrap();
        }
        Scheduling::Polling => {
            info!(
                "Polling scheduling, every {} ms",
                config.intake.poll_interval_ms
            );
            spawner
                .spawn(tasks::poll_task(stack, config, intake, matrix))
                .unwrap();
        }
    }

    info!("All tasks spawned, firmware running");

    // Heartbeat, and rejoin if the access point goes away
    loop {
        Timer::after_secs(HEARTBEAT_SECS).await;
        if !stack.is_link_up() {
            warn!("WiFi link lost");
            tasks::join_wifi(&mut control, &config.wifi).await;
        }
        trace!("ok");
    }
}

/// Parse the embedded device.toml
///
/// build.rs validates the file, so failure here means the two parsers
/// disagree. There is no usable fallback without WiFi credentials.
fn load_config() -> DeviceConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Configuration loaded: {}, {}",
                config.wifi,
                config.intake.policy
            );
            config
        }
        Err(e) => defmt::panic!("Failed to parse embedded config: {}", e),
    }
}
