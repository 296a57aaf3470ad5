//! WiFi radio and IP stack
//!
//! The CYW43 runner and the embassy-net runner each need their own task.

use cheerlights_core::config::WifiConfig;
use cyw43::{Control, JoinOptions};
use cyw43_pio::PioSpi;
use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_time::Timer;

/// Pause between failed join attempts
const JOIN_RETRY_SECS: u64 = 5;

/// Drives the CYW43 radio
#[embassy_executor::task]
pub async fn cyw43_task(
    runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>,
) -> ! {
    runner.run().await
}

/// Drives the IP stack (DHCP, DNS, TCP)
#[embassy_executor::task]
pub async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Join the configured network, retrying until it succeeds
pub async fn join_wifi(control: &mut Control<'static>, wifi: &WifiConfig) {
    loop {
        let options = if wifi.password.is_empty() {
            JoinOptions::new_open()
        } else {
            JoinOptions::new(wifi.password.as_bytes())
        };

        info!("Joining WiFi network {}", wifi.ssid.as_str());
        match control.join(&wifi.ssid, options).await {
            Ok(()) => {
                info!("WiFi joined");
                return;
            }
            Err(e) => {
                warn!("WiFi join failed with status {}", e.status);
                Timer::after_secs(JOIN_RETRY_SECS).await;
            }
        }
    }
}
