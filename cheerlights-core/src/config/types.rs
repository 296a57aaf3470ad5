//! Configuration type definitions
//!
//! Credentials and endpoints are carried as opaque strings. Nothing here
//! checks that an SSID or broker name is well-formed.

use heapless::String;

use crate::geometry::{Layout, LayoutError, BLOCKS_PER_ROW};
use crate::render::DEFAULT_PACE_MS;
use crate::selector::{SelectorPolicy, TimestampMode};

/// Maximum WiFi SSID length (802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Maximum broker host name length
pub const MAX_HOST_LEN: usize = 64;

/// Maximum subscription topic length
pub const MAX_TOPIC_LEN: usize = 128;

/// Maximum MQTT client identifier length
pub const MAX_CLIENT_ID_LEN: usize = 32;

/// WiFi credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiConfig {
    pub ssid: String<MAX_SSID_LEN>,
    /// Empty for an open network
    pub password: String<MAX_PASSWORD_LEN>,
}

// Keeps the passphrase out of the log
#[cfg(feature = "defmt")]
impl defmt::Format for WifiConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "WifiConfig {{ ssid: {} }}", self.ssid.as_str());
    }
}

/// MQTT broker and subscription
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MqttConfig {
    /// Host name or dotted IPv4 address
    pub broker: String<MAX_HOST_LEN>,
    pub port: u16,
    pub topic: String<MAX_TOPIC_LEN>,
    pub client_id: String<MAX_CLIENT_ID_LEN>,
    /// Keep-alive interval in seconds
    pub keepalive_s: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        let mut client_id = String::new();
        let _ = client_id.push_str("cheerlights-matrix");
        Self {
            broker: String::new(),
            port: 1883,
            topic: String::new(),
            client_id,
            keepalive_s: 60,
        }
    }
}

/// Matrix rendering settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    /// Brightness in percent (0-100)
    pub brightness: u8,
    /// Pause after each history swatch
    pub pace_ms: u32,
}

impl DisplayConfig {
    /// Block geometry for a matrix of the given size
    ///
    /// The grid is fixed at `BLOCKS_PER_ROW`, which sizes the history.
    pub const fn layout(&self, width: u16, height: u16) -> Result<Layout, LayoutError> {
        Layout::new(width, height, BLOCKS_PER_ROW)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            brightness: 40,
            pace_ms: DEFAULT_PACE_MS,
        }
    }
}

/// How inbound messages are scheduled against rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scheduling {
    /// Transport and renderer run as separate tasks; pacing yields
    #[default]
    Cooperative,
    /// One loop checks for a message, processes it, then sleeps
    Polling,
}

/// Alert processing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntakeConfig {
    pub policy: SelectorPolicy,
    pub scheduling: Scheduling,
    /// Sleep between checks in the polling model
    pub poll_interval_ms: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            policy: SelectorPolicy::EntryId,
            scheduling: Scheduling::Cooperative,
            poll_interval_ms: 1000,
        }
    }
}

impl IntakeConfig {
    /// Timestamp handling, if the timestamp policy is selected
    pub fn timestamp_mode(&self) -> Option<TimestampMode> {
        match self.policy {
            SelectorPolicy::Timestamp(mode) => Some(mode),
            SelectorPolicy::EntryId => None,
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub wifi: WifiConfig,
    pub mqtt: MqttConfig,
    pub display: DisplayConfig,
    pub intake: IntakeConfig,
}
