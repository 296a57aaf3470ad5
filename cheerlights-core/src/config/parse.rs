//! Minimal TOML reader for the device configuration
//!
//! Handles only the subset `device.toml` uses. It does NOT support the
//! full TOML spec.
//!
//! Supported:
//! - `[section]` headers (`wifi`, `mqtt`, `display`, `intake`)
//! - `key = value` with string and integer values
//! - Comments (`# ...`), whole-line or trailing
//!
//! Unknown keys are ignored so newer files still load on older firmware.
//! Unknown sections are rejected since they usually mean a typo.

use heapless::String;

use super::types::{DeviceConfig, Scheduling};
use crate::geometry::BLOCKS_PER_ROW;
use crate::selector::{SelectorPolicy, TimestampMode};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value of the wrong type or out of range
    InvalidValue,
    /// Required key absent or empty (`section.key`)
    MissingKey(&'static str),
    /// String longer than its field can hold
    TooLong,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Wifi,
    Mqtt,
    Display,
    Intake,
}

/// Policy settings arrive as two independent keys
#[derive(Default)]
struct PolicyKeys {
    timestamp: bool,
    mode: TimestampMode,
}

/// Parse a `device.toml` document into a [`DeviceConfig`]
pub fn parse_config(input: &str) -> Result<DeviceConfig, ParseError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;
    let mut policy = PolicyKeys::default();

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config, &mut policy)?;
        }
    }

    config.intake.policy = if policy.timestamp {
        SelectorPolicy::Timestamp(policy.mode)
    } else {
        SelectorPolicy::EntryId
    };

    require(&config.wifi.ssid, "wifi.ssid")?;
    require(&config.mqtt.broker, "mqtt.broker")?;
    require(&config.mqtt.topic, "mqtt.topic")?;

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "wifi" => Ok(Section::Wifi),
        "mqtt" => Ok(Section::Mqtt),
        "display" => Ok(Section::Display),
        "intake" => Ok(Section::Intake),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Cut a trailing `# comment`, leaving `#` inside quotes alone
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

fn parse_text<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    let mut out = String::new();
    out.push_str(parse_string(value))
        .map_err(|_| ParseError::TooLong)?;
    Ok(out)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_percent(value: &str) -> Result<u8, ParseError> {
    match parse_int::<u8>(value)? {
        p @ 0..=100 => Ok(p),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_policy(value: &str) -> Result<bool, ParseError> {
    match parse_string(value) {
        "entry-id" => Ok(false),
        "timestamp" => Ok(true),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_timestamp_mode(value: &str) -> Result<TimestampMode, ParseError> {
    match parse_string(value) {
        "lenient" => Ok(TimestampMode::Lenient),
        "strict" => Ok(TimestampMode::Strict),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_scheduling(value: &str) -> Result<Scheduling, ParseError> {
    match parse_string(value) {
        "cooperative" => Ok(Scheduling::Cooperative),
        "polling" => Ok(Scheduling::Polling),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut DeviceConfig,
    policy: &mut PolicyKeys,
) -> Result<(), ParseError> {
    match section {
        Section::Root => {}
        Section::Wifi => match key {
            "ssid" => config.wifi.ssid = parse_text(value)?,
            "password" => config.wifi.password = parse_text(value)?,
            _ => {}
        },
        Section::Mqtt => match key {
            "broker" => config.mqtt.broker = parse_text(value)?,
            "port" => config.mqtt.port = parse_int(value)?,
            "topic" => config.mqtt.topic = parse_text(value)?,
            "client_id" => config.mqtt.client_id = parse_text(value)?,
            "keepalive_s" => config.mqtt.keepalive_s = parse_int(value)?,
            _ => {}
        },
        Section::Display => match key {
            "brightness" => config.display.brightness = parse_percent(value)?,
            "pace_ms" => config.display.pace_ms = parse_int(value)?,
            // Accepted for clarity, but the grid cannot change
            "blocks_per_row" => {
                if parse_int::<u16>(value)? != BLOCKS_PER_ROW {
                    return Err(ParseError::InvalidValue);
                }
            }
            _ => {}
        },
        Section::Intake => match key {
            "policy" => policy.timestamp = parse_policy(value)?,
            "timestamp_mode" => policy.mode = parse_timestamp_mode(value)?,
            "scheduling" => config.intake.scheduling = parse_scheduling(value)?,
            "poll_interval_ms" => config.intake.poll_interval_ms = parse_int(value)?,
            _ => {}
        },
    }
    Ok(())
}

fn require<const N: usize>(value: &String<N>, key: &'static str) -> Result<(), ParseError> {
    if value.is_empty() {
        Err(ParseError::MissingKey(key))
    } else {
        Ok(())
    }
}
