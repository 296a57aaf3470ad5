//! Build script for cheerlights-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml at compile time
//! - Checks that the CYW43 firmware blobs are present

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Blobs loaded into the WiFi chip at startup
const CYW43_BLOBS: &[&str] = &["cyw43-firmware/43439A0.bin", "cyw43-firmware/43439A0_clm.bin"];

fn main() {
    setup_linker();
    validate_config();
    check_wifi_blobs();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Validate device.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");
    if !config_path.exists() {
        fail(
            "device.toml not found!",
            &["The firmware embeds device.toml from the cheerlights-firmware".into(),
              "directory. Create one with [wifi] and [mqtt] sections.".into()],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read device.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in device.toml",
            &e.to_string().lines().map(String::from).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_wifi(&config, &mut errors);
    validate_mqtt(&config, &mut errors);
    validate_display(&config, &mut errors);
    validate_intake(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in device.toml", &errors);
    }

    println!("cargo:warning=device.toml validated successfully");
}

/// Print a boxed error and abort the build
fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| format!("║  • {:<62} ║", clip(line, 62)))
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}

/// Shorten `line` to at most `width` characters, marking the cut
///
/// Counts characters, not bytes, so UTF-8 text from device.toml or a
/// toml error never splits inside a character.
fn clip(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }
    let keep = width.saturating_sub(3);
    let cut = line.char_indices().nth(keep).map_or(line.len(), |(at, _)| at);
    format!("{}...", &line[..cut])
}

fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = config.as_table() else {
        return;
    };
    for (name, value) in table {
        if !["wifi", "mqtt", "display", "intake"].contains(&name.as_str()) {
            errors.push(format!("Unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("'{}' must be a [section]", name));
        }
    }
    for required in ["wifi", "mqtt"] {
        if config.get(required).is_none() {
            errors.push(format!("Missing [{}] section", required));
        }
    }
}

fn require_string(config: &toml::Value, section: &str, key: &str, max: usize, errors: &mut Vec<String>) {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::String(s)) if s.is_empty() => {
            errors.push(format!("[{}] '{}' must not be empty", section, key))
        }
        Some(toml::Value::String(s)) if s.len() > max => {
            errors.push(format!("[{}] '{}' longer than {} bytes", section, key, max))
        }
        Some(toml::Value::String(_)) => {}
        Some(_) => errors.push(format!("[{}] '{}' must be a string", section, key)),
        None => errors.push(format!("[{}] missing '{}'", section, key)),
    }
}

fn optional_string(config: &toml::Value, section: &str, key: &str, max: usize, errors: &mut Vec<String>) {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::String(s)) if s.len() > max => {
            errors.push(format!("[{}] '{}' longer than {} bytes", section, key, max))
        }
        Some(toml::Value::String(_)) | None => {}
        Some(_) => errors.push(format!("[{}] '{}' must be a string", section, key)),
    }
}

fn optional_int(config: &toml::Value, section: &str, key: &str, min: i64, max: i64, errors: &mut Vec<String>) {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(n)) if *n < min || *n > max => {
            errors.push(format!("[{}] '{}' must be {}-{}", section, key, min, max))
        }
        Some(toml::Value::Integer(_)) | None => {}
        Some(_) => errors.push(format!("[{}] '{}' must be an integer", section, key)),
    }
}

fn optional_choice(config: &toml::Value, section: &str, key: &str, choices: &[&str], errors: &mut Vec<String>) {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::String(s)) if !choices.contains(&s.as_str()) => {
            errors.push(format!("[{}] '{}' must be one of {:?}", section, key, choices))
        }
        Some(toml::Value::String(_)) | None => {}
        Some(_) => errors.push(format!("[{}] '{}' must be a string", section, key)),
    }
}

fn validate_wifi(config: &toml::Value, errors: &mut Vec<String>) {
    require_string(config, "wifi", "ssid", 32, errors);
    optional_string(config, "wifi", "password", 64, errors);
}

fn validate_mqtt(config: &toml::Value, errors: &mut Vec<String>) {
    require_string(config, "mqtt", "broker", 64, errors);
    require_string(config, "mqtt", "topic", 128, errors);
    optional_string(config, "mqtt", "client_id", 32, errors);
    optional_int(config, "mqtt", "port", 1, 65535, errors);
    optional_int(config, "mqtt", "keepalive_s", 0, 65535, errors);
}

fn validate_display(config: &toml::Value, errors: &mut Vec<String>) {
    optional_int(config, "display", "brightness", 0, 100, errors);
    optional_int(config, "display", "pace_ms", 0, u32::MAX as i64, errors);
    // The history length is sized for a 4x4 grid
    match config.get("display").and_then(|s| s.get("blocks_per_row")) {
        Some(toml::Value::Integer(4)) | None => {}
        Some(_) => errors.push("[display] 'blocks_per_row' is fixed at 4".into()),
    }
}

fn validate_intake(config: &toml::Value, errors: &mut Vec<String>) {
    optional_choice(config, "intake", "policy", &["entry-id", "timestamp"], errors);
    optional_choice(config, "intake", "timestamp_mode", &["lenient", "strict"], errors);
    optional_choice(config, "intake", "scheduling", &["cooperative", "polling"], errors);
    optional_int(config, "intake", "poll_interval_ms", 0, u32::MAX as i64, errors);
}

/// The CYW43 blobs are not redistributed with this repository
fn check_wifi_blobs() {
    let missing: Vec<String> = CYW43_BLOBS
        .iter()
        .inspect(|blob| println!("cargo:rerun-if-changed={}", blob))
        .filter(|blob| !Path::new(blob).exists())
        .map(|blob| format!("{} missing", blob))
        .collect();

    if !missing.is_empty() {
        let mut lines = missing;
        lines.push("Copy them from the embassy repository (cyw43-firmware/)".into());
        fail("CYW43 firmware blobs not found", &lines);
    }
}
