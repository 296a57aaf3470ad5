//! Device configuration
//!
//! Types describing how the device connects and renders, plus a small
//! line-based parser for the `device.toml` embedded in the firmware.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
