//! CheerLights alert notification protocol
//!
//! This crate defines the payload published on the MQTT alert topic and
//! decodes it into typed records. The payload is UTF-8 JSON in the shape
//! produced by an Alertmanager webhook bridge:
//!
//! ```text
//! {"alerts": [
//!   {"status": "firing",
//!    "labels": {"alertname": "cheerlights-updated", "color": "red", "entryId": "42"},
//!    "startsAt": 1700000000}
//! ]}
//! ```
//!
//! Any other fields are ignored. A batch either decodes completely or is
//! rejected as a whole; there is no partial decoding.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod alert;
pub mod payload;

pub use alert::{
    AlertBatch, AlertRecord, ColorName, EntryId, Label, StartsAt, ALERTNAME_UPDATED,
    COLOR_NAME_LEN, LABEL_LEN, MAX_ALERTS, STATUS_FIRING,
};
pub use payload::{decode, DecodeError};
