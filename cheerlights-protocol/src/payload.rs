//! JSON payload decoding
//!
//! The wire structs mirror the JSON shape and are kept private; callers
//! only ever see [`AlertBatch`]. Unknown fields are skipped, so the full
//! Alertmanager webhook body (receiver, groupLabels, annotations, ...)
//! decodes as long as the fields we read have the expected types.
//!
//! Labels longer than their stored length are cut at a character
//! boundary instead of failing the batch. A cut label is longer than any
//! value the selectors or the palette compare against, so the record is
//! skipped or drawn with the fallback like any other unrecognized value.

use core::fmt;

use heapless::{String, Vec};
use serde::de::{Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::Deserialize;

use crate::alert::{
    AlertBatch, AlertRecord, ColorName, EntryId, Label, StartsAt, COLOR_NAME_LEN, LABEL_LEN,
    MAX_ALERTS,
};

/// Errors that reject a whole payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Not JSON, wrong shape, or a field of the wrong type
    Malformed,
    /// `labels.entryId` present but not a decimal integer
    InvalidEntryId,
    /// More than `MAX_ALERTS` alerts in one payload
    TooManyAlerts,
}

#[derive(Deserialize)]
struct WireBatch {
    alerts: WireAlerts,
}

/// Alerts up to the batch capacity, and whether any did not fit
struct WireAlerts {
    kept: Vec<WireAlert, MAX_ALERTS>,
    overflow: bool,
}

#[derive(Deserialize)]
struct WireAlert {
    #[serde(default, deserialize_with = "label")]
    status: Option<Label>,
    #[serde(default)]
    labels: WireLabels,
    #[serde(rename = "startsAt", default)]
    starts_at: Option<StartsAt>,
}

#[derive(Deserialize, Default)]
struct WireLabels {
    #[serde(default, deserialize_with = "label")]
    alertname: Option<Label>,
    #[serde(default, deserialize_with = "color_name")]
    color: Option<ColorName>,
    #[serde(rename = "entryId", default, deserialize_with = "entry_id")]
    entry_id: Option<WireEntryId>,
}

/// `labels.entryId` as text: either an integer or something else
enum WireEntryId {
    Valid(EntryId),
    Invalid,
}

impl<'de> Deserialize<'de> for WireAlerts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(AlertsVisitor)
    }
}

struct AlertsVisitor;

impl<'de> Visitor<'de> for AlertsVisitor {
    type Value = WireAlerts;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of alerts")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<WireAlerts, A::Error> {
        let mut kept = Vec::new();
        let mut overflow = false;
        while let Some(alert) = seq.next_element::<WireAlert>()? {
            if kept.push(alert).is_err() {
                overflow = true;
                break;
            }
        }
        // The list must still be read to its closing bracket
        while seq.next_element::<IgnoredAny>()?.is_some() {}

        Ok(WireAlerts { kept, overflow })
    }
}

/// Reads a string, keeping as many whole characters as fit in `N` bytes
struct Truncating<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for Truncating<N> {
    type Value = String<N>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: serde::de::Error>(self, text: &str) -> Result<String<N>, E> {
        let mut out = String::new();
        for c in text.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        Ok(out)
    }
}

/// Optional string field, cut to fit
struct OptionalTruncating<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for OptionalTruncating<N> {
    type Value = Option<String<N>>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or null")
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_str(Truncating::<N>).map(Some)
    }
}

fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Label>, D::Error> {
    deserializer.deserialize_option(OptionalTruncating::<LABEL_LEN>)
}

fn color_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ColorName>, D::Error> {
    deserializer.deserialize_option(OptionalTruncating::<COLOR_NAME_LEN>)
}

struct EntryIdVisitor;

impl<'de> Visitor<'de> for EntryIdVisitor {
    type Value = Option<WireEntryId>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer as a string")
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_str(self)
    }

    fn visit_str<E: serde::de::Error>(self, text: &str) -> Result<Self::Value, E> {
        Ok(Some(match EntryId::parse(text) {
            Some(id) => WireEntryId::Valid(id),
            None => WireEntryId::Invalid,
        }))
    }
}

fn entry_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<WireEntryId>, D::Error> {
    deserializer.deserialize_option(EntryIdVisitor)
}

impl TryFrom<WireAlert> for AlertRecord {
    type Error = DecodeError;

    fn try_from(wire: WireAlert) -> Result<Self, Self::Error> {
        let entry_id = match wire.labels.entry_id {
            Some(WireEntryId::Valid(id)) => Some(id),
            Some(WireEntryId::Invalid) => return Err(DecodeError::InvalidEntryId),
            None => None,
        };

        Ok(AlertRecord {
            status: wire.status,
            alert_name: wire.labels.alertname,
            color: wire.labels.color,
            entry_id,
            starts_at: wire.starts_at,
        })
    }
}

/// Decode a raw MQTT payload into an alert batch
pub fn decode(payload: &[u8]) -> Result<AlertBatch, DecodeError> {
    let (wire, _consumed): (WireBatch, usize) =
        serde_json_core::from_slice(payload).map_err(|_| DecodeError::Malformed)?;

    if wire.alerts.overflow {
        return Err(DecodeError::TooManyAlerts);
    }

    let mut batch = AlertBatch::new();
    for alert in wire.alerts.kept {
        // Capacities match, so this push cannot fail
        let _ = batch.alerts.push(AlertRecord::try_from(alert)?);
    }

    Ok(batch)
}
