//! Alert selection policies
//!
//! A selector looks at one decoded batch and decides which records carry
//! a new color to apply. Two policies exist, matching the two ways the
//! device can be fed:
//!
//! - **Entry id** (event-driven transport): every firing
//!   `cheerlights-updated` alert newer than the last applied entry id is
//!   applied, oldest first.
//! - **Timestamp** (poll-driven transport): the single alert with the
//!   latest `startsAt` is applied. In `Lenient` mode there is no
//!   comparison against earlier batches, so replaying an old batch
//!   re-applies its color. `Strict` mode keeps a `startsAt` high-water mark.
//!
//! Selection is pure. The selector reads the current markers and returns
//! the markers to commit; the batch is rejected as a whole on error and
//! nothing is applied.

pub mod entry_id;
pub mod timestamp;

pub use entry_id::EntryIdSelector;
pub use timestamp::TimestampSelector;

use cheerlights_protocol::{AlertBatch, ColorName, EntryId, StartsAt, MAX_ALERTS};
use heapless::Vec;

use crate::state::Markers;

/// Value a record was ordered by
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OrderingKey {
    EntryId(EntryId),
    StartsAt(StartsAt),
}

/// Record field a policy requires on every alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    EntryId,
    Status,
    AlertName,
    StartsAt,
}

/// Errors that reject a whole batch
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectError {
    /// A record lacks a field the policy orders or filters by
    MissingField(Field),
    /// The record chosen to apply has no color label
    MissingColor(OrderingKey),
}

/// Why an alert was not applied (several may hold at once)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SkipReasons {
    /// Not newer than the last applied alert
    pub stale: bool,
    /// Status other than "firing"
    pub not_firing: bool,
    /// Alert name other than "cheerlights-updated"
    pub wrong_alert_type: bool,
}

impl SkipReasons {
    /// Check if no reason applies (the alert is eligible)
    pub fn is_empty(&self) -> bool {
        !(self.stale || self.not_firing || self.wrong_alert_type)
    }
}

/// An alert chosen to apply
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Accepted {
    pub key: OrderingKey,
    pub color: ColorName,
}

/// An alert passed over, with the reasons
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Skipped {
    pub key: OrderingKey,
    pub reasons: SkipReasons,
}

/// Outcome of selecting over one batch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Selection {
    /// Alerts to apply, in application order
    pub accepted: Vec<Accepted, MAX_ALERTS>,
    /// Alerts passed over, in evaluation order
    pub skipped: Vec<Skipped, MAX_ALERTS>,
    /// Markers to commit once the accepted alerts are applied
    pub markers: Markers,
}

impl Selection {
    /// Empty selection that leaves `markers` unchanged
    pub fn unchanged(markers: Markers) -> Self {
        Self {
            accepted: Vec::new(),
            skipped: Vec::new(),
            markers,
        }
    }
}

/// Strategy deciding which alerts of a batch to apply
pub trait AlertSelector {
    /// Select over `batch` given the already applied `markers`
    fn select(&self, batch: &AlertBatch, markers: &Markers) -> Result<Selection, SelectError>;
}

/// High-water mark handling for the timestamp policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimestampMode {
    /// Apply the newest alert of every batch, even if older than one
    /// already applied
    #[default]
    Lenient,
    /// Only apply alerts newer than the newest one already applied
    Strict,
}

/// Policy chosen at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectorPolicy {
    EntryId,
    Timestamp(TimestampMode),
}

impl Default for SelectorPolicy {
    fn default() -> Self {
        SelectorPolicy::EntryId
    }
}

impl AlertSelector for SelectorPolicy {
    fn select(&self, batch: &AlertBatch, markers: &Markers) -> Result<Selection, SelectError> {
        match *self {
            SelectorPolicy::EntryId => EntryIdSelector.select(batch, markers),
            SelectorPolicy::Timestamp(mode) => TimestampSelector::new(mode).select(batch, markers),
        }
    }
}
