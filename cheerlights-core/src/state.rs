//! Process-wide display state
//!
//! Owned by the intake loop and lent out by exclusive reference; there
//! are no globals. Survives transport reconnects untouched.

use cheerlights_protocol::{EntryId, StartsAt};

use crate::history::ColorHistory;

/// High-water marks of already applied alerts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Markers {
    /// Highest entry id applied so far (never decreases)
    pub latest_entry_id: EntryId,
    /// Newest `startsAt` applied so far (strict timestamp policy only)
    pub latest_starts_at: Option<StartsAt>,
}

impl Markers {
    /// Markers before any alert has been applied
    pub const fn new() -> Self {
        Self {
            latest_entry_id: EntryId::NONE,
            latest_starts_at: None,
        }
    }
}

/// Everything the intake loop mutates
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub history: ColorHistory,
    pub markers: Markers,
}

impl DisplayState {
    /// Fresh state: empty history, nothing applied
    pub const fn new() -> Self {
        Self {
            history: ColorHistory::new(),
            markers: Markers::new(),
        }
    }
}
