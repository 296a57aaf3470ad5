//! Decoded alert records

use heapless::{String, Vec};

/// Stored length of a color name label
///
/// Longer names are cut to this length on decode. Every palette name is
/// shorter, so a cut name never matches one.
pub const COLOR_NAME_LEN: usize = 24;

/// Stored length of a status or alert name label
///
/// Longer labels are cut like color names and can never equal
/// `STATUS_FIRING` or `ALERTNAME_UPDATED`.
pub const LABEL_LEN: usize = 32;

/// Maximum number of alerts carried by one payload
pub const MAX_ALERTS: usize = 16;

/// Status of an alert whose condition is currently active
pub const STATUS_FIRING: &str = "firing";

/// Alert name announcing a new CheerLights color
pub const ALERTNAME_UPDATED: &str = "cheerlights-updated";

/// Color name as announced on the wire (not validated against a palette)
pub type ColorName = String<COLOR_NAME_LEN>;

/// Short text label (status, alert name)
pub type Label = String<LABEL_LEN>;

/// Alert start time as carried in `startsAt`
pub type StartsAt = f64;

/// Increasing identifier assigned to each alert event
///
/// Zero is the "nothing applied yet" marker, so a record carrying entry
/// id `0` or a negative id can never be newer than the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntryId(pub i64);

impl EntryId {
    /// Sentinel that no positive entry id is at or below
    pub const NONE: EntryId = EntryId(0);

    /// Parse the decimal string form used in `labels.entryId`
    ///
    /// Accepts an optional sign and surrounding whitespace. Values outside
    /// `i64` saturate, which keeps their order relative to every
    /// representable id.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let magnitude = digits.bytes().fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });
        Some(EntryId(if negative { -magnitude } else { magnitude }))
    }

    /// Raw numeric value
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// One alert from a payload batch
///
/// Every field is optional at this layer. Which fields are required
/// depends on the selection policy consuming the batch.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertRecord {
    /// `status` ("firing", "resolved", ...)
    pub status: Option<Label>,
    /// `labels.alertname`
    pub alert_name: Option<Label>,
    /// `labels.color`
    pub color: Option<ColorName>,
    /// `labels.entryId`
    pub entry_id: Option<EntryId>,
    /// `startsAt`
    pub starts_at: Option<StartsAt>,
}

impl AlertRecord {
    /// Check if the alert status is "firing"
    pub fn is_firing(&self) -> bool {
        self.status.as_deref() == Some(STATUS_FIRING)
    }

    /// Check if this alert announces a CheerLights color update
    pub fn is_color_update(&self) -> bool {
        self.alert_name.as_deref() == Some(ALERTNAME_UPDATED)
    }

    /// Get the announced color name, if any
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

/// All alerts delivered in one payload, in wire order
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertBatch {
    pub alerts: Vec<AlertRecord, MAX_ALERTS>,
}

impl AlertBatch {
    /// Create an empty batch
    pub const fn new() -> Self {
        Self { alerts: Vec::new() }
    }

    /// Number of alerts in the batch
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Check if the batch carries no alerts
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Iterate alerts in wire order
    pub fn iter(&self) -> impl Iterator<Item = &AlertRecord> {
        self.alerts.iter()
    }
}
