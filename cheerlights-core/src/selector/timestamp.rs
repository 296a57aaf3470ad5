//! Timestamp selection policy

use cheerlights_protocol::{AlertBatch, StartsAt};

use super::{
    Accepted, AlertSelector, Field, OrderingKey, SelectError, Selection, SkipReasons, Skipped,
    TimestampMode,
};
use crate::state::Markers;

/// Applies the alert with the latest `startsAt` in the batch
///
/// Ties go to the first such alert in wire order. Status and alert name
/// are not consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampSelector {
    mode: TimestampMode,
}

impl TimestampSelector {
    /// Create a selector with the given high-water mark handling
    pub const fn new(mode: TimestampMode) -> Self {
        Self { mode }
    }

    /// High-water mark handling in use
    pub fn mode(&self) -> TimestampMode {
        self.mode
    }
}

impl AlertSelector for TimestampSelector {
    fn select(&self, batch: &AlertBatch, markers: &Markers) -> Result<Selection, SelectError> {
        let mut newest: Option<(StartsAt, usize)> = None;
        for (index, alert) in batch.iter().enumerate() {
            let starts_at = alert
                .starts_at
                .ok_or(SelectError::MissingField(Field::StartsAt))?;
            // Strictly greater, so the first of equal timestamps wins
            if newest.map_or(true, |(best, _)| starts_at > best) {
                newest = Some((starts_at, index));
            }
        }

        let mut selection = Selection::unchanged(*markers);
        let Some((starts_at, index)) = newest else {
            return Ok(selection);
        };
        let key = OrderingKey::StartsAt(starts_at);

        if self.mode == TimestampMode::Strict
            && markers
                .latest_starts_at
                .is_some_and(|applied| starts_at <= applied)
        {
            let reasons = SkipReasons {
                stale: true,
                ..Default::default()
            };
            let _ = selection.skipped.push(Skipped { key, reasons });
            return Ok(selection);
        }

        let color = batch.alerts[index]
            .color
            .clone()
            .ok_or(SelectError::MissingColor(key))?;

        if self.mode == TimestampMode::Strict {
            selection.markers.latest_starts_at = Some(starts_at);
        }
        let _ = selection.accepted.push(Accepted { key, color });

        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cheerlights_protocol::decode;

    const BATCH: &[u8] = br#"{"alerts":[
        {"status":"resolved","startsAt":100,"labels":{"alertname":"cheerlights-updated","color":"red"}},
        {"status":"firing","startsAt":300,"labels":{"alertname":"cheerlights-updated","color":"cyan"}},
        {"status":"firing","startsAt":200,"labels":{"alertname":"cheerlights-updated","color":"blue"}}
    ]}"#;

    #[test]
    fn test_picks_latest_starts_at() {
        let batch = decode(BATCH).unwrap();
        let selection = TimestampSelector::default()
            .select(&batch, &Markers::new())
            .unwrap();

        assert_eq!(selection.accepted.len(), 1);
        assert_eq!(selection.accepted[0].color.as_str(), "cyan");
        assert_eq!(selection.accepted[0].key, OrderingKey::StartsAt(300.0));
        assert!(selection.skipped.is_empty());
    }

    #[test]
    fn test_tie_goes_to_first() {
        let batch = decode(br#"{"alerts":[
            {"startsAt":50,"labels":{"color":"orange"}},
            {"startsAt":50,"labels":{"color":"purple"}}
        ]}"#)
        .unwrap();
        let selection = TimestampSelector::default()
            .select(&batch, &Markers::new())
            .unwrap();
        assert_eq!(selection.accepted[0].color.as_str(), "orange");
    }

    #[test]
    fn test_lenient_reapplies_old_batch() {
        let batch = decode(BATCH).unwrap();
        let selector = TimestampSelector::new(TimestampMode::Lenient);

        let first = selector.select(&batch, &Markers::new()).unwrap();
        // Lenient mode does not track a high-water mark
        assert_eq!(first.markers, Markers::new());

        let second = selector.select(&batch, &first.markers).unwrap();
        assert_eq!(second.accepted.len(), 1);
    }

    #[test]
    fn test_strict_rejects_replay() {
        let batch = decode(BATCH).unwrap();
        let selector = TimestampSelector::new(TimestampMode::Strict);

        let first = selector.select(&batch, &Markers::new()).unwrap();
        assert_eq!(first.markers.latest_starts_at, Some(300.0));

        let second = selector.select(&batch, &first.markers).unwrap();
        assert!(second.accepted.is_empty());
        assert!(second.skipped[0].reasons.stale);
        assert_eq!(second.markers, first.markers);
    }

    #[test]
    fn test_strict_accepts_newer() {
        let batch = decode(BATCH).unwrap();
        let markers = Markers {
            latest_starts_at: Some(299.5),
            ..Markers::new()
        };
        let selection = TimestampSelector::new(TimestampMode::Strict)
            .select(&batch, &markers)
            .unwrap();
        assert_eq!(selection.accepted.len(), 1);
        assert_eq!(selection.markers.latest_starts_at, Some(300.0));
    }

    #[test]
    fn test_missing_starts_at_rejects_batch() {
        let batch = decode(br#"{"alerts":[{"startsAt":1,"labels":{"color":"red"}},{"labels":{"color":"blue"}}]}"#).unwrap();
        assert_eq!(
            TimestampSelector::default().select(&batch, &Markers::new()),
            Err(SelectError::MissingField(Field::StartsAt))
        );
    }

    #[test]
    fn test_selected_without_color_rejects_batch() {
        let batch = decode(br#"{"alerts":[{"startsAt":1,"labels":{"color":"red"}},{"startsAt":2}]}"#).unwrap();
        assert_eq!(
            TimestampSelector::default().select(&batch, &Markers::new()),
            Err(SelectError::MissingColor(OrderingKey::StartsAt(2.0)))
        );
    }

    #[test]
    fn test_empty_batch_selects_nothing() {
        let batch = decode(br#"{"alerts":[]}"#).unwrap();
        let selection = TimestampSelector::default()
            .select(&batch, &Markers::new())
            .unwrap();
        assert!(selection.accepted.is_empty());
    }
}
