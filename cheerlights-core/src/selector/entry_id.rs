//! Entry id selection policy

use cheerlights_protocol::{AlertBatch, EntryId, MAX_ALERTS};
use heapless::Vec;

use super::{Accepted, AlertSelector, Field, OrderingKey, SelectError, Selection, SkipReasons, Skipped};
use crate::state::Markers;

/// Applies every new firing `cheerlights-updated` alert in entry id order
///
/// An alert is applied iff its entry id is greater than the latest one
/// applied, its status is "firing" and its alert name is
/// "cheerlights-updated". The latest applied id advances with each
/// acceptance, so a duplicate id later in the same batch is stale.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryIdSelector;

impl AlertSelector for EntryIdSelector {
    fn select(&self, batch: &AlertBatch, markers: &Markers) -> Result<Selection, SelectError> {
        // Every record is ordered and filtered, so every record needs the fields
        let mut order: Vec<(EntryId, usize), MAX_ALERTS> = Vec::new();
        for (index, alert) in batch.iter().enumerate() {
            let id = alert
                .entry_id
                .ok_or(SelectError::MissingField(Field::EntryId))?;
            if alert.status.is_none() {
                return Err(SelectError::MissingField(Field::Status));
            }
            if alert.alert_name.is_none() {
                return Err(SelectError::MissingField(Field::AlertName));
            }
            // Same capacity as the batch
            let _ = order.push((id, index));
        }

        // Wire position breaks ties, keeping equal ids in arrival order
        order.sort_unstable();

        let mut selection = Selection::unchanged(*markers);
        for (id, index) in order {
            let alert = &batch.alerts[index];
            let key = OrderingKey::EntryId(id);
            let reasons = SkipReasons {
                stale: id <= selection.markers.latest_entry_id,
                not_firing: !alert.is_firing(),
                wrong_alert_type: !alert.is_color_update(),
            };

            if reasons.is_empty() {
                let color = alert.color.clone().ok_or(SelectError::MissingColor(key))?;
                selection.markers.latest_entry_id = id;
                let _ = selection.accepted.push(Accepted { key, color });
            } else {
                let _ = selection.skipped.push(Skipped { key, reasons });
            }
        }

        Ok(selection)
    }
}
