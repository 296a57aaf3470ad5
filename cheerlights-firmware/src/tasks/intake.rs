//! Intake task
//!
//! Consumes payloads from the inbox one at a time. Rendering a batch runs
//! to completion, paced pauses included, before the next payload is
//! taken. The pauses are async, so the network tasks keep running.

use cheerlights_core::selector::{OrderingKey, SkipReasons};
use cheerlights_core::{ColorHistory, Intake, IntakeError, IntakeReport};
use defmt::*;
use embassy_time::Delay;

use crate::channels::INBOX;
use crate::matrix::Ws2812Matrix;

/// Intake task for cooperative scheduling
#[embassy_executor::task]
pub async fn intake_task(mut intake: Intake, mut matrix: Ws2812Matrix) {
    info!("Intake task started");

    let mut delay = Delay;
    loop {
        let payload = INBOX.receive().await;
        let outcome = intake.handle_payload(&payload, &mut matrix, &mut delay).await;
        log_outcome(&outcome, &intake.state().history);
    }
}

/// Log what happened to one payload
pub fn log_outcome(outcome: &Result<IntakeReport, IntakeError>, history: &ColorHistory) {
    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            warn!("Bad message received: {}", e);
            return;
        }
    };

    for skipped in &report.selection.skipped {
        debug!("Ignoring this alert: {}", skipped.key);
        log_reasons(skipped.reasons);
    }

    for accepted in &report.selection.accepted {
        match accepted.key {
            OrderingKey::EntryId(id) => {
                info!("Found new firing cheerlights-updated alert: entryId={}", id.get())
            }
            OrderingKey::StartsAt(at) => info!("Newest alert in batch: startsAt={}", at),
        }
        info!("Latest color: {}", accepted.color.as_str());
    }

    for name in &report.unknown_colors {
        warn!("Bad color name: {}", name.as_str());
    }

    if let Some(e) = report.display_error {
        error!("Display error during redraw: {}", e);
    }

    if !report.selection.accepted.is_empty() {
        debug!("{} swatches drawn, {}", report.swatches, history);
    }
}

fn log_reasons(reasons: SkipReasons) {
    if reasons.stale {
        debug!("Reason: not newer than the latest applied alert");
    }
    if reasons.not_firing {
        debug!("Reason: status was not firing");
    }
    if reasons.wrong_alert_type {
        debug!("Reason: alertname was not cheerlights-updated");
    }
}
