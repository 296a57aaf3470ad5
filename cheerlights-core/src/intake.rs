//! Message intake
//!
//! One inbound payload is processed to completion before the next:
//! decode, select, commit markers, then for every accepted color record it
//! in the history and redraw. A payload that fails to decode or select is
//! dropped without touching the state.
//!
//! The intake never logs. Everything worth logging (skipped alerts,
//! unknown color names, display failures) is returned in an
//! [`IntakeReport`].

use cheerlights_display::{DisplayError, MatrixBackend};
use cheerlights_protocol::{decode, AlertBatch, ColorName, DecodeError};
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::history::HISTORY_CAPACITY;
use crate::render::{RenderReport, Renderer};
use crate::selector::{AlertSelector, SelectError, Selection, SelectorPolicy};
use crate::state::DisplayState;

/// Reasons a payload was discarded
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntakeError {
    /// Payload is not a well-formed alert batch
    Decode(DecodeError),
    /// Batch is missing a field the selection policy needs
    Select(SelectError),
}

impl From<DecodeError> for IntakeError {
    fn from(e: DecodeError) -> Self {
        IntakeError::Decode(e)
    }
}

impl From<SelectError> for IntakeError {
    fn from(e: SelectError) -> Self {
        IntakeError::Select(e)
    }
}

/// What happened while applying one batch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntakeReport {
    /// Accepted and skipped alerts, plus the committed markers
    pub selection: Selection,
    /// Redraws completed
    pub redraws: usize,
    /// History swatches drawn over all redraws
    pub swatches: usize,
    /// Distinct color names that were not in the palette
    pub unknown_colors: Vec<ColorName, HISTORY_CAPACITY>,
    /// First display failure, if any (later redraws still run)
    pub display_error: Option<DisplayError>,
}

impl IntakeReport {
    fn new(selection: Selection) -> Self {
        Self {
            selection,
            redraws: 0,
            swatches: 0,
            unknown_colors: Vec::new(),
            display_error: None,
        }
    }

    fn note_unknown(&mut self, color: &ColorName) {
        if !self.unknown_colors.contains(color) {
            // Full means every history name is already listed
            let _ = self.unknown_colors.push(color.clone());
        }
    }

    fn absorb(&mut self, render: &RenderReport) {
        self.swatches += render.swatches;
        for color in &render.unknown {
            self.note_unknown(color);
        }
    }
}

/// Owns the display state and applies inbound batches to it
pub struct Intake<S = SelectorPolicy> {
    selector: S,
    renderer: Renderer,
    state: DisplayState,
}

impl<S: AlertSelector> Intake<S> {
    /// Create an intake with empty history and nothing applied
    pub const fn new(selector: S, renderer: Renderer) -> Self {
        Self {
            selector,
            renderer,
            state: DisplayState::new(),
        }
    }

    /// Current display state
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Renderer in use
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Selection policy in use
    pub fn selector(&self) -> &S {
        &self.selector
    }

    /// Prepare the display: set brightness and blank it
    pub fn start<B: MatrixBackend>(&self, backend: &mut B, brightness: u8) -> Result<(), DisplayError> {
        backend.set_brightness(brightness)?;
        self.renderer.clear(backend)
    }

    /// Decode and apply one raw payload
    pub async fn handle_payload<B: MatrixBackend, D: DelayNs>(
        &mut self,
        payload: &[u8],
        backend: &mut B,
        delay: &mut D,
    ) -> Result<IntakeReport, IntakeError> {
        let batch = decode(payload)?;
        self.handle_batch(&batch, backend, delay).await
    }

    /// Apply one decoded batch
    ///
    /// Markers are committed before drawing starts, so a display failure
    /// never causes the same alert to be applied twice.
    pub async fn handle_batch<B: MatrixBackend, D: DelayNs>(
        &mut self,
        batch: &AlertBatch,
        backend: &mut B,
        delay: &mut D,
    ) -> Result<IntakeReport, IntakeError> {
        let selection = self.selector.select(batch, &self.state.markers)?;
        self.state.markers = selection.markers;

        let mut report = IntakeReport::new(selection);
        for accepted in report.selection.accepted.clone() {
            self.state.history.push_front(accepted.color);

            match self.redraw(backend, delay, &mut report).await {
                Ok(()) => report.redraws += 1,
                Err(e) => {
                    report.display_error.get_or_insert(e);
                }
            }
        }

        Ok(report)
    }

    /// Draw the current color, then the previous ones around the ring
    async fn redraw<B: MatrixBackend, D: DelayNs>(
        &self,
        backend: &mut B,
        delay: &mut D,
        report: &mut IntakeReport,
    ) -> Result<(), DisplayError> {
        if let Some(current) = self.state.history.current() {
            if self.renderer.render_current(backend, current)?.is_fallback() {
                report.note_unknown(current);
            }
        }

        let render = self
            .renderer
            .render_history(backend, delay, self.state.history.previous())
            .await?;
        report.absorb(&render);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Layout;
    use crate::palette::Palette;
    use crate::render::tests::RecordingDelay;
    use crate::selector::TimestampMode;
    use cheerlights_display::{FrameBuffer, RGB8};
    use cheerlights_protocol::EntryId;
    use embassy_futures::block_on;

    const BLUE: RGB8 = RGB8 { r: 0, g: 0, b: 255 };
    const RED: RGB8 = RGB8 { r: 255, g: 0, b: 0 };
    const BLACK: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

    fn intake(policy: SelectorPolicy) -> Intake {
        let renderer = Renderer::new(Layout::new(32, 32, 4).unwrap(), Palette::cheerlights(), 500);
        Intake::new(policy, renderer)
    }

    fn alert(id: i64, color: &str) -> std::string::String {
        format!(
            r#"{{"status":"firing","labels":{{"alertname":"cheerlights-updated","color":"{color}","entryId":"{id}"}}}}"#
        )
    }

    fn batch(alerts: &[std::string::String]) -> std::vec::Vec<u8> {
        format!(r#"{{"alerts":[{}]}}"#, alerts.join(",")).into_bytes()
    }

    fn history(intake: &Intake) -> std::vec::Vec<&str> {
        intake.state().history.snapshot().iter().map(|c| c.as_str()).collect()
    }

    #[test]
    fn test_start_blanks_and_sets_brightness() {
        let intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        fb.clear(RED).unwrap();

        intake.start(&mut fb, 102).unwrap();

        assert_eq!(fb.brightness(), 102);
        assert_eq!(fb.pixel(0, 0), Some(BLACK));
        assert_eq!(fb.flush_count(), 1);
    }

    #[test]
    fn test_first_color_end_to_end() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        let report = block_on(intake.handle_payload(&batch(&[alert(1, "blue")]), &mut fb, &mut delay)).unwrap();

        assert_eq!(history(&intake), ["blue"]);
        assert_eq!(intake.state().markers.latest_entry_id, EntryId(1));
        assert_eq!(report.redraws, 1);
        assert_eq!(report.swatches, 0);
        assert!(delay.pauses_ns.is_empty());
        // Current block only
        assert_eq!(fb.flush_count(), 1);
        assert_eq!(fb.pixel(15, 15), Some(BLUE));
        assert_eq!(fb.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn test_second_color_draws_first_swatch() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        block_on(intake.handle_payload(&batch(&[alert(1, "blue")]), &mut fb, &mut delay)).unwrap();
        let report = block_on(intake.handle_payload(&batch(&[alert(2, "red")]), &mut fb, &mut delay)).unwrap();

        assert_eq!(history(&intake), ["red", "blue"]);
        assert_eq!(report.swatches, 1);
        assert_eq!(fb.pixel(15, 15), Some(RED));
        assert_eq!(fb.pixel(0, 0), Some(BLUE));
        assert_eq!(delay.pauses_ns.len(), 1);
    }

    #[test]
    fn test_batch_applies_each_accepted_in_order() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        let payload = batch(&[alert(3, "pink"), alert(1, "blue"), alert(2, "red")]);
        let report = block_on(intake.handle_payload(&payload, &mut fb, &mut delay)).unwrap();

        assert_eq!(history(&intake), ["pink", "red", "blue"]);
        assert_eq!(report.redraws, 3);
        // 0 + 1 + 2 swatches across the three redraws
        assert_eq!(report.swatches, 3);
        assert_eq!(intake.state().markers.latest_entry_id, EntryId(3));
    }

    #[test]
    fn test_malformed_payload_leaves_state() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();
        block_on(intake.handle_payload(&batch(&[alert(1, "blue")]), &mut fb, &mut delay)).unwrap();
        let flushes = fb.flush_count();

        let result = block_on(intake.handle_payload(br#"{"alerts":"not a list"}"#, &mut fb, &mut delay));

        assert!(matches!(result, Err(IntakeError::Decode(_))));
        assert_eq!(history(&intake), ["blue"]);
        assert_eq!(intake.state().markers.latest_entry_id, EntryId(1));
        assert_eq!(fb.flush_count(), flushes);
    }

    #[test]
    fn test_rejected_batch_applies_nothing() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        // Second record lacks an entry id, so the valid first one is not applied either
        let payload = br#"{"alerts":[
            {"status":"firing","labels":{"alertname":"cheerlights-updated","color":"red","entryId":"5"}},
            {"status":"firing","labels":{"alertname":"cheerlights-updated","color":"blue"}}
        ]}"#;
        let result = block_on(intake.handle_payload(payload, &mut fb, &mut delay));

        assert!(matches!(result, Err(IntakeError::Select(_))));
        assert!(intake.state().history.is_empty());
        assert_eq!(intake.state().markers.latest_entry_id, EntryId::NONE);
        assert_eq!(fb.flush_count(), 0);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();
        let payload = batch(&[alert(1, "blue"), alert(2, "red")]);

        block_on(intake.handle_payload(&payload, &mut fb, &mut delay)).unwrap();
        let before = intake.state().clone();
        let flushes = fb.flush_count();

        let report = block_on(intake.handle_payload(&payload, &mut fb, &mut delay)).unwrap();

        assert!(report.selection.accepted.is_empty());
        assert_eq!(report.selection.skipped.len(), 2);
        assert_eq!(intake.state().history, before.history);
        assert_eq!(intake.state().markers, before.markers);
        assert_eq!(fb.flush_count(), flushes);
    }

    #[test]
    fn test_unknown_color_reported_and_kept() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        block_on(intake.handle_payload(&batch(&[alert(1, "chartreuse")]), &mut fb, &mut delay)).unwrap();
        let report = block_on(intake.handle_payload(&batch(&[alert(2, "red")]), &mut fb, &mut delay)).unwrap();

        // Stored verbatim, drawn with the fallback
        assert_eq!(history(&intake), ["red", "chartreuse"]);
        assert_eq!(report.unknown_colors.len(), 1);
        assert_eq!(report.unknown_colors[0].as_str(), "chartreuse");
        assert_eq!(fb.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn test_long_color_name_falls_back() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        let payload = batch(&[alert(1, "mediumspringgreenish-blue")]);
        let report = block_on(intake.handle_payload(&payload, &mut fb, &mut delay)).unwrap();

        assert_eq!(report.redraws, 1);
        assert_eq!(report.unknown_colors.len(), 1);
        assert_eq!(history(&intake), ["mediumspringgreenish-blu"]);
        assert_eq!(intake.state().markers.latest_entry_id, EntryId(1));
        assert_eq!(fb.pixel(15, 15), Some(BLACK));
    }

    #[test]
    fn test_long_alert_name_is_skipped() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        let other = r#"{"status":"firing","labels":{"alertname":"some-other-rather-long-alert-name-x","color":"red","entryId":"2"}}"#;
        let payload = batch(&[alert(1, "blue"), other.into()]);
        let report = block_on(intake.handle_payload(&payload, &mut fb, &mut delay)).unwrap();

        assert_eq!(history(&intake), ["blue"]);
        assert_eq!(intake.state().markers.latest_entry_id, EntryId(1));
        assert_eq!(report.selection.skipped.len(), 1);
        assert!(report.selection.skipped[0].reasons.wrong_alert_type);
        assert_eq!(fb.pixel(15, 15), Some(BLUE));
    }

    #[test]
    fn test_long_status_is_not_firing() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        let other = r#"{"status":"firing-and-then-some-more-text-here","labels":{"alertname":"cheerlights-updated","color":"red","entryId":"2"}}"#;
        let payload = batch(&[alert(1, "blue"), other.into()]);
        let report = block_on(intake.handle_payload(&payload, &mut fb, &mut delay)).unwrap();

        assert_eq!(history(&intake), ["blue"]);
        assert_eq!(report.selection.skipped.len(), 1);
        assert!(report.selection.skipped[0].reasons.not_firing);
    }

    #[test]
    fn test_negative_entry_id_is_stale() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        let payload = batch(&[alert(1, "blue"), alert(-1, "red")]);
        let report = block_on(intake.handle_payload(&payload, &mut fb, &mut delay)).unwrap();

        assert_eq!(history(&intake), ["blue"]);
        assert_eq!(intake.state().markers.latest_entry_id, EntryId(1));
        assert_eq!(report.selection.skipped.len(), 1);
        assert!(report.selection.skipped[0].reasons.stale);
    }

    #[test]
    fn test_history_capped() {
        let mut intake = intake(SelectorPolicy::EntryId);
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        for id in 1..=20 {
            let color = if id % 2 == 0 { "red" } else { "blue" };
            block_on(intake.handle_payload(&batch(&[alert(id, color)]), &mut fb, &mut delay)).unwrap();
        }

        assert_eq!(intake.state().history.len(), HISTORY_CAPACITY);
        assert_eq!(intake.state().history.current().map(|c| c.as_str()), Some("red"));
    }

    #[test]
    fn test_display_error_still_commits() {
        let mut intake = intake(SelectorPolicy::EntryId);
        // Too small for the 32x32 layout
        let mut fb: FrameBuffer<16, 16> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();

        let report = block_on(intake.handle_payload(&batch(&[alert(1, "blue")]), &mut fb, &mut delay)).unwrap();

        assert_eq!(report.display_error, Some(DisplayError::InvalidCoordinates));
        assert_eq!(report.redraws, 0);
        assert_eq!(history(&intake), ["blue"]);
        assert_eq!(intake.state().markers.latest_entry_id, EntryId(1));
    }

    #[test]
    fn test_timestamp_policy_end_to_end() {
        let mut intake = intake(SelectorPolicy::Timestamp(TimestampMode::Lenient));
        let mut fb: FrameBuffer<32, 32> = FrameBuffer::new();
        let mut delay = RecordingDelay::default();
        let payload = br#"{"alerts":[
            {"startsAt":10,"labels":{"color":"red"}},
            {"startsAt":20,"labels":{"color":"blue"}}
        ]}"#;

        block_on(intake.handle_payload(payload, &mut fb, &mut delay)).unwrap();
        block_on(intake.handle_payload(payload, &mut fb, &mut delay)).unwrap();

        // Lenient mode re-applies the same batch
        assert_eq!(history(&intake), ["blue", "blue"]);
        assert_eq!(intake.state().markers.latest_entry_id, EntryId::NONE);
    }
}
