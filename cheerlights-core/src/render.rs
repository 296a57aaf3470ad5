//! Color rendering
//!
//! Draws the current color into the central block and the history ring
//! around it. Each logical drawing step is flushed so it becomes visible
//! on its own; history swatches appear one at a time with a fixed pause
//! between them.

use cheerlights_display::{DisplayError, MatrixBackend};
use cheerlights_protocol::ColorName;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::geometry::{Block, Layout};
use crate::history::HISTORY_CAPACITY;
use crate::palette::{Lookup, Palette};

/// Default pause between history swatches
pub const DEFAULT_PACE_MS: u32 = 500;

/// Summary of a history render pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderReport {
    /// Swatches drawn
    pub swatches: usize,
    /// Distinct color names that were not in the palette
    pub unknown: Vec<ColorName, HISTORY_CAPACITY>,
}

impl RenderReport {
    /// Remember an unknown color name (once)
    pub fn note_unknown(&mut self, color: &ColorName) {
        if !self.unknown.contains(color) {
            // A pass draws at most HISTORY_CAPACITY names
            let _ = self.unknown.push(color.clone());
        }
    }
}

/// Turns a blocking delay into a pacer for the renderer
///
/// Used by the polling loop, where the pause between swatches is a plain
/// busy wait rather than a point where other tasks may run.
pub struct BlockingPacer<D>(pub D);

impl<D: embedded_hal::delay::DelayNs> DelayNs for BlockingPacer<D> {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.delay_ns(ns);
    }
}

/// Draws colors onto a matrix backend
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    layout: Layout,
    palette: Palette,
    pace_ms: u32,
}

impl Renderer {
    /// Create a renderer
    ///
    /// - `pace_ms`: pause after each history swatch
    pub const fn new(layout: Layout, palette: Palette, pace_ms: u32) -> Self {
        Self {
            layout,
            palette,
            pace_ms,
        }
    }

    /// Block geometry in use
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Palette in use
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Pause after each history swatch
    pub fn pace_ms(&self) -> u32 {
        self.pace_ms
    }

    /// Fill the whole display with the fallback color
    pub fn clear<B: MatrixBackend>(&self, backend: &mut B) -> Result<(), DisplayError> {
        backend.clear(self.palette.fallback())?;
        backend.flush()
    }

    /// Draw the current color into the central block
    pub fn render_current<B: MatrixBackend>(
        &self,
        backend: &mut B,
        color: &str,
    ) -> Result<Lookup, DisplayError> {
        let lookup = self.palette.lookup(color);
        fill(backend, self.layout.current_block(), lookup)?;
        Ok(lookup)
    }

    /// Draw history swatches around the ring, oldest last
    ///
    /// Colors beyond the ring's capacity are not drawn. Unknown names are
    /// drawn with the fallback pixel and listed in the report.
    pub async fn render_history<B: MatrixBackend, D: DelayNs>(
        &self,
        backend: &mut B,
        delay: &mut D,
        colors: &[ColorName],
    ) -> Result<RenderReport, DisplayError> {
        let mut report = RenderReport::default();

        for (block, color) in self.layout.swatches().zip(colors) {
            let lookup = self.palette.lookup(color);
            if lookup.is_fallback() {
                report.note_unknown(color);
            }

            fill(backend, block, lookup)?;
            report.swatches += 1;

            delay.delay_ms(self.pace_ms).await;
        }

        Ok(report)
    }
}

/// Fill one block and make it visible
fn fill<B: MatrixBackend>(backend: &mut B, block: Block, lookup: Lookup) -> Result<(), DisplayError> {
    backend.fill_rect(block.x, block.y, block.size, block.size, lookup.pixel())?;
    backend.flush()
}
