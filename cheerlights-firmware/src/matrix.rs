//! WS2812 matrix backend
//!
//! Draws into an in-memory frame and pushes the whole panel to the LED
//! strip on every flush. The strip is wired serpentine, so each flush maps
//! (x, y) to strip order and applies brightness on the way out.

use cheerlights_display::{DisplayError, FrameBuffer, LedLayout, MatrixBackend, RGB8};
use embassy_futures::block_on;
use embassy_rp::peripherals::PIO1;
use embassy_rp::pio_programs::ws2812::{Grb, PioWs2812};

/// Panel edge length in pixels
pub const MATRIX_SIZE: u16 = 16;

const WIDTH: usize = MATRIX_SIZE as usize;
const HEIGHT: usize = MATRIX_SIZE as usize;

/// LEDs on the strip
pub const LED_COUNT: usize = WIDTH * HEIGHT;

/// WS2812 driver on PIO1 state machine 0
pub type Strip = PioWs2812<'static, PIO1, 0, LED_COUNT, Grb>;

/// 16x16 WS2812 panel
pub struct Ws2812Matrix {
    strip: Strip,
    frame: FrameBuffer<WIDTH, HEIGHT>,
    wiring: LedLayout,
    out: [RGB8; LED_COUNT],
}

impl Ws2812Matrix {
    pub fn new(strip: Strip) -> Self {
        Self {
            strip,
            frame: FrameBuffer::new(),
            wiring: LedLayout::serpentine(WIDTH, HEIGHT),
            out: [RGB8::default(); LED_COUNT],
        }
    }
}

impl MatrixBackend for Ws2812Matrix {
    fn clear(&mut self, color: RGB8) -> Result<(), DisplayError> {
        self.frame.clear(color)
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: RGB8,
    ) -> Result<(), DisplayError> {
        self.frame.fill_rect(x, y, width, height, color)
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        self.frame.set_brightness(level)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let index = self
                    .wiring
                    .index(x, y)
                    .ok_or(DisplayError::InvalidCoordinates)?;
                self.out[index] = self.frame.scaled(x, y).unwrap_or_default();
            }
        }
        self.frame.flush()?;

        // A full panel is ~8 ms of DMA. Waiting here keeps flush visible
        // on return, also from the polling loop which never yields.
        block_on(self.strip.write(&self.out));
        Ok(())
    }

    fn dimensions(&self) -> (u16, u16) {
        self.frame.dimensions()
    }
}
