//! In-memory RGB frame buffer
//!
//! Stores one `RGB8` per matrix pixel in row-major order. Implements
//! `MatrixBackend` so it can stand in for hardware in host tests, and is
//! the buffer hardware drivers draw into before pushing pixels out.

use smart_leds::RGB8;

use crate::backend::{DisplayError, MatrixBackend};

/// RGB canvas of `W` x `H` pixels
#[derive(Clone)]
pub struct FrameBuffer<const W: usize, const H: usize> {
    /// Pixel rows, top row first
    pixels: [[RGB8; W]; H],
    /// Brightness level applied by `scaled`
    brightness: u8,
    /// Number of completed flushes
    flushes: u32,
}

impl<const W: usize, const H: usize> Default for FrameBuffer<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> FrameBuffer<W, H> {
    /// Create a new all-black frame buffer at full brightness
    pub const fn new() -> Self {
        Self {
            pixels: [[RGB8 { r: 0, g: 0, b: 0 }; W]; H],
            brightness: 255,
            flushes: 0,
        }
    }

    /// Get the color of a single pixel
    pub fn pixel(&self, x: usize, y: usize) -> Option<RGB8> {
        self.pixels.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Current brightness level
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Number of flushes since creation
    pub fn flush_count(&self) -> u32 {
        self.flushes
    }

    /// Iterate pixel rows, top row first
    pub fn rows(&self) -> impl Iterator<Item = &[RGB8; W]> {
        self.pixels.iter()
    }

    /// Pixel value with brightness applied
    pub fn scaled(&self, x: usize, y: usize) -> Option<RGB8> {
        self.pixel(x, y).map(|c| scale(c, self.brightness))
    }
}

/// Scale a color by a 0-255 brightness level
pub fn scale(color: RGB8, level: u8) -> RGB8 {
    let channel = |v: u8| ((v as u16 * (level as u16 + 1)) >> 8) as u8;
    RGB8 {
        r: channel(color.r),
        g: channel(color.g),
        b: channel(color.b),
    }
}

impl<const W: usize, const H: usize> MatrixBackend for FrameBuffer<W, H> {
    fn clear(&mut self, color: RGB8) -> Result<(), DisplayError> {
        for row in &mut self.pixels {
            row.fill(color);
        }
        Ok(())
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: RGB8,
    ) -> Result<(), DisplayError> {
        let (x, y) = (x as usize, y as usize);
        let x_end = x + width as usize;
        let y_end = y + height as usize;

        if x_end > W || y_end > H {
            return Err(DisplayError::InvalidCoordinates);
        }

        for row in &mut self.pixels[y..y_end] {
            row[x..x_end].fill(color);
        }
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        self.brightness = level;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.flushes = self.flushes.wrapping_add(1);
        Ok(())
    }

    fn dimensions(&self) -> (u16, u16) {
        (W as u16, H as u16)
    }
}
