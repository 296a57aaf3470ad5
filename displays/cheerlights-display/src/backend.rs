//! Display backend trait
//!
//! Defines the interface between the renderer and the matrix hardware.

use smart_leds::RGB8;

/// Display backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with the LED driver
    Communication,
    /// Rectangle does not fit inside the matrix
    InvalidCoordinates,
    /// Display not initialized
    NotInitialized,
}

/// Matrix backend trait
///
/// Drawing calls only touch the backend's pixel buffer. Nothing becomes
/// visible until `flush` is called, and callers flush after every logical
/// drawing operation they want the viewer to see.
pub trait MatrixBackend {
    /// Fill the whole matrix with one color
    fn clear(&mut self, color: RGB8) -> Result<(), DisplayError>;

    /// Fill a rectangle with one color
    ///
    /// - `x`, `y`: Top-left corner in pixels
    /// - `width`, `height`: Size in pixels
    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: RGB8,
    ) -> Result<(), DisplayError>;

    /// Set global brightness (0 = off, 255 = full)
    ///
    /// Applied to pixel values when they are pushed to the hardware.
    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError>;

    /// Push buffered pixels to the display
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Get the display dimensions in pixels (width, height)
    fn dimensions(&self) -> (u16, u16);
}

/// Convert a brightness percentage (0-100) into a backend level (0-255)
pub const fn brightness_level(percent: u8) -> u8 {
    let percent = if percent > 100 { 100 } else { percent };
    ((percent as u16 * 255 + 50) / 100) as u8
}
