//! LED strip layout
//!
//! Addressable LED panels are a single strip folded into a grid. The
//! layout maps a matrix coordinate to the position of that pixel along the
//! strip, so a frame buffer can be serialized in wire order.

/// How the strip is folded into rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wiring {
    /// Every row runs left to right
    RowMajor,
    /// Even rows run left to right, odd rows right to left
    Serpentine,
}

/// Coordinate to strip index mapping for a `width` x `height` panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedLayout {
    width: usize,
    height: usize,
    wiring: Wiring,
}

impl LedLayout {
    /// Create a layout with rows running in the same direction
    pub const fn row_major(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            wiring: Wiring::RowMajor,
        }
    }

    /// Create a layout with alternating row direction
    pub const fn serpentine(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            wiring: Wiring::Serpentine,
        }
    }

    /// Total number of LEDs
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if the layout has no LEDs
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strip index of the pixel at (x, y), or `None` outside the panel
    pub const fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let column = match self.wiring {
            Wiring::RowMajor => x,
            Wiring::Serpentine => {
                if y % 2 == 0 {
                    x
                } else {
                    self.width - 1 - x
                }
            }
        };

        Some(y * self.width + column)
    }
}
