//! Block placement for the history ring
//!
//! The matrix is divided into a square grid of `blocks_per_row` x
//! `blocks_per_row` blocks. History swatches walk the outer ring of that
//! grid clockwise from the top-left corner; the space inside the ring is
//! taken by one larger "current color" block.
//!
//! ```text
//!  0  1  2  3
//! 11 +-----+ 4
//! 10 |     | 5
//!  9  8  7  6
//! ```
//!
//! All placement is a pure function of the layout and the swatch index.

/// Blocks along each edge of the device grid
pub const BLOCKS_PER_ROW: u16 = 4;

/// Swatches on the outer ring of a `blocks_per_row` grid
pub const fn ring_len(blocks_per_row: u16) -> usize {
    4 * (blocks_per_row as usize - 1)
}

/// Errors describing an unusable display/grid combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// Width and height differ
    NotSquare,
    /// Fewer than 3 blocks per row leaves no room for the current block
    TooFewBlocks,
    /// Display too small for the requested grid
    TooSmall,
    /// The current block would reach into the ring
    Overlap,
}

/// A square block of pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Block {
    /// Left edge in pixels
    pub x: u16,
    /// Top edge in pixels
    pub y: u16,
    /// Edge length in pixels
    pub size: u16,
}

/// Derived block geometry for one display size
///
/// Every value is computed from width and block count; none of them are
/// independent settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    width: u16,
    blocks_per_row: u16,
    block_size: u16,
    current: Block,
    max_x: u16,
    max_y: u16,
}

impl Layout {
    /// Compute the layout for a `width` x `height` display
    pub const fn new(width: u16, height: u16, blocks_per_row: u16) -> Result<Self, LayoutError> {
        if width != height {
            return Err(LayoutError::NotSquare);
        }
        if blocks_per_row < 3 {
            return Err(LayoutError::TooFewBlocks);
        }

        let block_size = width / blocks_per_row;
        // Central block leaves a one pixel gutter to the ring on each side
        if block_size == 0 || width <= 2 * block_size + 2 {
            return Err(LayoutError::TooSmall);
        }

        let current_size = width - 2 * block_size - 2;
        let current_offset = block_size + 1;
        let max = block_size * (blocks_per_row - 1);
        // The ring's right column and bottom row start at `max`
        if current_offset + current_size > max {
            return Err(LayoutError::Overlap);
        }

        Ok(Self {
            width,
            blocks_per_row,
            block_size,
            current: Block {
                x: current_offset,
                y: current_offset,
                size: current_size,
            },
            max_x: max,
            max_y: max,
        })
    }

    /// Display width (and height) in pixels
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Blocks along one edge of the grid
    pub const fn blocks_per_row(&self) -> u16 {
        self.blocks_per_row
    }

    /// Edge length of a history swatch
    pub const fn block_size(&self) -> u16 {
        self.block_size
    }

    /// Number of swatches that fit on the outer ring
    pub const fn swatch_count(&self) -> usize {
        ring_len(self.blocks_per_row)
    }

    /// The central "current color" block
    pub const fn current_block(&self) -> Block {
        self.current
    }

    /// Placement of history swatch `index`
    ///
    /// Returns `None` past the end of the outer ring.
    pub fn swatch(&self, index: usize) -> Option<Block> {
        if index >= self.swatch_count() {
            return None;
        }
        self.spiral().nth(index)
    }

    /// Placements of every swatch on the outer ring, in drawing order
    pub fn swatches(&self) -> impl Iterator<Item = Block> {
        self.spiral().take(self.swatch_count())
    }

    /// Unbounded spiral walk starting at the top-left corner
    ///
    /// After the outer ring the walk continues inward lap by lap. Inner
    /// laps overlap the current block; only `swatches` is used for drawing.
    pub fn spiral(&self) -> SpiralPath {
        SpiralPath::new(self)
    }
}

/// Clockwise inward spiral over the block grid
///
/// Each step places a block at the current position, decides any turn
/// from that same position, and only then advances. The block after a
/// corner is therefore the first one in the new direction.
#[derive(Debug, Clone)]
pub struct SpiralPath {
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    step: i32,
    done: bool,
}

impl SpiralPath {
    fn new(layout: &Layout) -> Self {
        let step = layout.block_size as i32;
        Self {
            x: 0,
            y: 0,
            // Initially go across the top, left to right
            dx: step,
            dy: 0,
            min_x: 0,
            min_y: 0,
            max_x: layout.max_x as i32,
            max_y: layout.max_y as i32,
            step,
            done: false,
        }
    }

    fn in_lap(&self) -> bool {
        (self.min_x..=self.max_x).contains(&self.x) && (self.min_y..=self.max_y).contains(&self.y)
    }
}

impl Iterator for SpiralPath {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.done {
            return None;
        }

        let block = Block {
            x: self.x as u16,
            y: self.y as u16,
            size: self.step as u16,
        };

        // Right edge: go down
        if self.x == self.max_x {
            self.dx = 0;
            self.dy = self.step;
        }
        // Bottom edge: go right to left
        if self.y == self.max_y {
            self.dx = -self.step;
            self.dy = 0;
        }
        // Bottom-left corner: go up
        if self.x == self.min_x && self.y == self.max_y {
            self.dx = 0;
            self.dy = -self.step;
        }
        // Just below the lap's start: lap done, step inside
        if self.x == self.min_x && self.dy < 0 && self.y == self.min_y + self.step {
            self.dx = self.step;
            self.dy = 0;
            self.min_x += self.step;
            self.min_y += self.step;
            self.max_x -= self.step;
            self.max_y -= self.step;
        }

        self.x += self.dx;
        self.y += self.dy;
        self.done = !self.in_lap();

        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::vec::Vec;

    #[test]
    fn test_derived_constants_32() {
        let layout = Layout::new(32, 32, 4).unwrap();
        assert_eq!(layout.block_size(), 8);
        assert_eq!(layout.swatch_count(), 12);
        assert_eq!(
            layout.current_block(),
            Block {
                x: 9,
                y: 9,
                size: 14
            }
        );
    }

    #[test]
    fn test_derived_constants_16() {
        let layout = Layout::new(16, 16, 4).unwrap();
        assert_eq!(layout.block_size(), 4);
        assert_eq!(
            layout.current_block(),
            Block {
                x: 5,
                y: 5,
                size: 6
            }
        );
    }

    #[test]
    fn test_invalid_layouts() {
        assert_eq!(Layout::new(32, 16, 4), Err(LayoutError::NotSquare));
        assert_eq!(Layout::new(32, 32, 2), Err(LayoutError::TooFewBlocks));
        assert_eq!(Layout::new(3, 3, 4), Err(LayoutError::TooSmall));
        // 2 * 2 + 2 leaves nothing for the current block
        assert_eq!(Layout::new(6, 6, 3), Err(LayoutError::TooSmall));
    }

    #[test]
    fn test_overlapping_layouts_rejected() {
        // 2 px blocks leave a 10 px current block reaching into the ring
        assert_eq!(Layout::new(16, 16, 6), Err(LayoutError::Overlap));
        assert_eq!(Layout::new(16, 16, 7), Err(LayoutError::Overlap));
        // 4 px blocks, but two spare pixels widen the current block
        assert_eq!(Layout::new(18, 18, 4), Err(LayoutError::Overlap));
        assert!(Layout::new(17, 17, 4).is_ok());
    }

    #[test]
    fn test_device_grid_ring_len() {
        let layout = Layout::new(16, 16, BLOCKS_PER_ROW).unwrap();
        assert_eq!(layout.swatch_count(), ring_len(BLOCKS_PER_ROW));
        assert_eq!(layout.swatch_count(), 12);
    }

    #[test]
    fn test_ring_order_on_4x4() {
        let layout = Layout::new(32, 32, 4).unwrap();
        let cells: Vec<(u16, u16)> = layout
            .swatches()
            .map(|b| (b.x / 8, b.y / 8))
            .collect();

        assert_eq!(
            cells,
            [
                (0, 0),
                (1, 0),
                (2, 0),
                (3, 0),
                (3, 1),
                (3, 2),
                (3, 3),
                (2, 3),
                (1, 3),
                (0, 3),
                (0, 2),
                (0, 1),
            ]
        );
    }

    #[test]
    fn test_swatch_matches_iteration() {
        let layout = Layout::new(16, 16, 4).unwrap();
        for (i, block) in layout.swatches().enumerate() {
            assert_eq!(layout.swatch(i), Some(block));
            assert_eq!(block.size, 4);
        }
        assert_eq!(layout.swatch(12), None);
    }

    #[test]
    fn test_ring_avoids_current_block() {
        let layout = Layout::new(32, 32, 4).unwrap();
        let current = layout.current_block();
        for b in layout.swatches() {
            assert!(!overlaps(b, current), "swatch {:?} overlaps current", b);
        }
    }

    #[test]
    fn test_spiral_continues_inward() {
        let layout = Layout::new(32, 32, 4).unwrap();
        let inner: Vec<(u16, u16)> = layout
            .spiral()
            .skip(12)
            .map(|b| (b.x / 8, b.y / 8))
            .collect();

        assert_eq!(inner, [(1, 1), (2, 1), (2, 2), (1, 2)]);
    }

    #[test]
    fn test_spiral_odd_grid_ends_in_center() {
        let layout = Layout::new(25, 25, 5).unwrap();
        let cells: Vec<(u16, u16)> = layout.spiral().map(|b| (b.x / 5, b.y / 5)).collect();

        assert_eq!(cells.len(), 25);
        assert_eq!(cells[24], (2, 2));
        let unique: HashSet<_> = cells.iter().collect();
        assert_eq!(unique.len(), 25);
    }

    fn overlaps(a: Block, b: Block) -> bool {
        let overlaps_x = a.x < b.x + b.size && b.x < a.x + a.size;
        let overlaps_y = a.y < b.y + b.size && b.y < a.y + a.size;
        overlaps_x && overlaps_y
    }

    proptest! {
        #[test]
        fn accepted_layouts_never_overlap(width in 1u16..80, blocks in 3u16..17) {
            let Ok(layout) = Layout::new(width, width, blocks) else {
                return Ok(());
            };

            let current = layout.current_block();
            prop_assert!(current.x + current.size <= width);
            for swatch in layout.swatches() {
                prop_assert!(!overlaps(swatch, current), "{:?} overlaps {:?}", swatch, current);
                prop_assert!(swatch.x + swatch.size <= width && swatch.y + swatch.size <= width);
            }
        }

        #[test]
        fn ring_is_border_bijection(blocks in 3u16..9, block_size in 1u16..9, slack in 0u16..3) {
            let width = blocks * block_size + slack.min(block_size - 1);
            let Ok(layout) = Layout::new(width, width, blocks) else {
                return Ok(());
            };
            let cells: Vec<(u16, u16)> = layout
                .swatches()
                .map(|b| (b.x / block_size, b.y / block_size))
                .collect();

            // Exactly the border cells, each once
            prop_assert_eq!(cells.len(), layout.swatch_count());
            let unique: HashSet<_> = cells.iter().copied().collect();
            prop_assert_eq!(unique.len(), cells.len());
            let last = blocks - 1;
            for &(cx, cy) in &cells {
                prop_assert!(cx == 0 || cy == 0 || cx == last || cy == last);
                prop_assert!(cx <= last && cy <= last);
            }

            // Contiguous: one block per step along one axis
            for pair in cells.windows(2) {
                let (ax, ay) = pair[0];
                let (bx, by) = pair[1];
                let dist = (ax as i32 - bx as i32).abs() + (ay as i32 - by as i32).abs();
                prop_assert_eq!(dist, 1);
            }
        }
    }
}
