//! Bounded color history
//!
//! Most recent color first. Index 0 is the current color, the rest are
//! drawn as swatches around the ring.

use cheerlights_protocol::ColorName;
use heapless::Vec;

use crate::geometry::{ring_len, BLOCKS_PER_ROW};

/// One current color plus one per ring swatch on the device grid
pub const HISTORY_CAPACITY: usize = 1 + ring_len(BLOCKS_PER_ROW);

/// Most-recent-first sequence of color names, capped at `HISTORY_CAPACITY`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorHistory {
    entries: Vec<ColorName, HISTORY_CAPACITY>,
}

impl ColorHistory {
    /// Create an empty history
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a color at the front, dropping the oldest when full
    pub fn push_front(&mut self, color: ColorName) {
        if self.entries.is_full() {
            self.entries.pop();
        }
        // Room was made above
        let _ = self.entries.insert(0, color);
    }

    /// All entries, most recent first
    pub fn snapshot(&self) -> &[ColorName] {
        &self.entries
    }

    /// The most recent color
    pub fn current(&self) -> Option<&ColorName> {
        self.entries.first()
    }

    /// Every entry except the current one
    pub fn previous(&self) -> &[ColorName] {
        self.entries.get(1..).unwrap_or(&[])
    }

    /// Number of stored colors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no color has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ColorHistory {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "History[");
        for (i, color) in self.entries.iter().enumerate() {
            if i > 0 {
                defmt::write!(f, ", ");
            }
            defmt::write!(f, "{}", color.as_str());
        }
        defmt::write!(f, "]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::format;

    fn color(name: &str) -> ColorName {
        let mut s = ColorName::new();
        s.push_str(name).unwrap();
        s
    }

    #[test]
    fn test_capacity_matches_ring() {
        assert_eq!(HISTORY_CAPACITY, 13);
    }

    #[test]
    fn test_empty() {
        let history = ColorHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.current(), None);
        assert!(history.previous().is_empty());
        assert!(history.snapshot().is_empty());
    }

    #[test]
    fn test_most_recent_first() {
        let mut history = ColorHistory::new();
        history.push_front(color("red"));
        history.push_front(color("blue"));
        history.push_front(color("green"));

        let names: std::vec::Vec<&str> = history.snapshot().iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["green", "blue", "red"]);
        assert_eq!(history.current().map(|c| c.as_str()), Some("green"));
        assert_eq!(history.previous().len(), 2);
    }

    #[test]
    fn test_truncates_oldest() {
        let mut history = ColorHistory::new();
        for i in 0..20 {
            history.push_front(color(&format!("c{}", i)));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.current().map(|c| c.as_str()), Some("c19"));
        assert_eq!(
            history.snapshot().last().map(|c| c.as_str()),
            Some("c7")
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut history = ColorHistory::new();
        history.push_front(color("red"));
        history.push_front(color("red"));
        assert_eq!(history.len(), 2);
    }

    proptest! {
        #[test]
        fn length_is_bounded_and_order_kept(count in 0usize..40) {
            let mut history = ColorHistory::new();
            for i in 0..count {
                history.push_front(color(&format!("c{}", i)));
            }

            prop_assert_eq!(history.len(), count.min(HISTORY_CAPACITY));
            for (pos, entry) in history.snapshot().iter().enumerate() {
                let expected = format!("c{}", count - 1 - pos);
                prop_assert_eq!(entry.as_str(), expected.as_str());
            }
        }
    }
}
