//! Named color palette
//!
//! Maps CheerLights color names onto pixel values. Lookups never fail:
//! an unknown name resolves to the fallback pixel, tagged so the caller
//! can tell a real match from a substitution and log the miss.

use smart_leds::RGB8;

/// Name of the guaranteed fallback entry
pub const FALLBACK_COLOR: &str = "black";

const fn rgb(r: u8, g: u8, b: u8) -> RGB8 {
    RGB8 { r, g, b }
}

/// The CheerLights color set
const CHEERLIGHTS: &[(&str, RGB8)] = &[
    ("black", rgb(0, 0, 0)),
    ("red", rgb(255, 0, 0)),
    ("green", rgb(0, 128, 0)),
    ("blue", rgb(0, 0, 255)),
    ("cyan", rgb(0, 255, 255)),
    ("white", rgb(255, 255, 255)),
    ("oldlace", rgb(253, 245, 230)),
    ("purple", rgb(128, 0, 128)),
    ("magenta", rgb(255, 0, 255)),
    ("yellow", rgb(255, 255, 0)),
    ("orange", rgb(255, 165, 0)),
    ("pink", rgb(255, 192, 203)),
];

/// Result of a palette lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Name found in the palette
    Found(RGB8),
    /// Name unknown, fallback pixel substituted
    Fallback(RGB8),
}

impl Lookup {
    /// Pixel value to render, whether found or substituted
    pub fn pixel(self) -> RGB8 {
        match self {
            Lookup::Found(pixel) | Lookup::Fallback(pixel) => pixel,
        }
    }

    /// Check if the fallback was substituted
    pub fn is_fallback(self) -> bool {
        matches!(self, Lookup::Fallback(_))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Lookup {
    fn format(&self, f: defmt::Formatter) {
        let (tag, p) = match self {
            Lookup::Found(p) => ("Found", p),
            Lookup::Fallback(p) => ("Fallback", p),
        };
        defmt::write!(f, "{}({}, {}, {})", tag, p.r, p.g, p.b);
    }
}

/// Immutable color name to pixel mapping
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    entries: &'static [(&'static str, RGB8)],
    fallback: RGB8,
}

impl Palette {
    /// The standard CheerLights palette with "black" as fallback
    pub const fn cheerlights() -> Self {
        Self {
            entries: CHEERLIGHTS,
            fallback: rgb(0, 0, 0),
        }
    }

    /// Build a palette from a static table
    ///
    /// The fallback pixel is the table's `FALLBACK_COLOR` entry, or black
    /// if the table has none.
    pub fn from_table(entries: &'static [(&'static str, RGB8)]) -> Self {
        let fallback = entries
            .iter()
            .find(|(name, _)| *name == FALLBACK_COLOR)
            .map(|&(_, pixel)| pixel)
            .unwrap_or(rgb(0, 0, 0));
        Self { entries, fallback }
    }

    /// Look up a color name (exact, case-sensitive match)
    pub fn lookup(&self, name: &str) -> Lookup {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|&(_, pixel)| Lookup::Found(pixel))
            .unwrap_or(Lookup::Fallback(self.fallback))
    }

    /// The pixel used for unknown names and for clearing the display
    pub fn fallback(&self) -> RGB8 {
        self.fallback
    }

    /// Number of named colors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the palette has no named colors
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the known color names
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|&(name, _)| name)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::cheerlights()
    }
}
