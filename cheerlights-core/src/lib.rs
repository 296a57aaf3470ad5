//! Board-agnostic core logic for the CheerLights matrix firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or network implementations:
//!
//! - Color palette with explicit fallback on unknown names
//! - Spiral geometry for the history ring and the central block
//! - Bounded color history
//! - Alert selection policies (entry id, timestamp)
//! - Renderer over the `MatrixBackend` trait
//! - Message intake: decode, select, record, render
//! - Device configuration types and parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod geometry;
pub mod history;
pub mod intake;
pub mod palette;
pub mod render;
pub mod selector;
pub mod state;

pub use geometry::{Block, Layout, LayoutError, SpiralPath, BLOCKS_PER_ROW};
pub use history::{ColorHistory, HISTORY_CAPACITY};
pub use intake::{Intake, IntakeError, IntakeReport};
pub use palette::{Lookup, Palette, FALLBACK_COLOR};
pub use render::{BlockingPacer, RenderReport, Renderer};
pub use selector::{AlertSelector, SelectError, Selection, SelectorPolicy, TimestampMode};
pub use state::{DisplayState, Markers};
