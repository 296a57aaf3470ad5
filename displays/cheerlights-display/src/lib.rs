//! LED matrix display abstraction for the CheerLights matrix
//!
//! This crate provides:
//! - `MatrixBackend` trait for filling pixel blocks and pushing them to hardware
//! - `FrameBuffer`, an in-memory RGB canvas that implements `MatrixBackend`
//! - `LedLayout` for mapping matrix coordinates onto an LED strip index
//!
//! # Architecture
//!
//! The core renderer only ever speaks `MatrixBackend`. Hardware drivers
//! (e.g. a WS2812 panel driven by PIO) keep a `FrameBuffer`, delegate the
//! drawing calls to it, and push the pixels out on `flush`. Host tests use
//! the `FrameBuffer` directly.
//!
//! Coordinates are in pixels with (0, 0) at the top-left corner.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod backend;
pub mod framebuffer;
pub mod layout;

// Re-export key types
pub use backend::{brightness_level, DisplayError, MatrixBackend};
pub use framebuffer::{scale, FrameBuffer};
pub use layout::{LedLayout, Wiring};
pub use smart_leds::RGB8;
