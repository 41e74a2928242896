//! Colour model shared by the canvas and the quad renderer.
//!
//! Colours are linear premultiplied RGBA; geometry types live in `coords`.

pub mod color;

pub use color::Color;
