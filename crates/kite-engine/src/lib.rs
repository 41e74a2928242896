//! Kite engine crate.
//!
//! Platform, GPU and asset plumbing for 2D games: the window/runtime loop,
//! input, timing, the coordinate and transform types, an immediate-mode canvas
//! and the quad renderer that draws it. The scene graph lives in `kite-scene`.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod draw;
pub mod render;
pub mod paint;
pub mod assets;
