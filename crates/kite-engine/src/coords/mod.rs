//! Coordinate and geometry types shared across the engine and scene graph.
//!
//! Canonical CPU space:
//! - Logical units (resolution independent)
//! - Origin top-left
//! - +X right, +Y down, positive rotation turns +X towards +Y
//!
//! `Scaler` maps logical space onto the physical backing buffer.

mod affine;
mod rect;
mod scaler;
mod vec2;
mod viewport;
mod watched;

pub use affine::Affine2;
pub use rect::Rect;
pub use scaler::Scaler;
pub use vec2::Vec2;
pub use viewport::Viewport;
pub use watched::Watched;
