use std::sync::Arc;

use crate::assets::Image;
use crate::coords::Vec2;
use crate::paint::Color;

/// Texture coordinates of a full image, matching [`Quad::corners`] order.
pub const FULL_UV: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// A transformed quad in physical pixels.
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left in the
/// quad's local space; after transformation they may describe any parallelogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    pub corners: [Vec2; 4],
    pub uvs: [Vec2; 4],
    /// Premultiplied colour; multiplies the image when one is present.
    pub color: Color,
    pub image: Option<Arc<Image>>,
}

/// Recorded draw stream for one frame, in paint order.
#[derive(Debug, Default)]
pub struct DrawList {
    clear: Option<Color>,
    quads: Vec<Quad>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops recorded quads. Keeps allocated capacity for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.clear = None;
        self.quads.clear();
    }

    /// Requests the surface be cleared to `color` before any quad is drawn.
    ///
    /// Clearing mid-frame also discards quads recorded so far.
    #[inline]
    pub fn set_clear(&mut self, color: Color) {
        self.clear = Some(color);
        self.quads.clear();
    }

    #[inline]
    pub fn clear_color(&self) -> Option<Color> {
        self.clear
    }

    #[inline]
    pub fn push(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    #[inline]
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}
