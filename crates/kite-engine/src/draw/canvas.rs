use std::sync::Arc;

use crate::assets::Image;
use crate::coords::{Affine2, Rect, Vec2};
use crate::paint::Color;

use super::{DrawList, Quad, FULL_UV};

#[derive(Debug, Copy, Clone, PartialEq)]
struct CanvasState {
    transform: Affine2,
    alpha: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            alpha: 1.0,
        }
    }
}

/// Immediate-mode 2D drawing surface.
///
/// Primitives are expressed in the caller's local space and mapped through the
/// current transform into physical pixels when recorded. `save`/`restore` push and
/// pop the transform and global alpha together.
#[derive(Debug, Default)]
pub struct Canvas {
    list: DrawList,
    state: CanvasState,
    stack: Vec<CanvasState>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards the previous frame's recording and resets state to identity.
    pub fn begin_frame(&mut self) {
        self.list.reset();
        self.state = CanvasState::default();
        self.stack.clear();
    }

    /// Recorded draw stream.
    #[inline]
    pub fn list(&self) -> &DrawList {
        &self.list
    }

    /// Number of unmatched `save` calls.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    // ── state ─────────────────────────────────────────────────────────────

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    /// Restores the most recently saved state. Unbalanced calls are ignored.
    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::debug!("canvas: restore without matching save"),
        }
    }

    #[inline]
    pub fn transform(&self) -> Affine2 {
        self.state.transform
    }

    /// Replaces the current transform.
    #[inline]
    pub fn set_transform(&mut self, m: Affine2) {
        self.state.transform = m;
    }

    /// Post-multiplies `m` into the current transform (applies in local space).
    #[inline]
    pub fn apply(&mut self, m: &Affine2) {
        self.state.transform.append(m);
    }

    #[inline]
    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.transform.translate(x, y);
    }

    #[inline]
    pub fn rotate(&mut self, angle: f32) {
        self.state.transform.rotate(angle);
    }

    #[inline]
    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform.scale(sx, sy);
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.state.alpha
    }

    /// Global opacity multiplied into every primitive, clamped to `[0, 1]`.
    #[inline]
    pub fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    // ── primitives ────────────────────────────────────────────────────────

    /// Clears the whole surface. Ignores the current transform.
    pub fn clear(&mut self, color: Color) {
        self.list.set_clear(color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = rect.normalized();
        if rect.is_empty() {
            return;
        }
        self.push_quad(rect.corners(), FULL_UV, color, None);
    }

    /// Outlines `rect` with a stroke of `width` centered on its edges.
    pub fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color) {
        let [tl, tr, br, bl] = rect.normalized().corners();
        self.line(tl, tr, width, color);
        self.line(tr, br, width, color);
        self.line(br, bl, width, color);
        self.line(bl, tl, width, color);
    }

    /// Straight segment of thickness `width` from `a` to `b`.
    pub fn line(&mut self, a: Vec2, b: Vec2, width: f32, color: Color) {
        let dir = (b - a).normalize();
        if dir.is_zero() || width <= 0.0 {
            return;
        }
        let n = Vec2::new(-dir.y, dir.x) * (width * 0.5);
        self.push_quad([a - n, b - n, b + n, a + n], FULL_UV, color, None);
    }

    /// Draws `image` at its natural size with its top-left corner at `origin`.
    pub fn draw_image(&mut self, image: &Arc<Image>, origin: Vec2) {
        let rect = Rect::from_origin_size(origin, image.size());
        self.draw_image_rect(image, rect);
    }

    /// Draws `image` stretched over `dst`.
    pub fn draw_image_rect(&mut self, image: &Arc<Image>, dst: Rect) {
        if dst.is_empty() {
            return;
        }
        self.push_quad(dst.corners(), FULL_UV, Color::WHITE, Some(image.clone()));
    }

    /// Draws the texel region `src` of `image` over `dst` (sprite sheets).
    pub fn draw_image_region(&mut self, image: &Arc<Image>, src: Rect, dst: Rect) {
        if dst.is_empty() || src.is_empty() {
            return;
        }
        let size = image.size();
        let uv = |p: Vec2| Vec2::new(p.x / size.x, p.y / size.y);
        let uvs = src.corners().map(uv);
        self.push_quad(dst.corners(), uvs, Color::WHITE, Some(image.clone()));
    }

    fn push_quad(
        &mut self,
        local: [Vec2; 4],
        uvs: [Vec2; 4],
        color: Color,
        image: Option<Arc<Image>>,
    ) {
        let m = self.state.transform;
        if !m.is_finite() {
            log::debug!("canvas: skipping primitive with non-finite transform");
            return;
        }
        let alpha = self.state.alpha;
        if alpha <= 0.0 {
            return;
        }

        self.list.push(Quad {
            corners: local.map(|p| m.transform_point(p)),
            uvs,
            color: color.scaled(alpha),
            image,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn red() -> Color {
        Color::from_straight(1.0, 0.0, 0.0, 1.0)
    }

    // ── transform stack ───────────────────────────────────────────────────

    #[test]
    fn save_restore_round_trips_state() {
        let mut c = Canvas::new();
        c.translate(10.0, 0.0);
        c.set_alpha(0.5);
        c.save();
        c.rotate(1.0);
        c.set_alpha(0.25);
        c.restore();

        assert!(c.transform().approx_eq(&Affine2::from_translation(Vec2::new(10.0, 0.0)), EPS));
        assert_eq!(c.alpha(), 0.5);
        assert_eq!(c.depth(), 0);
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut c = Canvas::new();
        c.translate(3.0, 4.0);
        c.restore();
        assert_eq!(c.transform().translation(), Vec2::new(3.0, 4.0));
    }

    // ── primitives ────────────────────────────────────────────────────────

    #[test]
    fn fill_rect_is_transformed_to_physical() {
        let mut c = Canvas::new();
        c.translate(100.0, 50.0);
        c.scale(2.0, 2.0);
        c.fill_rect(Rect::new(0.0, 0.0, 10.0, 5.0), red());

        let q = &c.list().quads()[0];
        assert!(q.corners[0].approx_eq(Vec2::new(100.0, 50.0), EPS));
        assert!(q.corners[2].approx_eq(Vec2::new(120.0, 60.0), EPS));
        assert!(q.image.is_none());
    }

    #[test]
    fn empty_rect_records_nothing() {
        let mut c = Canvas::new();
        c.fill_rect(Rect::new(0.0, 0.0, 0.0, 5.0), red());
        assert!(c.list().is_empty());
    }

    #[test]
    fn alpha_premultiplies_color() {
        let mut c = Canvas::new();
        c.set_alpha(0.5);
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), red());
        let q = &c.list().quads()[0];
        assert_eq!(q.color.a, 0.5);
        assert_eq!(q.color.r, 0.5);
    }

    #[test]
    fn image_drawn_at_natural_size() {
        let img = Arc::new(Image::solid(8, 4, [255; 4]).unwrap());
        let mut c = Canvas::new();
        c.draw_image(&img, Vec2::new(-4.0, -2.0));

        let q = &c.list().quads()[0];
        assert!(q.corners[0].approx_eq(Vec2::new(-4.0, -2.0), EPS));
        assert!(q.corners[2].approx_eq(Vec2::new(4.0, 2.0), EPS));
        assert_eq!(q.image.as_ref().map(|i| i.id()), Some(img.id()));
    }

    #[test]
    fn image_region_maps_texels_to_uv() {
        let img = Arc::new(Image::solid(16, 16, [255; 4]).unwrap());
        let mut c = Canvas::new();
        c.draw_image_region(&img, Rect::new(8.0, 0.0, 8.0, 8.0), Rect::new(0.0, 0.0, 8.0, 8.0));
        let q = &c.list().quads()[0];
        assert_eq!(q.uvs[0], Vec2::new(0.5, 0.0));
        assert_eq!(q.uvs[2], Vec2::new(1.0, 0.5));
    }

    #[test]
    fn zero_length_line_is_skipped() {
        let mut c = Canvas::new();
        c.line(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), 2.0, red());
        assert!(c.list().is_empty());

        c.line(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0, red());
        let q = &c.list().quads()[0];
        assert!(q.corners[0].approx_eq(Vec2::new(0.0, -1.0), EPS));
        assert!(q.corners[2].approx_eq(Vec2::new(10.0, 1.0), EPS));
    }

    #[test]
    fn clear_discards_earlier_quads() {
        let mut c = Canvas::new();
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), red());
        c.clear(Color::BLACK);
        assert!(c.list().is_empty());
        assert_eq!(c.list().clear_color(), Some(Color::BLACK));
    }

    #[test]
    fn non_finite_transform_is_dropped() {
        let mut c = Canvas::new();
        c.set_transform(Affine2::new(f32::NAN, 0.0, 0.0, 1.0, 0.0, 0.0));
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), red());
        assert!(c.list().is_empty());
    }
}
