use super::{Affine2, Rect, Vec2, Viewport};

/// Maps a physical drawing surface onto a fixed logical resolution.
///
/// The logical `base` size is scaled uniformly to fit the physical backing
/// buffer (`container * device_pixel_ratio`) and centered, producing letterbox or
/// pillarbox bars when the aspect ratios differ. Content is never stretched.
///
/// Coordinate spaces:
/// - container: window/CSS units, what pointer events report
/// - physical: backing buffer pixels (`container * dpr`)
/// - logical: the space game code works in (`0..base.width`, `0..base.height`)
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    base: Viewport,
    container: Viewport,
    device_pixel_ratio: f32,
    physical_width: u32,
    physical_height: u32,
    scale: f32,
    offset: Vec2,
}

impl Scaler {
    /// Creates a scaler whose container initially matches `base` at 1x density.
    pub fn new(base: Viewport) -> Self {
        let mut scaler = Self {
            base,
            container: base,
            device_pixel_ratio: 1.0,
            physical_width: 0,
            physical_height: 0,
            scale: 1.0,
            offset: Vec2::ZERO,
        };
        scaler.recompute();
        scaler
    }

    /// Recomputes the backing size, scale and offsets after a container resize
    /// or a device-pixel-ratio change.
    pub fn resize(&mut self, container: Viewport, device_pixel_ratio: f32) {
        self.container = container;
        self.device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        self.recompute();
    }

    /// Changes the logical resolution, keeping the current container.
    pub fn set_base(&mut self, base: Viewport) {
        self.base = base;
        self.recompute();
    }

    fn recompute(&mut self) {
        let dpr = self.device_pixel_ratio;
        let pw = (self.container.width * dpr).round().max(0.0);
        let ph = (self.container.height * dpr).round().max(0.0);
        self.physical_width = pw as u32;
        self.physical_height = ph as u32;

        if !self.base.is_valid() || pw <= 0.0 || ph <= 0.0 {
            self.scale = 1.0;
            self.offset = Vec2::ZERO;
            return;
        }

        self.scale = (pw / self.base.width).min(ph / self.base.height);
        self.offset = Vec2::new(
            (pw - self.base.width * self.scale) * 0.5,
            (ph - self.base.height * self.scale) * 0.5,
        );

        log::debug!(
            "scaler: base {}x{} -> physical {}x{} (dpr {}), scale {:.4}, offset ({:.1}, {:.1})",
            self.base.width,
            self.base.height,
            self.physical_width,
            self.physical_height,
            dpr,
            self.scale,
            self.offset.x,
            self.offset.y,
        );
    }

    #[inline]
    pub fn base(&self) -> Viewport {
        self.base
    }

    #[inline]
    pub fn container(&self) -> Viewport {
        self.container
    }

    #[inline]
    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Backing buffer size in physical pixels.
    #[inline]
    pub fn physical_size(&self) -> (u32, u32) {
        (self.physical_width, self.physical_height)
    }

    /// Uniform logical-to-physical scale factor.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Offset of the logical content inside the physical buffer (physical px).
    #[inline]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// `translate(offset) * scale(scale)`: logical -> physical.
    pub fn transform(&self) -> Affine2 {
        let mut m = Affine2::from_translation(self.offset);
        m.scale(self.scale, self.scale);
        m
    }

    /// Physical rectangle covered by the logical content.
    pub fn content_rect(&self) -> Rect {
        Rect::from_origin_size(self.offset, self.base.size() * self.scale)
    }

    /// Converts a container-space point (e.g. a pointer position) to logical space.
    pub fn to_logical(&self, container_point: Vec2) -> Vec2 {
        let physical = container_point * self.device_pixel_ratio;
        (physical - self.offset) / self.scale
    }

    /// Converts a logical point to container space.
    pub fn to_container(&self, logical: Vec2) -> Vec2 {
        (logical * self.scale + self.offset) / self.device_pixel_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn matching_aspect_has_no_bars() {
        let mut s = Scaler::new(Viewport::new(320.0, 180.0));
        s.resize(Viewport::new(1280.0, 720.0), 1.0);
        assert_eq!(s.scale(), 4.0);
        assert_eq!(s.offset(), Vec2::ZERO);
        assert_eq!(s.physical_size(), (1280, 720));
    }

    #[test]
    fn wider_container_pillarboxes() {
        let mut s = Scaler::new(Viewport::new(100.0, 100.0));
        s.resize(Viewport::new(400.0, 200.0), 1.0);
        assert_eq!(s.scale(), 2.0);
        assert_eq!(s.offset(), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn taller_container_letterboxes() {
        let mut s = Scaler::new(Viewport::new(100.0, 50.0));
        s.resize(Viewport::new(100.0, 150.0), 1.0);
        assert_eq!(s.scale(), 1.0);
        assert_eq!(s.offset(), Vec2::new(0.0, 50.0));
    }

    #[test]
    fn device_pixel_ratio_grows_backing_buffer() {
        let mut s = Scaler::new(Viewport::new(200.0, 100.0));
        s.resize(Viewport::new(200.0, 100.0), 2.0);
        assert_eq!(s.physical_size(), (400, 200));
        assert_eq!(s.scale(), 2.0);
    }

    #[test]
    fn to_logical_inverts_offset_then_scale() {
        let mut s = Scaler::new(Viewport::new(100.0, 100.0));
        s.resize(Viewport::new(400.0, 200.0), 1.5);

        let logical = Vec2::new(25.0, 75.0);
        let container = s.to_container(logical);
        assert!(s.to_logical(container).approx_eq(logical, EPS));

        // Container center maps to logical center.
        assert!(s.to_logical(Vec2::new(200.0, 100.0)).approx_eq(Vec2::new(50.0, 50.0), EPS));
    }

    #[test]
    fn transform_matches_point_conversion() {
        let mut s = Scaler::new(Viewport::new(100.0, 100.0));
        s.resize(Viewport::new(300.0, 200.0), 1.0);
        let p = Vec2::new(10.0, 20.0);
        assert!(s.transform().transform_point(p).approx_eq(p * s.scale() + s.offset(), EPS));
    }

    #[test]
    fn invalid_ratio_falls_back_to_one() {
        let mut s = Scaler::new(Viewport::new(10.0, 10.0));
        s.resize(Viewport::new(10.0, 10.0), 0.0);
        assert_eq!(s.device_pixel_ratio(), 1.0);
    }
}
