use kite_engine::coords::{Affine2, Rect, Vec2, Viewport};

use crate::error::{Result, SceneError};
use crate::node::NodeId;
use crate::tree::SceneTree;

/// Camera component attached to a scene node.
///
/// The node's world transform places the eye; the camera adds zoom, optional
/// centering, positional smoothing and clamping to a world-space bound. The view
/// matrix is
///
/// ```text
/// view = translate(viewport / 2)? * scale(zoom) * inverse(eye)
/// ```
///
/// where `eye` is the node's world transform with its translation replaced by the
/// (smoothed, then bound-corrected) camera position.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    zoom: f32,
    centered: bool,

    bounds: Rect,
    bounds_enabled: bool,

    smoothing: f32,
    smoothing_enabled: bool,
    smoothed: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            centered: true,
            bounds: Rect::new(0.0, 0.0, 0.0, 0.0),
            bounds_enabled: false,
            smoothing: 5.0,
            smoothing_enabled: false,
            smoothed: None,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform zoom. Negative and non-finite values clamp to `0`.
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.set_zoom(zoom);
        self
    }

    pub fn with_centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.set_bounds(Some(bounds));
        self
    }

    pub fn with_smoothing(mut self, speed: f32) -> Self {
        self.set_smoothing(Some(speed));
        self
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() { zoom.max(0.0) } else { 0.0 };
    }

    #[inline]
    pub fn is_centered(&self) -> bool {
        self.centered
    }

    /// When set, the camera position maps to the viewport center; otherwise it
    /// maps to the viewport's top-left corner.
    pub fn set_centered(&mut self, centered: bool) {
        self.centered = centered;
    }

    /// The world-space bound, if enabled.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds_enabled.then_some(self.bounds)
    }

    pub fn set_bounds(&mut self, bounds: Option<Rect>) {
        match bounds {
            Some(b) => {
                self.bounds = b.normalized();
                self.bounds_enabled = true;
            }
            None => self.bounds_enabled = false,
        }
    }

    /// Smoothing speed (per second), if enabled.
    pub fn smoothing(&self) -> Option<f32> {
        self.smoothing_enabled.then_some(self.smoothing)
    }

    /// Enables exponential follow at `speed` per second, or disables it with `None`.
    pub fn set_smoothing(&mut self, speed: Option<f32>) {
        match speed {
            Some(s) => {
                self.smoothing = if s.is_finite() { s.max(0.0) } else { 0.0 };
                self.smoothing_enabled = true;
            }
            None => {
                self.smoothing_enabled = false;
                self.smoothed = None;
            }
        }
    }

    /// Current smoothed position; `None` until the first tick.
    #[inline]
    pub fn smoothed_position(&self) -> Option<Vec2> {
        self.smoothed
    }

    /// Jumps the smoothed position to `position`.
    pub fn snap_to(&mut self, position: Vec2) {
        self.smoothed = Some(position);
    }

    /// Advances smoothing toward `target` (the node's global position).
    ///
    /// The first tick after enabling snaps; later ticks cover
    /// `clamp(speed * dt, 0, 1)` of the remaining distance.
    pub fn tick(&mut self, target: Vec2, dt: f32) {
        if !self.smoothing_enabled {
            self.smoothed = None;
            return;
        }
        let next = match self.smoothed {
            None => target,
            Some(current) => {
                let t = (self.smoothing * dt).clamp(0.0, 1.0);
                current + (target - current) * t
            }
        };
        self.smoothed = Some(if next.is_finite() { next } else { target });
    }

    /// Logical size of the world region visible through `viewport`.
    pub fn view_size(&self, viewport: Viewport) -> Vec2 {
        if self.zoom > 0.0 {
            viewport.size() / self.zoom
        } else {
            viewport.size()
        }
    }

    /// World rectangle seen from `position` (before bound correction).
    pub fn view_rect(&self, position: Vec2, viewport: Viewport) -> Rect {
        let size = self.view_size(viewport);
        if self.centered {
            Rect::from_center_size(position, size)
        } else {
            Rect::from_origin_size(position, size)
        }
    }

    /// Translation that keeps the view inside the bound.
    ///
    /// Per axis: a view larger than the bound is centered on it; otherwise an
    /// overhanging view is pushed back inside. Rotation is not taken into account.
    pub fn bounds_correction(&self, position: Vec2, viewport: Viewport) -> Vec2 {
        let Some(bound) = self.bounds() else { return Vec2::ZERO };
        let view = self.view_rect(position, viewport);

        let axis = |view_min: f32, view_max: f32, lo: f32, hi: f32| -> f32 {
            if view_max - view_min > hi - lo {
                (lo + hi) * 0.5 - (view_min + view_max) * 0.5
            } else if view_min < lo {
                lo - view_min
            } else if view_max > hi {
                hi - view_max
            } else {
                0.0
            }
        };

        Vec2::new(
            axis(view.left(), view.right(), bound.left(), bound.right()),
            axis(view.top(), view.bottom(), bound.top(), bound.bottom()),
        )
    }

    /// Camera position the view is built from: smoothed when smoothing is on,
    /// then corrected into the bound.
    pub fn effective_position(&self, raw: Vec2, viewport: Viewport) -> Vec2 {
        let position = match (self.smoothing_enabled, self.smoothed) {
            (true, Some(s)) => s,
            _ => raw,
        };
        position + self.bounds_correction(position, viewport)
    }

    /// World-to-screen matrix for a camera whose node has world transform `world`.
    pub fn view_matrix(&self, world: &Affine2, viewport: Viewport) -> Affine2 {
        let position = self.effective_position(world.translation(), viewport);

        let mut eye = *world;
        eye.tx = position.x;
        eye.ty = position.y;

        let mut view = eye.inverse();
        view.prepend(&Affine2::from_scale(Vec2::splat(self.zoom)));
        if self.centered {
            view.prepend(&Affine2::from_translation(viewport.center()));
        }
        view
    }
}

// ── tree integration ─────────────────────────────────────────────────────

impl SceneTree {
    /// Attaches `camera` to `id`, replacing any camera it already had.
    ///
    /// A smoothing camera starts from the node's current global position, so
    /// the first tick after attaching already eases toward a moved target.
    pub fn add_camera(&mut self, id: NodeId, mut camera: Camera) -> Result<()> {
        let position = self.global_position(id).ok_or(SceneError::MissingNode(id))?;
        if camera.smoothing_enabled && camera.smoothed.is_none() {
            camera.snap_to(position);
        }
        self.cameras.insert(id, camera);
        Ok(())
    }

    /// Enables or disables smoothing on the camera of `id`. Turning it on seeds
    /// the accumulator with the node's current global position.
    pub fn set_camera_smoothing(&mut self, id: NodeId, speed: Option<f32>) -> Result<()> {
        let position = self.global_position(id).ok_or(SceneError::MissingNode(id))?;
        let camera = self.cameras.get_mut(id).ok_or(SceneError::MissingNode(id))?;
        camera.set_smoothing(speed);
        if camera.smoothing_enabled && camera.smoothed.is_none() {
            camera.snap_to(position);
        }
        Ok(())
    }

    pub fn remove_camera(&mut self, id: NodeId) -> Option<Camera> {
        if self.main_camera == Some(id) {
            self.main_camera = None;
        }
        self.cameras.remove(id)
    }

    #[inline]
    pub fn camera(&self, id: NodeId) -> Option<&Camera> {
        self.cameras.get(id)
    }

    #[inline]
    pub fn camera_mut(&mut self, id: NodeId) -> Option<&mut Camera> {
        self.cameras.get_mut(id)
    }

    #[inline]
    pub fn main_camera(&self) -> Option<NodeId> {
        self.main_camera
    }

    /// Makes `id` the fallback camera for nodes without an override. `id` must
    /// carry a camera component.
    pub fn set_main_camera(&mut self, id: Option<NodeId>) -> Result<()> {
        if let Some(id) = id {
            if !self.cameras.contains_key(id) {
                return Err(SceneError::MissingNode(id));
            }
        }
        self.main_camera = id;
        Ok(())
    }

    /// The camera `id` is rendered through: its override when that still has a
    /// camera, else the main camera.
    pub fn effective_camera(&self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        node.camera
            .filter(|c| self.cameras.contains_key(*c))
            .or(self.main_camera)
            .filter(|c| self.cameras.contains_key(*c))
    }

    pub fn view_matrix(&self, camera: NodeId, viewport: Viewport) -> Option<Affine2> {
        let cam = self.cameras.get(camera)?;
        let world = self.resolve_transform(camera)?;
        Some(cam.view_matrix(&world, viewport))
    }

    /// Logical screen point to world space. Exact inverse of [`world_to_screen`](Self::world_to_screen).
    pub fn screen_to_world(&self, camera: NodeId, viewport: Viewport, screen: Vec2) -> Option<Vec2> {
        Some(self.view_matrix(camera, viewport)?.inverse().transform_point(screen))
    }

    pub fn world_to_screen(&self, camera: NodeId, viewport: Viewport, world: Vec2) -> Option<Vec2> {
        Some(self.view_matrix(camera, viewport)?.transform_point(world))
    }

    /// Resets smoothing so the camera jumps to its node's current position.
    pub fn snap_camera(&mut self, camera: NodeId) {
        let Some(position) = self.global_position(camera) else { return };
        if let Some(cam) = self.cameras.get_mut(camera) {
            if cam.smoothing_enabled {
                cam.snap_to(position);
            }
        }
    }
}
