use std::cell::Cell;

use anyhow::Result;

use kite_engine::assets::{AssetEvent, AssetStore};
use kite_engine::coords::{Affine2, Rect, Scaler, Vec2, Viewport};
use kite_engine::core::{App, AppControl, FrameCtx};
use kite_engine::device::GpuInit;
use kite_engine::draw::{Canvas, DrawList, DrawOrder};
use kite_engine::input::InputFrame;
use kite_engine::paint::Color;
use kite_engine::render::QuadRenderer;
use kite_engine::time::FrameTime;
use kite_engine::window::{Runtime, RuntimeConfig};

use crate::node::{FrameEnv, NodeId, NodeView};
use crate::tree::SceneTree;

/// Stage setup.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Logical resolution game code is written against.
    pub base_size: Viewport,

    /// Background of the logical content area.
    pub clear: Color,

    /// Colour of the letterbox/pillarbox bars around the content area.
    pub letterbox: Color,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            base_size: Viewport::new(800.0, 600.0),
            clear: Color::from_srgb_u8(0x20, 0x24, 0x2c, 0xff),
            letterbox: Color::BLACK,
        }
    }
}

/// Loop driver: owns the scene, the scaler, assets and the renderer and runs
/// one iteration per frame.
///
/// An iteration is [`step`](Self::step) (asset poll, update walk collecting the
/// render queue, physics walk) followed by [`render`](Self::render) (clear, sort
/// by z-index keeping traversal order for ties, draw every queued node through
/// `viewport * camera * world`). Both halves run without a window, which is how
/// the tests drive it.
pub struct Stage {
    config: StageConfig,
    tree: SceneTree,
    scaler: Scaler,
    assets: AssetStore,
    asset_events: Vec<AssetEvent>,

    canvas: Canvas,
    renderer: QuadRenderer,

    queue: Vec<NodeId>,
    order: Vec<(DrawOrder, NodeId)>,

    pointer: Option<Vec2>,
    alive: bool,
    frames: u64,
}

impl Stage {
    pub fn new(config: StageConfig) -> Self {
        log::debug!(
            "stage created: base {}x{}",
            config.base_size.width,
            config.base_size.height
        );
        Self {
            scaler: Scaler::new(config.base_size),
            config,
            tree: SceneTree::new(),
            assets: AssetStore::new(),
            asset_events: Vec::new(),
            canvas: Canvas::new(),
            renderer: QuadRenderer::new(),
            queue: Vec::new(),
            order: Vec::new(),
            pointer: None,
            alive: true,
            frames: 0,
        }
    }

    /// Opens a window and runs the stage until it stops or the window closes.
    pub fn run(self, window: RuntimeConfig) -> Result<()> {
        Runtime::run(window, GpuInit::default(), self)
    }

    #[inline]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    #[inline]
    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    #[inline]
    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    #[inline]
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    #[inline]
    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    /// Asset notifications delivered at the start of the last step.
    #[inline]
    pub fn asset_events(&self) -> &[AssetEvent] {
        &self.asset_events
    }

    /// Nodes queued by the last update walk, in traversal order.
    #[inline]
    pub fn render_queue(&self) -> &[NodeId] {
        &self.queue
    }

    /// Nodes in the order the last render drew them.
    pub fn draw_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().map(|&(_, id)| id)
    }

    /// Completed iterations.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Stops scheduling further iterations. An iteration in flight completes.
    pub fn stop(&mut self) {
        if self.alive {
            log::info!("stage stopped after {} frame(s)", self.frames);
        }
        self.alive = false;
    }

    /// Container resize or device-pixel-ratio change.
    pub fn resize(&mut self, container: Viewport, device_pixel_ratio: f32) {
        self.scaler.resize(container, device_pixel_ratio);
    }

    /// Pointer from the last step projected into world space through the main camera.
    pub fn pointer_world(&self) -> Option<Vec2> {
        let pointer = self.pointer?;
        Some(self.tree.pointer_to_world(&self.scaler, pointer))
    }

    /// Logic half of an iteration: delivers finished asset loads, then runs the
    /// update walk (hooks, transforms, render queue) and the physics walk.
    pub fn step(&mut self, time: FrameTime, input: &InputFrame) {
        if !self.alive {
            return;
        }

        self.asset_events = self.assets.poll();
        self.pointer = input.pointer();
        self.queue.clear();

        let stop = Cell::new(false);
        let env = FrameEnv {
            time,
            input,
            assets: &self.assets,
            scaler: &self.scaler,
            stop: &stop,
        };

        let root = self.tree.root();
        self.tree.update(root, env, &mut self.queue);
        self.tree.physics(root, env);
        self.frames += 1;

        if stop.get() {
            self.stop();
        }
    }

    /// Drawing half of an iteration. Records the queued nodes into the canvas
    /// and returns the resulting draw list (physical pixels).
    pub fn render(&mut self) -> &DrawList {
        self.canvas.begin_frame();
        self.canvas.clear(self.config.letterbox);
        self.canvas.set_transform(self.scaler.transform());
        self.canvas
            .fill_rect(Rect::from_origin_size(Vec2::ZERO, self.config.base_size.size()), self.config.clear);

        self.order.clear();
        for (seq, &id) in self.queue.iter().enumerate() {
            if let Some(node) = self.tree.node(id) {
                self.order.push((DrawOrder::new(node.z_index(), seq as u32), id));
            }
        }
        // Keys are unique (seq), so ties on z keep traversal order.
        self.order.sort_unstable_by_key(|&(key, _)| key);

        let screen = self.scaler.transform();
        let base = self.scaler.base();

        for &(_, id) in &self.order {
            let Some(behavior) = self.tree.node(id).and_then(|n| n.behavior.as_deref()) else {
                continue;
            };
            let Some(world) = self.tree.world_transform(id) else { continue };
            let view = self
                .tree
                .effective_camera(id)
                .and_then(|cam| self.tree.view_matrix(cam, base))
                .unwrap_or(Affine2::IDENTITY);

            self.canvas.save();
            self.canvas.set_transform(screen * view * world);
            behavior.render(
                &mut self.canvas,
                NodeView {
                    id,
                    tree: &self.tree,
                    assets: &self.assets,
                },
            );
            self.canvas.restore();
        }

        self.draw_letterbox();
        self.canvas.list()
    }

    /// Covers everything outside the logical content area.
    fn draw_letterbox(&mut self) {
        let (pw, ph) = self.scaler.physical_size();
        let (pw, ph) = (pw as f32, ph as f32);
        let content = self.scaler.content_rect();

        self.canvas.set_transform(Affine2::IDENTITY);
        let bars = [
            Rect::from_edges(0.0, 0.0, pw, content.top()),
            Rect::from_edges(0.0, content.bottom(), pw, ph),
            Rect::from_edges(0.0, content.top(), content.left(), content.bottom()),
            Rect::from_edges(content.right(), content.top(), pw, content.bottom()),
        ];
        for bar in bars {
            if bar.width() >= 0.5 && bar.height() >= 0.5 {
                self.canvas.fill_rect(bar, self.config.letterbox);
            }
        }
    }

    /// One full iteration against a live window: step, render, present.
    pub fn frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.alive {
            return AppControl::Exit;
        }

        self.step(ctx.time, ctx.input_frame);
        if !self.alive {
            return AppControl::Exit;
        }

        self.render();
        let control = ctx.present(&mut self.renderer, self.canvas.list());
        if control == AppControl::Exit {
            self.stop();
        }
        control
    }
}

impl App for Stage {
    fn on_resize(&mut self, container: Viewport, scale_factor: f32) {
        self.resize(container, scale_factor);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.frame(ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use kite_engine::draw::ZIndex;

    use super::*;
    use crate::node::Behavior;

    struct Square(Color);

    impl Behavior for Square {
        fn render(&self, canvas: &mut Canvas, _node: NodeView<'_>) {
            canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), self.0);
        }
    }

    fn tick(dt: f32, frame_index: u64) -> FrameTime {
        FrameTime {
            dt,
            elapsed: dt as f64 * (frame_index + 1) as f64,
            now: Instant::now(),
            frame_index,
        }
    }

    fn stage(base: Viewport) -> Stage {
        Stage::new(StageConfig {
            base_size: base,
            clear: Color::WHITE,
            letterbox: Color::BLACK,
        })
    }

    // ── render ────────────────────────────────────────────────────────────

    #[test]
    fn nodes_draw_through_scaler_and_world() {
        let mut s = stage(Viewport::new(100.0, 100.0));
        s.resize(Viewport::new(200.0, 200.0), 1.0);

        let root = s.tree().root();
        let sq = s.tree_mut().spawn_with(root, "sq", Square(Color::BLACK)).unwrap();
        s.tree_mut().set_position(sq, Vec2::new(10.0, 20.0));

        s.step(tick(0.016, 0), &InputFrame::default());
        let list = s.render();

        // Background quad first, then the node.
        assert_eq!(list.len(), 2);
        let q = &list.quads()[1];
        assert!(q.corners[0].approx_eq(Vec2::new(20.0, 40.0), 1e-4));
        assert!(q.corners[2].approx_eq(Vec2::new(40.0, 60.0), 1e-4));
    }

    #[test]
    fn letterbox_bars_cover_pillarbox() {
        let mut s = stage(Viewport::new(100.0, 100.0));
        s.resize(Viewport::new(300.0, 100.0), 1.0);

        s.step(tick(0.016, 0), &InputFrame::default());
        let list = s.render();

        // Background + left and right bars.
        assert_eq!(list.len(), 3);
        assert_eq!(list.clear_color(), Some(Color::BLACK));
        let left = &list.quads()[1];
        assert!(left.corners[2].approx_eq(Vec2::new(100.0, 100.0), 1e-4));
    }

    #[test]
    fn z_index_orders_draws() {
        let mut s = stage(Viewport::new(100.0, 100.0));
        let root = s.tree().root();
        let front = s.tree_mut().spawn_with(root, "front", Square(Color::WHITE)).unwrap();
        let back = s.tree_mut().spawn_with(root, "back", Square(Color::BLACK)).unwrap();
        s.tree_mut().set_z_index(front, ZIndex(5));
        s.tree_mut().set_z_index(back, ZIndex(3));

        s.step(tick(0.016, 0), &InputFrame::default());
        s.render();

        let drawn: Vec<_> = s.draw_order().filter(|&id| id != root).collect();
        assert_eq!(drawn, vec![back, front]);
    }

    #[test]
    fn hidden_nodes_are_not_queued() {
        let mut s = stage(Viewport::new(100.0, 100.0));
        let root = s.tree().root();
        let sq = s.tree_mut().spawn_with(root, "sq", Square(Color::BLACK)).unwrap();
        s.tree_mut().set_visible(sq, false);

        s.step(tick(0.016, 0), &InputFrame::default());
        assert!(!s.render_queue().contains(&sq));
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn stopped_stage_does_not_step() {
        let mut s = stage(Viewport::new(100.0, 100.0));
        s.step(tick(0.016, 0), &InputFrame::default());
        s.stop();
        s.step(tick(0.016, 1), &InputFrame::default());
        assert!(!s.is_alive());
        assert_eq!(s.frames(), 1);
    }

    #[test]
    fn hook_can_request_stop() {
        struct Quit;
        impl Behavior for Quit {
            fn update(&mut self, ctx: &mut crate::node::NodeCtx<'_>) {
                ctx.stop();
            }
        }

        let mut s = stage(Viewport::new(100.0, 100.0));
        let root = s.tree().root();
        s.tree_mut().spawn_with(root, "quit", Quit).unwrap();
        s.step(tick(0.016, 0), &InputFrame::default());
        assert!(!s.is_alive());
    }
}
