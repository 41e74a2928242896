use std::cell::Cell;
use std::fmt;

use kite_engine::assets::AssetStore;
use kite_engine::coords::{Affine2, Scaler, Vec2, Watched};
use kite_engine::draw::{Canvas, ZIndex};
use kite_engine::input::InputFrame;
use kite_engine::time::FrameTime;

use crate::tree::SceneTree;

slotmap::new_key_type! {
    /// Handle of a node inside a [`SceneTree`]. Stale handles are detected, never reused.
    pub struct NodeId;
}

/// Per-node game logic.
///
/// Every hook has an empty default, so a behavior only overrides what it needs.
/// `update` and `physics` may freely mutate the tree (move nodes, spawn, destroy);
/// `render` draws in the node's local, unscaled space with the canvas already
/// positioned by `viewport * camera * world`.
pub trait Behavior: 'static {
    fn update(&mut self, ctx: &mut NodeCtx<'_>) {
        let _ = ctx;
    }

    fn physics(&mut self, ctx: &mut NodeCtx<'_>) {
        let _ = ctx;
    }

    fn render(&self, canvas: &mut Canvas, node: NodeView<'_>) {
        let _ = (canvas, node);
    }
}

/// Read-only frame inputs shared by every hook of one pass.
#[derive(Clone, Copy)]
pub struct FrameEnv<'a> {
    pub time: FrameTime,
    pub input: &'a InputFrame,
    pub assets: &'a AssetStore,
    pub scaler: &'a Scaler,
    /// Set by a hook to stop the loop after the current iteration.
    pub stop: &'a Cell<bool>,
}

/// Context handed to [`Behavior::update`] and [`Behavior::physics`].
pub struct NodeCtx<'a> {
    /// The node whose hook is running.
    pub id: NodeId,
    pub tree: &'a mut SceneTree,
    pub env: FrameEnv<'a>,
}

impl<'a> NodeCtx<'a> {
    /// Clamped seconds since the previous frame.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.env.time.dt
    }

    #[inline]
    pub fn input(&self) -> &InputFrame {
        self.env.input
    }

    #[inline]
    pub fn assets(&self) -> &AssetStore {
        self.env.assets
    }

    /// Asks the stage to stop once this iteration finishes.
    pub fn stop(&self) {
        self.env.stop.set(true);
    }

    /// Pointer position projected through the scaler and the main camera.
    pub fn pointer_world(&self) -> Option<Vec2> {
        let pointer = self.env.input.pointer()?;
        Some(self.tree.pointer_to_world(self.env.scaler, pointer))
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.tree.node(self.id).map_or(Vec2::ZERO, Node::position)
    }

    #[inline]
    pub fn set_position(&mut self, position: Vec2) -> bool {
        self.tree.set_position(self.id, position)
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.tree.node(self.id).map_or(0.0, Node::rotation)
    }

    #[inline]
    pub fn set_rotation(&mut self, rotation: f32) -> bool {
        self.tree.set_rotation(self.id, rotation)
    }
}

/// Context handed to [`Behavior::render`].
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    pub id: NodeId,
    pub tree: &'a SceneTree,
    pub assets: &'a AssetStore,
}

impl<'a> NodeView<'a> {
    #[inline]
    pub fn node(&self) -> Option<&'a Node> {
        self.tree.node(self.id)
    }
}

/// One entry of the scene graph.
///
/// Local state is public through getters; mutation goes through [`SceneTree`]
/// so dirtiness and hierarchy stay consistent.
pub struct Node {
    pub(crate) name: String,

    pub(crate) position: Watched<Vec2>,
    pub(crate) rotation: f32,
    pub(crate) scale: Watched<Vec2>,

    pub(crate) z_index: ZIndex,
    pub(crate) child_index: i32,
    pub(crate) visible: bool,
    pub(crate) camera: Option<NodeId>,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) children_order_dirty: bool,

    pub(crate) local: Cell<Affine2>,
    pub(crate) world: Cell<Affine2>,
    pub(crate) dirty: Cell<bool>,

    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Watched::new(Vec2::ZERO),
            rotation: 0.0,
            scale: Watched::new(Vec2::ONE),
            z_index: ZIndex::default(),
            child_index: 0,
            visible: true,
            camera: None,
            parent: None,
            children: Vec::new(),
            children_order_dirty: false,
            local: Cell::new(Affine2::IDENTITY),
            world: Cell::new(Affine2::IDENTITY),
            dirty: Cell::new(true),
            behavior: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position.get()
    }

    /// Local rotation in radians.
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> Vec2 {
        self.scale.get()
    }

    #[inline]
    pub fn z_index(&self) -> ZIndex {
        self.z_index
    }

    #[inline]
    pub fn child_index(&self) -> i32 {
        self.child_index
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Explicit camera override; `None` falls back to the tree's main camera.
    #[inline]
    pub fn camera_override(&self) -> Option<NodeId> {
        self.camera
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in their current traversal order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the cached world transform is stale.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    #[inline]
    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("position", &self.position.get())
            .field("rotation", &self.rotation)
            .field("scale", &self.scale.get())
            .field("z_index", &self.z_index)
            .field("child_index", &self.child_index)
            .field("visible", &self.visible)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("dirty", &self.dirty.get())
            .finish_non_exhaustive()
    }
}
