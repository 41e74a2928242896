use slotmap::{SecondaryMap, SlotMap};

use kite_engine::coords::{Affine2, Scaler, Vec2};
use kite_engine::draw::ZIndex;

use crate::camera::Camera;
use crate::error::{Result, SceneError};
use crate::node::{Behavior, FrameEnv, Node, NodeCtx, NodeId};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Hook {
    Update,
    Physics,
}

/// Arena-backed scene graph.
///
/// The tree owns every node; parents list their children by id and children
/// point back with a plain id, so there are no ownership cycles. A node created
/// with [`create`](Self::create) is detached until it is added under the root
/// (directly or through other nodes); only attached nodes take part in
/// [`update`](Self::update) and [`physics`](Self::physics) walks started at the root.
///
/// World transforms are cached per node and recomputed lazily. Any change to a
/// node's position, rotation, scale or parent marks it and its whole subtree
/// dirty; reads resolve top-down before returning, so a stale transform is never
/// observed.
pub struct SceneTree {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) cameras: SecondaryMap<NodeId, Camera>,
    pub(crate) main_camera: Option<NodeId>,
    root: NodeId,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("root"));
        Self {
            nodes,
            cameras: SecondaryMap::new(),
            main_camera: None,
            root,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    // ── creation / destruction ────────────────────────────────────────────

    /// Creates a detached node.
    pub fn create(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(name))
    }

    /// Creates a node and attaches it under `parent`.
    pub fn spawn(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        if !self.contains(parent) {
            return Err(SceneError::MissingNode(parent));
        }
        let id = self.create(name);
        self.add_child(parent, id)?;
        Ok(id)
    }

    /// Creates a node driven by `behavior` and attaches it under `parent`.
    pub fn spawn_with(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        behavior: impl Behavior,
    ) -> Result<NodeId> {
        let id = self.spawn(parent, name)?;
        self.set_behavior(id, behavior)?;
        Ok(id)
    }

    /// Installs (or replaces) the hooks of `id`.
    pub fn set_behavior(&mut self, id: NodeId, behavior: impl Behavior) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::MissingNode(id))?;
        node.behavior = Some(Box::new(behavior));
        Ok(())
    }

    /// Detaches `id` and destroys it together with all of its descendants.
    ///
    /// Their ids become stale; cameras attached to them are dropped and the
    /// main camera is cleared if it was among them.
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(SceneError::RootNode);
        }
        if !self.contains(id) {
            return Err(SceneError::MissingNode(id));
        }

        self.detach(id);

        let mut stack = vec![id];
        let mut destroyed = 0usize;
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.remove(next) else { continue };
            stack.extend(node.children.iter().copied());
            self.cameras.remove(next);
            if self.main_camera == Some(next) {
                log::debug!("main camera {next:?} destroyed");
                self.main_camera = None;
            }
            destroyed += 1;
        }

        log::debug!("destroyed {id:?} ({destroyed} node(s))");
        Ok(())
    }

    // ── hierarchy ─────────────────────────────────────────────────────────

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Children of `id` in traversal order. Empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Whether `ancestor` appears on the parent chain of `id` (strictly above it).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    /// Whether `id` is the root or hangs under it.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && (id == self.root || self.is_ancestor(self.root, id))
    }

    /// Appends `child` to `parent`'s children, detaching it from its previous
    /// parent first.
    ///
    /// Fails without touching the tree when `child` is `parent` itself, an
    /// ancestor of `parent`, or the root.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if parent == child {
            log::warn!("add_child: refusing to attach {child:?} to itself");
            return Err(SceneError::SelfAttach(child));
        }
        if !self.contains(parent) {
            return Err(SceneError::MissingNode(parent));
        }
        if !self.contains(child) {
            return Err(SceneError::MissingNode(child));
        }
        if child == self.root {
            return Err(SceneError::RootNode);
        }
        if self.is_ancestor(child, parent) {
            log::warn!("add_child: {child:?} is an ancestor of {parent:?}; rejected");
            return Err(SceneError::Cycle { parent, child });
        }

        self.detach(child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
            p.children_order_dirty = true;
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
        self.mark_dirty(child);
        Ok(())
    }

    /// Detaches `child` from `parent`. Returns `Ok(false)` when `child` is not
    /// currently a child of `parent`.
    ///
    /// The detached node stays alive (see [`destroy`](Self::destroy)).
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool> {
        if !self.contains(parent) {
            return Err(SceneError::MissingNode(parent));
        }
        if self.parent(child) != Some(parent) {
            return Ok(false);
        }
        self.detach(child);
        Ok(true)
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else { return };

        if let Some(p) = self.nodes.get_mut(parent) {
            if let Some(i) = p.children.iter().position(|&c| c == child) {
                p.children.remove(i);
            }
            p.children_order_dirty = true;
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
        self.mark_dirty(child);
    }

    // ── local state ───────────────────────────────────────────────────────

    /// Sets the local position. Returns `false` (and dirties nothing) when the
    /// value is unchanged, not finite, or the node is unknown.
    pub fn set_position(&mut self, id: NodeId, position: Vec2) -> bool {
        if !position.is_finite() {
            log::warn!("set_position: ignoring non-finite {position:?} for {id:?}");
            return false;
        }
        let Some(node) = self.nodes.get_mut(id) else { return false };
        if !node.position.set(position) {
            return false;
        }
        self.mark_dirty(id);
        true
    }

    /// Sets the local rotation in radians.
    pub fn set_rotation(&mut self, id: NodeId, rotation: f32) -> bool {
        if !rotation.is_finite() {
            log::warn!("set_rotation: ignoring non-finite {rotation} for {id:?}");
            return false;
        }
        let Some(node) = self.nodes.get_mut(id) else { return false };
        if node.rotation == rotation {
            return false;
        }
        node.rotation = rotation;
        self.mark_dirty(id);
        true
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) -> bool {
        if !scale.is_finite() {
            log::warn!("set_scale: ignoring non-finite {scale:?} for {id:?}");
            return false;
        }
        let Some(node) = self.nodes.get_mut(id) else { return false };
        if !node.scale.set(scale) {
            return false;
        }
        self.mark_dirty(id);
        true
    }

    /// Moves the local position by `delta`.
    pub fn translate(&mut self, id: NodeId, delta: Vec2) -> bool {
        let Some(current) = self.nodes.get(id).map(Node::position) else { return false };
        self.set_position(id, current + delta)
    }

    /// Installs a listener fired whenever the local position actually changes.
    pub fn watch_position(&mut self, id: NodeId, listener: impl FnMut(Vec2) + 'static) -> bool {
        let Some(node) = self.nodes.get_mut(id) else { return false };
        node.position.watch(listener);
        true
    }

    pub fn unwatch_position(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.position.unwatch();
        }
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.name = name.into();
        }
    }

    /// Global draw layer; compared across the whole render queue.
    pub fn set_z_index(&mut self, id: NodeId, z: impl Into<ZIndex>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.z_index = z.into();
        }
    }

    /// Ordering among siblings only. Re-sorting happens lazily on the next update walk.
    pub fn set_child_index(&mut self, id: NodeId, index: i32) {
        let Some(node) = self.nodes.get_mut(id) else { return };
        if node.child_index == index {
            return;
        }
        node.child_index = index;
        let parent = node.parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children_order_dirty = true;
        }
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = visible;
        }
    }

    /// Renders `id` through `camera` instead of the main camera. `None` restores
    /// the fallback.
    pub fn set_camera_override(&mut self, id: NodeId, camera: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.camera = camera;
        }
    }

    // ── transforms ────────────────────────────────────────────────────────

    fn mark_dirty(&self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else { return };
        // A dirty node's subtree is already dirty.
        if node.dirty.replace(true) {
            return;
        }
        for &child in &node.children {
            self.mark_dirty(child);
        }
    }

    /// Brings the cached transforms of `id` up to date and returns its world
    /// transform. Ancestors are resolved first; clean nodes return the cache.
    pub fn resolve_transform(&self, id: NodeId) -> Option<Affine2> {
        let node = self.nodes.get(id)?;
        if !node.dirty.get() {
            return Some(node.world.get());
        }

        let parent_world = node.parent.and_then(|p| self.resolve_transform(p));
        let local = Affine2::from_trs(node.position.get(), node.rotation, node.scale.get());
        let world = match parent_world {
            Some(pw) => pw * local,
            None => local,
        };

        node.local.set(local);
        node.world.set(world);
        node.dirty.set(false);
        Some(world)
    }

    /// `translate(position) * rotate(rotation) * scale(scale)`.
    pub fn local_transform(&self, id: NodeId) -> Option<Affine2> {
        self.resolve_transform(id)?;
        Some(self.nodes.get(id)?.local.get())
    }

    #[inline]
    pub fn world_transform(&self, id: NodeId) -> Option<Affine2> {
        self.resolve_transform(id)
    }

    fn parent_world(&self, id: NodeId) -> Option<Affine2> {
        self.parent(id).and_then(|p| self.resolve_transform(p))
    }

    pub fn global_position(&self, id: NodeId) -> Option<Vec2> {
        Some(self.resolve_transform(id)?.translation())
    }

    /// Column norms of the world matrix; inexact under shear.
    pub fn global_scale(&self, id: NodeId) -> Option<Vec2> {
        Some(self.resolve_transform(id)?.scale_factors())
    }

    pub fn global_rotation(&self, id: NodeId) -> Option<f32> {
        Some(self.resolve_transform(id)?.rotation_angle())
    }

    /// Sets the local position that places `id` at `position` in world space.
    pub fn set_global_position(&mut self, id: NodeId, position: Vec2) -> bool {
        let local = match self.parent_world(id) {
            Some(pw) => pw.inverse().transform_point(position),
            None => position,
        };
        self.set_position(id, local)
    }

    pub fn set_global_rotation(&mut self, id: NodeId, rotation: f32) -> bool {
        let parent = self.parent_world(id).map_or(0.0, |pw| pw.rotation_angle());
        self.set_rotation(id, rotation - parent)
    }

    pub fn set_global_scale(&mut self, id: NodeId, scale: Vec2) -> bool {
        let parent = self.parent_world(id).map_or(Vec2::ONE, |pw| pw.scale_factors());
        self.set_scale(id, div_or_zero(scale, parent))
    }

    /// Maps a point from `id`'s local space to world space.
    pub fn local_to_global_position(&self, id: NodeId, local: Vec2) -> Option<Vec2> {
        Some(self.resolve_transform(id)?.transform_point(local))
    }

    /// Maps a world-space point into `id`'s local space.
    pub fn global_to_local_position(&self, id: NodeId, global: Vec2) -> Option<Vec2> {
        Some(self.resolve_transform(id)?.inverse().transform_point(global))
    }

    pub fn local_to_global_rotation(&self, id: NodeId, local: f32) -> Option<f32> {
        Some(self.global_rotation(id)? + local)
    }

    pub fn global_to_local_rotation(&self, id: NodeId, global: f32) -> Option<f32> {
        Some(global - self.global_rotation(id)?)
    }

    pub fn local_to_global_scale(&self, id: NodeId, local: Vec2) -> Option<Vec2> {
        Some(local.multiply(self.global_scale(id)?))
    }

    pub fn global_to_local_scale(&self, id: NodeId, global: Vec2) -> Option<Vec2> {
        Some(div_or_zero(global, self.global_scale(id)?))
    }

    // ── traversal ─────────────────────────────────────────────────────────

    /// Update walk rooted at `id`: runs the update hook, resolves the transform,
    /// queues the node for rendering when visible, then visits the children in
    /// `child_index` order.
    pub fn update(&mut self, id: NodeId, env: FrameEnv<'_>, queue: &mut Vec<NodeId>) {
        self.run_hook(id, env, Hook::Update);
        if self.resolve_transform(id).is_none() {
            return;
        }

        if self.nodes.get(id).is_some_and(|n| n.visible) {
            queue.push(id);
        }

        self.sort_children(id);
        for child in self.children(id).to_vec() {
            if self.parent(child) == Some(id) {
                self.update(child, env, queue);
            }
        }
    }

    /// Physics walk rooted at `id`. Ignores visibility. Cameras advance their
    /// smoothing here.
    pub fn physics(&mut self, id: NodeId, env: FrameEnv<'_>) {
        self.run_hook(id, env, Hook::Physics);
        let Some(world) = self.resolve_transform(id) else { return };

        if let Some(camera) = self.cameras.get_mut(id) {
            camera.tick(world.translation(), env.time.dt);
        }

        for child in self.children(id).to_vec() {
            if self.parent(child) == Some(id) {
                self.physics(child, env);
            }
        }
    }

    fn sort_children(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else { return };
        if !node.children_order_dirty {
            return;
        }
        node.children_order_dirty = false;
        let mut children = std::mem::take(&mut node.children);

        // Stable: equal indices keep insertion order.
        children.sort_by_key(|&c| self.nodes.get(c).map_or(0, |n| n.child_index));

        if let Some(node) = self.nodes.get_mut(id) {
            node.children = children;
        }
    }

    fn run_hook(&mut self, id: NodeId, env: FrameEnv<'_>, hook: Hook) {
        let Some(mut behavior) = self.nodes.get_mut(id).and_then(|n| n.behavior.take()) else {
            return;
        };

        {
            let mut ctx = NodeCtx { id, tree: self, env };
            match hook {
                Hook::Update => behavior.update(&mut ctx),
                Hook::Physics => behavior.physics(&mut ctx),
            }
        }

        match self.nodes.get_mut(id) {
            // A hook may have installed a replacement; keep that one.
            Some(node) if node.behavior.is_none() => node.behavior = Some(behavior),
            Some(_) => {}
            None => log::debug!("{id:?} destroyed during its {hook:?} hook"),
        }
    }

    /// Projects a container-space point (window units) into world space through
    /// the scaler and the main camera. Without a main camera the logical point is
    /// returned.
    pub fn pointer_to_world(&self, scaler: &Scaler, container_point: Vec2) -> Vec2 {
        let logical = scaler.to_logical(container_point);
        self.main_camera
            .and_then(|cam| self.screen_to_world(cam, scaler.base(), logical))
            .unwrap_or(logical)
    }
}

fn div_or_zero(a: Vec2, b: Vec2) -> Vec2 {
    let div = |n: f32, d: f32| if d == 0.0 { 0.0 } else { n / d };
    Vec2::new(div(a.x, b.x), div(a.y, b.y))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::f32::consts::FRAC_PI_2;
    use std::rc::Rc;

    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!(a.approx_eq(b, EPS), "{a:?} != {b:?}");
    }

    fn chain() -> (SceneTree, NodeId, NodeId) {
        let mut tree = SceneTree::new();
        let a = tree.spawn(tree.root(), "a").unwrap();
        let b = tree.spawn(a, "b").unwrap();
        tree.set_position(b, Vec2::new(10.0, 0.0));
        (tree, a, b)
    }

    // ── hierarchy ─────────────────────────────────────────────────────────

    #[test]
    fn spawn_attaches_under_parent() {
        let (tree, a, b) = chain();
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.children(a), &[b]);
        assert!(tree.is_attached(b));
        assert!(tree.is_ancestor(tree.root(), b));
    }

    #[test]
    fn created_nodes_start_detached() {
        let mut tree = SceneTree::new();
        let n = tree.create("loose");
        assert!(tree.contains(n));
        assert!(!tree.is_attached(n));
    }

    #[test]
    fn add_child_rejects_self_and_ancestors() {
        let (mut tree, a, b) = chain();

        assert_eq!(tree.add_child(a, a), Err(SceneError::SelfAttach(a)));
        assert_eq!(tree.add_child(b, a), Err(SceneError::Cycle { parent: b, child: a }));
        assert_eq!(tree.add_child(b, tree.root()), Err(SceneError::RootNode));

        assert_eq!(tree.parent(a), Some(tree.root()));
        assert_eq!(tree.children(a), &[b]);
        assert!(tree.children(b).is_empty());
    }

    #[test]
    fn reparent_moves_child_between_parents() {
        let (mut tree, a, b) = chain();
        let c = tree.spawn(tree.root(), "c").unwrap();

        tree.add_child(c, b).unwrap();
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(c), &[b]);
        assert_eq!(tree.parent(b), Some(c));
    }

    #[test]
    fn remove_child_ignores_strangers() {
        let (mut tree, a, b) = chain();
        let root = tree.root();
        assert_eq!(tree.remove_child(root, b), Ok(false));
        assert_eq!(tree.remove_child(a, b), Ok(true));
        assert_eq!(tree.parent(b), None);
        assert!(tree.contains(b));
    }

    #[test]
    fn destroy_is_recursive() {
        let (mut tree, a, b) = chain();
        let before = tree.len();
        tree.destroy(a).unwrap();
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert_eq!(tree.len(), before - 2);
        assert!(tree.children(tree.root()).is_empty());
        assert_eq!(tree.destroy(a), Err(SceneError::MissingNode(a)));
        assert_eq!(tree.destroy(tree.root()), Err(SceneError::RootNode));
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn grandchild_follows_parent_move() {
        let (mut tree, a, b) = chain();
        tree.set_position(a, Vec2::new(5.0, 5.0));
        assert_close(tree.global_position(b).unwrap(), Vec2::new(15.0, 5.0));
    }

    #[test]
    fn rotation_and_scale_compose_down_the_chain() {
        let (mut tree, a, b) = chain();
        tree.set_rotation(a, FRAC_PI_2);
        tree.set_scale(a, Vec2::new(2.0, 2.0));

        assert_close(tree.global_position(b).unwrap(), Vec2::new(0.0, 20.0));
        assert_close(tree.global_scale(b).unwrap(), Vec2::new(2.0, 2.0));
        assert!((tree.global_rotation(b).unwrap() - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn mutation_dirties_whole_subtree() {
        let (mut tree, a, b) = chain();
        tree.resolve_transform(b);
        assert!(!tree.node(a).unwrap().is_dirty());
        assert!(!tree.node(b).unwrap().is_dirty());

        tree.set_rotation(a, 0.5);
        assert!(tree.node(a).unwrap().is_dirty());
        assert!(tree.node(b).unwrap().is_dirty());
    }

    #[test]
    fn unchanged_position_is_a_no_op() {
        let (mut tree, a, b) = chain();
        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        tree.watch_position(a, move |_| *counter.borrow_mut() += 1);

        tree.resolve_transform(b);
        assert!(!tree.set_position(a, Vec2::ZERO));
        assert!(!tree.node(a).unwrap().is_dirty());
        assert!(!tree.node(b).unwrap().is_dirty());
        assert_eq!(*fired.borrow(), 0);

        assert!(tree.set_position(a, Vec2::new(1.0, 0.0)));
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn non_finite_writes_are_ignored() {
        let (mut tree, a, b) = chain();
        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        tree.watch_position(a, move |_| *counter.borrow_mut() += 1);
        tree.resolve_transform(b);

        let nan = Vec2::new(f32::NAN, 0.0);
        assert!(!tree.set_position(a, nan));
        assert!(!tree.set_position(a, nan));
        assert!(!tree.set_rotation(a, f32::INFINITY));
        assert!(!tree.set_scale(a, Vec2::new(1.0, f32::NAN)));

        assert!(!tree.node(b).unwrap().is_dirty());
        assert_eq!(*fired.borrow(), 0);
        assert_eq!(tree.node(a).unwrap().position(), Vec2::ZERO);
    }

    #[test]
    fn global_setters_invert_parent_transform() {
        let (mut tree, a, b) = chain();
        tree.set_position(a, Vec2::new(100.0, 0.0));
        tree.set_rotation(a, FRAC_PI_2);
        tree.set_scale(a, Vec2::new(2.0, 2.0));

        tree.set_global_position(b, Vec2::new(100.0, 50.0));
        assert_close(tree.global_position(b).unwrap(), Vec2::new(100.0, 50.0));
        assert_close(tree.node(b).unwrap().position(), Vec2::new(25.0, 0.0));

        tree.set_global_rotation(b, 0.0);
        assert!(tree.global_rotation(b).unwrap().abs() < EPS);

        tree.set_global_scale(b, Vec2::new(1.0, 1.0));
        assert_close(tree.global_scale(b).unwrap(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn local_global_round_trip() {
        let (mut tree, a, b) = chain();
        tree.set_position(a, Vec2::new(-3.0, 7.0));
        tree.set_rotation(a, 0.4);
        tree.set_scale(b, Vec2::new(1.5, 0.5));

        let v = Vec2::new(4.0, -9.0);
        let there = tree.local_to_global_position(b, v).unwrap();
        assert_close(tree.global_to_local_position(b, there).unwrap(), v);

        let r = tree.local_to_global_rotation(b, 0.25).unwrap();
        assert!((tree.global_to_local_rotation(b, r).unwrap() - 0.25).abs() < EPS);

        let s = tree.local_to_global_scale(b, Vec2::new(2.0, 3.0)).unwrap();
        assert_close(tree.global_to_local_scale(b, s).unwrap(), Vec2::new(2.0, 3.0));
    }

    #[test]
    fn reparent_is_reflected_without_refresh() {
        let (mut tree, a, b) = chain();
        let c = tree.spawn(tree.root(), "c").unwrap();
        tree.set_position(c, Vec2::new(0.0, 100.0));
        tree.resolve_transform(b);

        tree.add_child(c, a).unwrap();
        assert!(tree.node(b).unwrap().is_dirty());
        assert_close(tree.global_position(b).unwrap(), Vec2::new(10.0, 100.0));
    }

    #[test]
    fn zero_parent_scale_does_not_produce_nan() {
        let (mut tree, a, b) = chain();
        tree.set_scale(a, Vec2::ZERO);
        tree.set_global_scale(b, Vec2::new(3.0, 3.0));
        assert_eq!(tree.node(b).unwrap().scale(), Vec2::ZERO);
        assert!(tree.global_position(b).unwrap().is_finite());
    }
}
