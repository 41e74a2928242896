//! Kite scene crate.
//!
//! A 2D scene graph on top of `kite-engine`: nodes with lazily cached
//! transforms, cameras with smoothing and bounds, and the [`Stage`] that drives
//! update, physics and rendering every frame.

pub mod camera;
pub mod error;
pub mod node;
pub mod stage;
pub mod tree;

pub use camera::Camera;
pub use error::{Result, SceneError};
pub use node::{Behavior, FrameEnv, Node, NodeCtx, NodeId, NodeView};
pub use stage::{Stage, StageConfig};
pub use tree::SceneTree;
