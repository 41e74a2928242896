//! GPU rendering subsystem.
//!
//! Renderers consume a recorded [`DrawList`](crate::draw::DrawList) and issue GPU
//! commands via wgpu. Each renderer owns its GPU resources (pipelines, buffers,
//! textures).
//!
//! Convention:
//! - CPU geometry is in physical pixels (top-left origin, +Y down).
//! - The vertex shader converts to NDC using a target-size uniform.

mod ctx;
mod quad;

pub use ctx::{RenderCtx, RenderTarget};
pub use quad::QuadRenderer;
