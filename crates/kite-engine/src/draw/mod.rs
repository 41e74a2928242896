//! CPU-side drawing surface.
//!
//! Responsibilities:
//! - keep a current transform with save/restore semantics (`Canvas`)
//! - flatten primitives into transformed quads in paint order (`DrawList`)
//! - provide the layer/sequence ordering key used by render queues
//!
//! GPU submission lives in `render`.

mod canvas;
mod list;
mod order;

pub use canvas::Canvas;
pub use list::{DrawList, Quad, FULL_UV};
pub use order::{DrawOrder, ZIndex};
