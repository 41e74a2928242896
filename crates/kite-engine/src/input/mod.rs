//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! `platform` translates winit window events into `InputEvent`s.

mod event;
mod frame;
mod key;
pub(crate) mod platform;
mod state;

pub use event::{InputEvent, WheelDelta};
pub use frame::InputFrame;
pub use key::{DirectionKeys, ElementState, Key, Modifiers, MouseButton};
pub use state::InputState;
