use crate::coords::Vec2;

use super::{ElementState, Key, Modifiers, MouseButton};

/// Mouse wheel delta; `Line` for notched wheels, `Pixel` for precise touchpads.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum WheelDelta {
    Line(Vec2),
    Pixel(Vec2),
}

impl WheelDelta {
    /// Approximate delta in lines, treating `PIXELS_PER_LINE` pixels as one line.
    pub fn lines(self) -> Vec2 {
        const PIXELS_PER_LINE: f32 = 40.0;
        match self {
            WheelDelta::Line(v) => v,
            WheelDelta::Pixel(v) => v / PIXELS_PER_LINE,
        }
    }
}

/// Platform-agnostic input event. Positions are in container (window) units.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    ModifiersChanged(Modifiers),

    Key {
        key: Key,
        state: ElementState,
        modifiers: Modifiers,
        /// True for auto-repeat presses.
        repeat: bool,
    },

    PointerMoved(Vec2),

    PointerButton {
        button: MouseButton,
        state: ElementState,
        position: Vec2,
    },

    Wheel(WheelDelta),

    /// Pointer left the window surface.
    PointerLeft,

    /// Window focus change.
    Focused(bool),
}
