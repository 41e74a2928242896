/// Keyboard key identifier.
///
/// Covers the keys games commonly bind. The runtime maps physical key codes onto
/// these; anything else arrives as `Unknown` with the platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Unknown(u32),
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Press/release transition shared by keys and buttons.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ElementState {
    Pressed,
    Released,
}

/// Modifier keys held at the time of an event.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Four keys forming a directional pad (e.g. arrows or WASD).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DirectionKeys {
    pub left: Key,
    pub right: Key,
    pub up: Key,
    pub down: Key,
}

impl DirectionKeys {
    pub const ARROWS: DirectionKeys = DirectionKeys {
        left: Key::ArrowLeft,
        right: Key::ArrowRight,
        up: Key::ArrowUp,
        down: Key::ArrowDown,
    };

    pub const WASD: DirectionKeys = DirectionKeys {
        left: Key::A,
        right: Key::D,
        up: Key::W,
        down: Key::S,
    };
}
