use std::collections::HashSet;

use crate::coords::Vec2;

use super::event::InputEvent;
use super::key::{DirectionKeys, Key, MouseButton};
use super::state::InputState;

/// Frame-stable input snapshot.
///
/// [`begin`](Self::begin) copies the live [`InputState`] once per frame and keeps
/// the previous frame's copy, so edge queries ("just pressed") are computed by
/// diffing the two down-sets. Every consumer in a frame sees the same answers.
#[derive(Debug, Default)]
pub struct InputFrame {
    events: Vec<InputEvent>,

    keys_down: HashSet<Key>,
    prev_keys_down: HashSet<Key>,

    buttons_down: HashSet<MouseButton>,
    prev_buttons_down: HashSet<MouseButton>,

    pointer: Option<Vec2>,
    wheel: Vec2,
}

impl InputFrame {
    /// Queues a raw event for the upcoming frame.
    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    /// Captures `state` as the current frame, demoting the last capture to "previous".
    pub fn begin(&mut self, state: &InputState) {
        std::mem::swap(&mut self.prev_keys_down, &mut self.keys_down);
        self.keys_down.clone_from(&state.keys_down);

        std::mem::swap(&mut self.prev_buttons_down, &mut self.buttons_down);
        self.buttons_down.clone_from(&state.buttons_down);

        self.pointer = state.pointer;
        self.wheel = self
            .events
            .iter()
            .filter_map(|ev| match ev {
                InputEvent::Wheel(d) => Some(d.lines()),
                _ => None,
            })
            .fold(Vec2::ZERO, |acc, d| acc + d);
    }

    /// Drops this frame's raw events. Call after the frame is consumed.
    pub fn end(&mut self) {
        self.events.clear();
        self.wheel = Vec2::ZERO;
    }

    /// Raw events received since the previous frame, in arrival order.
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    // ── keys ──────────────────────────────────────────────────────────────

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Down this frame, up the previous one.
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_down.contains(&key) && !self.prev_keys_down.contains(&key)
    }

    /// Up this frame, down the previous one.
    pub fn key_released(&self, key: Key) -> bool {
        !self.keys_down.contains(&key) && self.prev_keys_down.contains(&key)
    }

    // ── buttons ───────────────────────────────────────────────────────────

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }

    pub fn button_pressed(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn) && !self.prev_buttons_down.contains(&btn)
    }

    pub fn button_released(&self, btn: MouseButton) -> bool {
        !self.buttons_down.contains(&btn) && self.prev_buttons_down.contains(&btn)
    }

    // ── pointer ───────────────────────────────────────────────────────────

    /// Pointer position in container units.
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Wheel movement accumulated this frame, in lines.
    pub fn wheel(&self) -> Vec2 {
        self.wheel
    }

    // ── axes ──────────────────────────────────────────────────────────────

    /// `-1`, `0` or `1` depending on which of the two keys is held.
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        let mut v = 0.0;
        if self.key_down(negative) {
            v -= 1.0;
        }
        if self.key_down(positive) {
            v += 1.0;
        }
        v
    }

    /// Direction from four keys, normalized so diagonals are not faster.
    pub fn vector(&self, keys: DirectionKeys) -> Vec2 {
        Vec2::new(self.axis(keys.left, keys.right), self.axis(keys.up, keys.down)).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ElementState, Modifiers, WheelDelta};

    fn held(keys: &[Key]) -> InputState {
        InputState {
            keys_down: keys.iter().copied().collect(),
            ..Default::default()
        }
    }

    // ── edges ─────────────────────────────────────────────────────────────

    #[test]
    fn pressed_is_true_for_one_frame() {
        let mut frame = InputFrame::default();

        frame.begin(&held(&[Key::Space]));
        assert!(frame.key_pressed(Key::Space));
        assert!(frame.key_down(Key::Space));

        frame.begin(&held(&[Key::Space]));
        assert!(!frame.key_pressed(Key::Space));
        assert!(frame.key_down(Key::Space));
    }

    #[test]
    fn released_follows_release() {
        let mut frame = InputFrame::default();
        frame.begin(&held(&[Key::Z]));
        frame.begin(&held(&[]));
        assert!(frame.key_released(Key::Z));
        assert!(!frame.key_down(Key::Z));

        frame.begin(&held(&[]));
        assert!(!frame.key_released(Key::Z));
    }

    #[test]
    fn button_edges() {
        let mut frame = InputFrame::default();
        let mut state = InputState::default();
        state.buttons_down.insert(MouseButton::Left);

        frame.begin(&state);
        assert!(frame.button_pressed(MouseButton::Left));

        state.buttons_down.clear();
        frame.begin(&state);
        assert!(frame.button_released(MouseButton::Left));
    }

    // ── axes ──────────────────────────────────────────────────────────────

    #[test]
    fn opposing_keys_cancel() {
        let mut frame = InputFrame::default();
        frame.begin(&held(&[Key::ArrowLeft, Key::ArrowRight]));
        assert_eq!(frame.axis(Key::ArrowLeft, Key::ArrowRight), 0.0);
    }

    #[test]
    fn diagonal_vector_is_normalized() {
        let mut frame = InputFrame::default();
        frame.begin(&held(&[Key::D, Key::S]));
        let v = frame.vector(DirectionKeys::WASD);
        assert!((v.length() - 1.0).abs() < 1e-5);
        assert!(v.x > 0.0 && v.y > 0.0);
    }

    #[test]
    fn idle_vector_is_zero() {
        let mut frame = InputFrame::default();
        frame.begin(&held(&[]));
        assert_eq!(frame.vector(DirectionKeys::ARROWS), Vec2::ZERO);
    }

    // ── events ────────────────────────────────────────────────────────────

    #[test]
    fn wheel_accumulates_until_end() {
        let mut frame = InputFrame::default();
        frame.push_event(InputEvent::Wheel(WheelDelta::Line(Vec2::new(0.0, 1.0))));
        frame.push_event(InputEvent::Wheel(WheelDelta::Pixel(Vec2::new(0.0, 40.0))));
        frame.push_event(InputEvent::Key {
            key: Key::A,
            state: ElementState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        });

        frame.begin(&InputState::default());
        assert_eq!(frame.wheel(), Vec2::new(0.0, 2.0));
        assert_eq!(frame.events().len(), 3);

        frame.end();
        assert!(frame.events().is_empty());
        assert_eq!(frame.wheel(), Vec2::ZERO);
    }
}
