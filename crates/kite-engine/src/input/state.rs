use std::collections::HashSet;

use crate::coords::Vec2;

use super::event::InputEvent;
use super::frame::InputFrame;
use super::key::{ElementState, Key, Modifiers, MouseButton};

/// Live input state for a window, updated as platform events arrive.
///
/// Holds what is held down *right now*. Frame-stable queries (edges, axes) go
/// through the [`InputFrame`] snapshot taken at the start of each frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,

    pub focused: bool,

    /// Pointer position in container units; `None` while outside the window.
    pub pointer: Option<Vec2>,

    pub keys_down: HashSet<Key>,

    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies `ev` to the live state and queues it on `frame` for this frame's consumers.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Releases are not delivered while unfocused; drop held sets.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(p) => {
                self.pointer = Some(*p);
            }

            InputEvent::PointerLeft => {
                self.pointer = None;
            }

            InputEvent::Key {
                key,
                state,
                modifiers,
                ..
            } => {
                self.modifiers = *modifiers;
                match state {
                    ElementState::Pressed => {
                        self.keys_down.insert(*key);
                    }
                    ElementState::Released => {
                        self.keys_down.remove(key);
                    }
                }
            }

            InputEvent::PointerButton {
                button,
                state,
                position,
            } => {
                self.pointer = Some(*position);
                match state {
                    ElementState::Pressed => {
                        self.buttons_down.insert(*button);
                    }
                    ElementState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }

            InputEvent::Wheel(_) => {}
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: ElementState) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            modifiers: Modifiers::default(),
            repeat: false,
        }
    }

    #[test]
    fn press_and_release_track_held_keys() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::A, ElementState::Pressed));
        assert!(state.key_down(Key::A));

        state.apply_event(&mut frame, key(Key::A, ElementState::Released));
        assert!(!state.key_down(Key::A));
        assert_eq!(frame.events().len(), 2);
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::Space, ElementState::Pressed));
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                position: Vec2::new(4.0, 5.0),
            },
        );
        state.apply_event(&mut frame, InputEvent::Focused(false));

        assert!(state.keys_down.is_empty());
        assert!(state.buttons_down.is_empty());
        assert_eq!(state.pointer, Some(Vec2::new(4.0, 5.0)));
    }

    #[test]
    fn pointer_left_clears_position() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved(Vec2::new(1.0, 2.0)));
        state.apply_event(&mut frame, InputEvent::PointerLeft);
        assert_eq!(state.pointer, None);
    }
}
