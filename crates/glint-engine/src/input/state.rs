use std::collections::HashSet;

use super::types::{ButtonMask, InputEvent, Key, Modifiers, MouseButton};

/// Polled input state built from the events delivered to an app.
///
/// Held keys and buttons persist across ticks. The pressed/released sets hold
/// the transitions seen since the last [`begin_tick`](Self::begin_tick).
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    pub pointer_pos: (f32, f32),
    pub buttons: ButtonMask,

    pub keys_down: HashSet<Key>,
    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,
    pub buttons_pressed: HashSet<MouseButton>,
    pub buttons_released: HashSet<MouseButton>,
}

impl InputState {
    /// Clears the per-tick transition sets.
    pub fn begin_tick(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
    }

    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::Focus { has_focus } => {
                self.focused = *has_focus;
                if !*has_focus {
                    // Avoid stuck keys when focus changes mid-press.
                    self.keys_down.clear();
                    self.buttons = ButtonMask::empty();
                }
            }

            InputEvent::MouseMotion { x, y, buttons, .. } => {
                self.pointer_pos = (*x, *y);
                self.buttons = *buttons;
            }

            InputEvent::MouseButtonDown { button, x, y } => {
                self.pointer_pos = (*x, *y);
                if !self.buttons.contains(button.mask()) {
                    self.buttons |= button.mask();
                    self.buttons_pressed.insert(*button);
                }
            }

            InputEvent::MouseButtonUp { button, x, y } => {
                self.pointer_pos = (*x, *y);
                if self.buttons.contains(button.mask()) {
                    self.buttons.remove(button.mask());
                    self.buttons_released.insert(*button);
                }
            }

            InputEvent::KeyDown(sym) => {
                self.modifiers = sym.modifiers;
                if self.keys_down.insert(sym.key) {
                    self.keys_pressed.insert(sym.key);
                }
            }

            InputEvent::KeyUp(sym) => {
                self.modifiers = sym.modifiers;
                if self.keys_down.remove(&sym.key) {
                    self.keys_released.insert(sym.key);
                }
            }

            _ => {}
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(button.mask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::types::KeySym;

    fn sym(key: Key) -> KeySym {
        KeySym { key, modifiers: Modifiers::default(), unicode: 0, scancode: 0 }
    }

    #[test]
    fn key_transitions_are_per_tick() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::KeyDown(sym(Key::W)));
        assert!(s.key_down(Key::W));
        assert!(s.key_pressed(Key::W));

        s.begin_tick();
        assert!(s.key_down(Key::W));
        assert!(!s.key_pressed(Key::W));

        s.apply_event(&InputEvent::KeyUp(sym(Key::W)));
        assert!(!s.key_down(Key::W));
        assert!(s.keys_released.contains(&Key::W));
    }

    #[test]
    fn buttons_track_mask() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::MouseButtonDown { button: MouseButton::Right, x: 1.0, y: 2.0 });
        assert!(s.button_down(MouseButton::Right));
        assert_eq!(s.pointer_pos, (1.0, 2.0));
        s.apply_event(&InputEvent::MouseButtonUp { button: MouseButton::Right, x: 1.0, y: 2.0 });
        assert!(s.buttons.is_empty());
        assert!(s.buttons_released.contains(&MouseButton::Right));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::KeyDown(sym(Key::A)));
        s.apply_event(&InputEvent::MouseButtonDown { button: MouseButton::Left, x: 0.0, y: 0.0 });
        s.apply_event(&InputEvent::Focus { has_focus: false });
        assert!(s.keys_down.is_empty());
        assert!(s.buttons.is_empty());
    }
}
