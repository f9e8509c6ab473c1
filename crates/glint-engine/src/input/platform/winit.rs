use std::path::PathBuf;

use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use crate::input::{
    ButtonMask, EventQueue, InputEvent, Key, KeySym, Modifiers, MouseButton, MouseWheelDelta,
};

/// Translates winit window events for one surface into [`InputEvent`]s.
///
/// Tracks what winit reports only incrementally: cursor position, held
/// buttons, modifiers, focus and the most recent dropped-file batch.
#[derive(Debug, Default)]
pub struct EventTranslator {
    cursor: (f32, f32),
    prev_motion: (f32, f32),
    buttons: ButtonMask,
    modifiers: Modifiers,
    focused: bool,
    hovered: bool,
    dropped: Vec<PathBuf>,
    in_drop: bool,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates `event`, pushing zero or more events onto `out`.
    pub fn translate(&mut self, event: &WindowEvent, out: &mut EventQueue) {
        if !matches!(event, WindowEvent::DroppedFile(_)) {
            self.in_drop = false;
        }
        match event {
            WindowEvent::ModifiersChanged(m) => self.modifiers = map_modifiers(m.state()),

            WindowEvent::Focused(f) => self.focused = *f,

            WindowEvent::CursorEntered { .. } => self.hovered = true,
            WindowEvent::CursorLeft { .. } => self.hovered = false,

            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_moved(position.x as f32, position.y as f32, out);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = map_mouse_button(*button) else { return };
                match state {
                    ElementState::Pressed => self.mouse_pressed(button, out),
                    ElementState::Released => self.mouse_released(button, out),
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x: *x, y: *y },
                    MouseScrollDelta::PixelDelta(p) => {
                        MouseWheelDelta::Pixel { x: p.x as f32, y: p.y as f32 }
                    }
                };
                out.push(InputEvent::MouseScroll2D { delta });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let (key, scancode) = map_key(event.physical_key);
                let pressed = event.state == ElementState::Pressed;
                self.key(key, scancode, pressed, event.repeat, event.text.as_deref(), out);
            }

            WindowEvent::DroppedFile(path) => self.file_dropped(path.clone(), out),

            WindowEvent::CloseRequested => out.push(InputEvent::Quit),

            _ => {}
        }
    }

    pub(crate) fn mouse_moved(&mut self, x: f32, y: f32, out: &mut EventQueue) {
        self.cursor = (x, y);
        let (px, py) = self.prev_motion;
        self.prev_motion = (x, y);
        out.push(InputEvent::MouseMotion {
            x,
            y,
            xrel: x - px,
            yrel: y - py,
            buttons: self.buttons,
        });
    }

    pub(crate) fn mouse_pressed(&mut self, button: MouseButton, out: &mut EventQueue) {
        self.buttons |= button.mask();
        let (x, y) = self.cursor;
        out.push(InputEvent::MouseButtonDown { button, x, y });
    }

    /// Emits the release followed by a single click.
    pub(crate) fn mouse_released(&mut self, button: MouseButton, out: &mut EventQueue) {
        self.buttons.remove(button.mask());
        let (x, y) = self.cursor;
        out.push(InputEvent::MouseButtonUp { button, x, y });
        out.push(InputEvent::MouseButtonClick { button, x, y, clicks: 1 });
    }

    pub(crate) fn key(
        &mut self,
        key: Key,
        scancode: u32,
        pressed: bool,
        repeat: bool,
        text: Option<&str>,
        out: &mut EventQueue,
    ) {
        let ch = text.and_then(|t| t.chars().next());
        let sym = KeySym {
            key,
            modifiers: self.modifiers,
            unicode: ch.map_or(0, u32::from),
            scancode,
        };

        if pressed {
            out.push(if repeat { InputEvent::KeyRepeat(sym) } else { InputEvent::KeyDown(sym) });
            if let Some(c) = ch.filter(|c| c.is_ascii_graphic()) {
                out.push(InputEvent::CharInput(c));
            }
        } else if !repeat {
            out.push(InputEvent::KeyUp(sym));
        }
    }

    /// winit reports one event per file; consecutive files form one drop.
    pub(crate) fn file_dropped(&mut self, path: PathBuf, out: &mut EventQueue) {
        if !self.in_drop {
            self.in_drop = true;
            self.dropped.clear();
            let (x, y) = self.cursor;
            out.push(InputEvent::FileDrop { x, y });
        }
        self.dropped.push(path);
    }

    /// Files of the most recent drop.
    pub fn dropped_files(&self) -> &[PathBuf] {
        &self.dropped
    }

    /// Last cursor position and the held buttons. Buttons read as none while
    /// the cursor is outside the surface.
    pub fn relative_mouse_state(&self) -> ((f32, f32), ButtonMask) {
        let buttons = if self.hovered { self.buttons } else { ButtonMask::empty() };
        (self.cursor, buttons)
    }

    #[inline]
    pub fn has_focus(&self) -> bool {
        self.focused
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> Option<MouseButton> {
    match b {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Right => Some(MouseButton::Right),
        WinitMouseButton::Middle => Some(MouseButton::Middle),
        WinitMouseButton::Back => Some(MouseButton::X1),
        WinitMouseButton::Forward => Some(MouseButton::X2),
        WinitMouseButton::Other(_) => None,
    }
}

fn map_key(pk: PhysicalKey) -> (Key, u32) {
    match pk {
        PhysicalKey::Code(code) => (map_key_code(code), code as u32),
        PhysicalKey::Unidentified(_) => (Key::Unknown(0), 0),
    }
}

fn map_key_code(code: KeyCode) -> Key {
    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::CapsLock => Key::CapsLock,
        KeyCode::ScrollLock => Key::ScrollLock,
        KeyCode::NumLock => Key::NumLock,
        KeyCode::PrintScreen => Key::PrintScreen,
        KeyCode::Pause => Key::Pause,
        KeyCode::ContextMenu => Key::Menu,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft => Key::Meta,
        KeyCode::SuperRight => Key::MetaRight,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 => Key::Digit0,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6,
        KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8,
        KeyCode::Digit9 => Key::Digit9,

        KeyCode::Minus => Key::Minus,
        KeyCode::Equal => Key::Equal,
        KeyCode::Comma => Key::Comma,
        KeyCode::Period => Key::Period,
        KeyCode::Slash => Key::Slash,
        KeyCode::Semicolon => Key::Semicolon,
        KeyCode::Quote => Key::Quote,
        KeyCode::BracketLeft => Key::BracketLeft,
        KeyCode::BracketRight => Key::BracketRight,
        KeyCode::Backslash => Key::Backslash,
        KeyCode::Backquote => Key::Backquote,

        KeyCode::Numpad0 => Key::Keypad0,
        KeyCode::Numpad1 => Key::Keypad1,
        KeyCode::Numpad2 => Key::Keypad2,
        KeyCode::Numpad3 => Key::Keypad3,
        KeyCode::Numpad4 => Key::Keypad4,
        KeyCode::Numpad5 => Key::Keypad5,
        KeyCode::Numpad6 => Key::Keypad6,
        KeyCode::Numpad7 => Key::Keypad7,
        KeyCode::Numpad8 => Key::Keypad8,
        KeyCode::Numpad9 => Key::Keypad9,
        KeyCode::NumpadDecimal => Key::KeypadPeriod,
        KeyCode::NumpadDivide => Key::KeypadDivide,
        KeyCode::NumpadMultiply => Key::KeypadMultiply,
        KeyCode::NumpadSubtract => Key::KeypadMinus,
        KeyCode::NumpadAdd => Key::KeypadPlus,
        KeyCode::NumpadEnter => Key::KeypadEnter,
        KeyCode::NumpadEqual => Key::KeypadEquals,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,
        KeyCode::F13 => Key::F13,
        KeyCode::F14 => Key::F14,
        KeyCode::F15 => Key::F15,

        other => Key::Unknown(other as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(q: &mut EventQueue) -> Vec<InputEvent> {
        std::iter::from_fn(|| q.pop()).collect()
    }

    // ── mouse ─────────────────────────────────────────────────────────────

    #[test]
    fn motion_carries_relative_delta_and_buttons() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.mouse_moved(10.0, 20.0, &mut q);
        t.mouse_pressed(MouseButton::Left, &mut q);
        t.mouse_moved(13.0, 16.0, &mut q);
        let events = drain(&mut q);
        assert_eq!(
            events[2],
            InputEvent::MouseMotion { x: 13.0, y: 16.0, xrel: 3.0, yrel: -4.0, buttons: ButtonMask::LEFT }
        );
    }

    #[test]
    fn release_emits_up_then_single_click() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.mouse_moved(5.0, 6.0, &mut q);
        t.mouse_pressed(MouseButton::Right, &mut q);
        t.mouse_released(MouseButton::Right, &mut q);
        let events = drain(&mut q);
        assert_eq!(
            &events[1..],
            &[
                InputEvent::MouseButtonDown { button: MouseButton::Right, x: 5.0, y: 6.0 },
                InputEvent::MouseButtonUp { button: MouseButton::Right, x: 5.0, y: 6.0 },
                InputEvent::MouseButtonClick { button: MouseButton::Right, x: 5.0, y: 6.0, clicks: 1 },
            ]
        );
    }

    #[test]
    fn held_buttons_hidden_outside_surface() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.mouse_pressed(MouseButton::Middle, &mut q);
        assert_eq!(t.relative_mouse_state().1, ButtonMask::empty());
        t.hovered = true;
        assert_eq!(t.relative_mouse_state().1, ButtonMask::MIDDLE);
    }

    // ── keyboard ──────────────────────────────────────────────────────────

    #[test]
    fn printable_key_emits_char_input() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.key(Key::A, 0, true, false, Some("a"), &mut q);
        let events = drain(&mut q);
        assert!(matches!(events[0], InputEvent::KeyDown(KeySym { key: Key::A, unicode: 97, .. })));
        assert_eq!(events[1], InputEvent::CharInput('a'));
    }

    #[test]
    fn space_and_control_keys_emit_no_char() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.key(Key::Space, 0, true, false, Some(" "), &mut q);
        t.key(Key::Enter, 0, true, false, Some("\r"), &mut q);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn auto_repeat_press_and_release() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.key(Key::Digit1, 0, true, true, Some("1"), &mut q);
        t.key(Key::Digit1, 0, false, true, None, &mut q);
        t.key(Key::Digit1, 0, false, false, None, &mut q);
        let events = drain(&mut q);
        assert!(matches!(events[0], InputEvent::KeyRepeat(_)));
        assert_eq!(events[1], InputEvent::CharInput('1'));
        assert!(matches!(events[2], InputEvent::KeyUp(_)));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn key_carries_modifiers() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.translate(&WindowEvent::ModifiersChanged(ModifiersState::SHIFT.into()), &mut q);
        t.key(Key::B, 0, true, false, Some("B"), &mut q);
        let ev = q.pop().unwrap();
        assert!(ev.key_sym().unwrap().modifiers.shift);
    }

    // ── window ────────────────────────────────────────────────────────────

    #[test]
    fn multi_file_drop_is_one_event() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.mouse_moved(7.0, 8.0, &mut q);
        q.clear();
        t.translate(&WindowEvent::DroppedFile("a.obj".into()), &mut q);
        t.translate(&WindowEvent::DroppedFile("b.png".into()), &mut q);
        assert_eq!(drain(&mut q), vec![InputEvent::FileDrop { x: 7.0, y: 8.0 }]);
        assert_eq!(t.dropped_files().len(), 2);

        t.translate(&WindowEvent::Focused(true), &mut q);
        t.translate(&WindowEvent::DroppedFile("c.obj".into()), &mut q);
        assert_eq!(t.dropped_files(), &[PathBuf::from("c.obj")]);
    }

    #[test]
    fn close_requests_quit_and_focus_is_tracked() {
        let mut t = EventTranslator::new();
        let mut q = EventQueue::default();
        t.translate(&WindowEvent::Focused(true), &mut q);
        assert!(t.has_focus());
        assert!(q.is_empty());
        t.translate(&WindowEvent::CloseRequested, &mut q);
        assert_eq!(q.pop(), Some(InputEvent::Quit));
    }

    #[test]
    fn key_codes_map() {
        assert_eq!(map_key_code(KeyCode::Numpad5), Key::Keypad5);
        assert_eq!(map_key_code(KeyCode::F15), Key::F15);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)).0, Key::Escape);
    }
}
