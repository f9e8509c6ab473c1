use std::fmt;

use bitflags::bitflags;

/// Keyboard key identifier.
///
/// Platform key codes are mapped into these variants where possible. Keys
/// without a variant use `Key::Unknown(u32)` with the platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
    Menu,

    Shift,
    Control,
    Alt,
    /// Left super/command key.
    Meta,
    /// Right super/command key.
    MetaRight,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Punctuation
    Minus, Equal, Comma, Period, Slash, Semicolon, Quote,
    BracketLeft, BracketRight, Backslash, Backquote,

    // Keypad
    Keypad0, Keypad1, Keypad2, Keypad3, Keypad4,
    Keypad5, Keypad6, Keypad7, Keypad8, Keypad9,
    KeypadPeriod, KeypadDivide, KeypadMultiply, KeypadMinus, KeypadPlus,
    KeypadEnter, KeypadEquals,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8,
    F9, F10, F11, F12, F13, F14, F15,

    /// Platform-dependent key not yet represented here.
    Unknown(u32),
}

impl Key {
    /// Digit value of a top-row or keypad digit key.
    pub fn digit(self) -> Option<u8> {
        use Key::*;
        Some(match self {
            Digit0 | Keypad0 => 0,
            Digit1 | Keypad1 => 1,
            Digit2 | Keypad2 => 2,
            Digit3 | Keypad3 => 3,
            Digit4 | Keypad4 => 4,
            Digit5 | Keypad5 => 5,
            Digit6 | Keypad6 => 6,
            Digit7 | Keypad7 => 7,
            Digit8 | Keypad8 => 8,
            Digit9 | Keypad9 => 9,
            _ => return None,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    X1,
    X2,
}

impl MouseButton {
    /// Engine button index: left 0, middle 1, right 2, X1 3, X2 4.
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::X1 => 3,
            MouseButton::X2 => 4,
        }
    }

    #[inline]
    pub fn mask(self) -> ButtonMask {
        ButtonMask::from_bits_truncate(1 << self.index())
    }
}

bitflags! {
    /// Held mouse buttons. Bit `i` is the button with [`MouseButton::index`] `i`.
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ButtonMask: u8 {
        const LEFT = 1 << 0;
        const MIDDLE = 1 << 1;
        const RIGHT = 1 << 2;
        const X1 = 1 << 3;
        const X2 = 1 << 4;
    }
}

/// Modifier keys state.
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

/// Key description carried by key events.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeySym {
    pub key: Key,
    pub modifiers: Modifiers,
    /// First character the key produced, or 0.
    pub unicode: u32,
    /// Platform scan code when available.
    pub scancode: u32,
}

/// Mouse wheel delta.
///
/// `Line` corresponds to "scroll lines" style input; `Pixel` is high precision.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    Pixel { x: f32, y: f32 },
}

/// Platform-agnostic input event.
///
/// Positions are in physical pixels relative to the surface's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseMotion {
        x: f32,
        y: f32,
        /// Motion since the previous motion event.
        xrel: f32,
        yrel: f32,
        buttons: ButtonMask,
    },
    MouseButtonDown { button: MouseButton, x: f32, y: f32 },
    MouseButtonUp { button: MouseButton, x: f32, y: f32 },
    MouseButtonClick { button: MouseButton, x: f32, y: f32, clicks: u8 },
    MouseScroll2D { delta: MouseWheelDelta },

    KeyDown(KeySym),
    KeyUp(KeySym),
    KeyRepeat(KeySym),
    CharInput(char),

    Focus { has_focus: bool },
    /// Files were dropped at `(x, y)`; the widget holds the file list.
    FileDrop { x: f32, y: f32 },
    Quit,
}

impl InputEvent {
    /// The key symbol of key events.
    pub fn key_sym(&self) -> Option<&KeySym> {
        match self {
            InputEvent::KeyDown(k) | InputEvent::KeyUp(k) | InputEvent::KeyRepeat(k) => Some(k),
            _ => None,
        }
    }
}

/// Joystick snapshot. Axes are in `[-1, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoystickState {
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
}
