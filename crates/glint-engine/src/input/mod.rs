//! Input subsystem.
//!
//! Public types are platform-agnostic. [`EventTranslator`] turns winit window
//! events into [`InputEvent`]s on an [`EventQueue`] that the loop controller
//! drains once per tick.

mod joystick;
mod platform;
mod queue;
mod state;
mod types;

pub use joystick::Joysticks;
pub use platform::EventTranslator;
pub use queue::EventQueue;
pub use state::InputState;
pub use types::{
    ButtonMask, InputEvent, JoystickState, Key, KeySym, Modifiers, MouseButton, MouseWheelDelta,
};
