//! Joystick snapshots.
//!
//! Backed by `gilrs` with the `gamepad` feature; without it no joysticks are
//! ever reported.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, GamepadId, Gilrs};

use super::types::JoystickState;

#[cfg(feature = "gamepad")]
const AXES: [Axis; 8] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::LeftZ,
    Axis::RightZ,
    Axis::DPadX,
    Axis::DPadY,
];

#[cfg(feature = "gamepad")]
const BUTTONS: [Button; 19] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::C,
    Button::Z,
    Button::LeftTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

/// Open joysticks, indexed in connection order.
#[derive(Default)]
pub struct Joysticks {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
    #[cfg(feature = "gamepad")]
    ids: Vec<GamepadId>,
}

impl Joysticks {
    /// Opens the joystick backend. Failure leaves zero joysticks.
    #[cfg(feature = "gamepad")]
    pub fn open() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                log::warn!("joystick support unavailable: {e}");
                None
            }
        };
        let mut joysticks = Self { gilrs, ids: Vec::new() };
        joysticks.refresh_ids();
        log::info!("{} joystick(s) connected", joysticks.count());
        joysticks
    }

    #[cfg(not(feature = "gamepad"))]
    pub fn open() -> Self {
        log::debug!("built without gamepad support; no joysticks");
        Self::default()
    }

    /// Processes pending backend events. Call once per tick.
    pub fn poll(&mut self) {
        #[cfg(feature = "gamepad")]
        {
            let mut changed = false;
            if let Some(gilrs) = self.gilrs.as_mut() {
                while let Some(event) = gilrs.next_event() {
                    match event.event {
                        gilrs::EventType::Connected => {
                            log::info!("joystick {} connected", event.id);
                            changed = true;
                        }
                        gilrs::EventType::Disconnected => {
                            log::info!("joystick {} disconnected", event.id);
                            changed = true;
                        }
                        _ => {}
                    }
                }
            }
            if changed {
                self.refresh_ids();
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn refresh_ids(&mut self) {
        self.ids = self
            .gilrs
            .as_ref()
            .map(|g| g.gamepads().filter(|(_, pad)| pad.is_connected()).map(|(id, _)| id).collect())
            .unwrap_or_default();
    }

    pub fn count(&self) -> usize {
        #[cfg(feature = "gamepad")]
        {
            self.ids.len()
        }
        #[cfg(not(feature = "gamepad"))]
        {
            0
        }
    }

    pub fn name(&self, index: usize) -> Option<String> {
        #[cfg(feature = "gamepad")]
        {
            let id = *self.ids.get(index)?;
            let gilrs = self.gilrs.as_ref()?;
            Some(gilrs.gamepad(id).name().to_string())
        }
        #[cfg(not(feature = "gamepad"))]
        {
            let _ = index;
            None
        }
    }

    /// Axis values in `[-1, 1]` and button states of joystick `index`.
    pub fn state(&self, index: usize) -> Option<JoystickState> {
        #[cfg(feature = "gamepad")]
        {
            let id = *self.ids.get(index)?;
            let pad = self.gilrs.as_ref()?.gamepad(id);
            Some(JoystickState {
                axes: AXES.iter().map(|a| pad.value(*a).clamp(-1.0, 1.0)).collect(),
                buttons: BUTTONS.iter().map(|b| pad.is_pressed(*b)).collect(),
            })
        }
        #[cfg(not(feature = "gamepad"))]
        {
            let _ = index;
            None
        }
    }

    /// Releases the backend.
    pub fn close(&mut self) {
        #[cfg(feature = "gamepad")]
        {
            self.ids.clear();
            self.gilrs = None;
        }
    }
}

#[cfg(all(test, not(feature = "gamepad")))]
mod tests {
    use super::*;

    #[test]
    fn no_backend_reports_nothing() {
        let mut j = Joysticks::open();
        j.poll();
        assert_eq!(j.count(), 0);
        assert!(j.name(0).is_none());
        assert!(j.state(0).is_none());
        j.close();
    }
}
