//! Mouse-driven object frame. Left drag turns the object, right drag slides it
//! along world X and Y.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use glint_engine::input::{ButtonMask, InputEvent};

/// Radians per pixel of drag.
const TURN_RATE: f32 = 0.01;
/// World units per pixel of drag.
const SLIDE_RATE: f32 = 0.005;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Manipulator {
    yaw: f32,
    pitch: f32,
    translation: Vec3,
}

impl Manipulator {
    /// Consumes drags. Returns `true` when the frame moved.
    pub fn on_event(&mut self, event: &InputEvent) -> bool {
        let &InputEvent::MouseMotion { xrel, yrel, buttons, .. } = event else {
            return false;
        };
        if buttons.contains(ButtonMask::LEFT) {
            self.yaw += xrel * TURN_RATE;
            self.pitch = (self.pitch + yrel * TURN_RATE).clamp(-FRAC_PI_2, FRAC_PI_2);
            true
        } else if buttons.contains(ButtonMask::RIGHT) {
            // Window y grows downward.
            self.translation += Vec3::new(xrel, -yrel, 0.0) * SLIDE_RATE;
            true
        } else {
            false
        }
    }

    pub fn frame(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_rotation_y(self.yaw) * Mat4::from_rotation_x(self.pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(buttons: ButtonMask, xrel: f32, yrel: f32) -> InputEvent {
        InputEvent::MouseMotion { x: 0.0, y: 0.0, xrel, yrel, buttons }
    }

    #[test]
    fn starts_at_identity() {
        assert_eq!(Manipulator::default().frame(), Mat4::IDENTITY);
    }

    #[test]
    fn left_drag_turns() {
        let mut m = Manipulator::default();
        assert!(m.on_event(&drag(ButtonMask::LEFT, 100.0, 0.0)));
        let expected = Mat4::from_rotation_y(1.0);
        assert!(m.frame().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut m = Manipulator::default();
        m.on_event(&drag(ButtonMask::LEFT, 0.0, 10_000.0));
        assert_eq!(m.pitch, FRAC_PI_2);
        m.on_event(&drag(ButtonMask::LEFT, 0.0, -20_000.0));
        assert_eq!(m.pitch, -FRAC_PI_2);
    }

    #[test]
    fn right_drag_slides_up_for_upward_motion() {
        let mut m = Manipulator::default();
        assert!(m.on_event(&drag(ButtonMask::RIGHT, 200.0, -100.0)));
        assert!(m.frame().w_axis.truncate().abs_diff_eq(Vec3::new(1.0, 0.5, 0.0), 1e-5));
    }

    #[test]
    fn hover_and_clicks_are_ignored() {
        let mut m = Manipulator::default();
        assert!(!m.on_event(&drag(ButtonMask::empty(), 50.0, 50.0)));
        assert!(!m.on_event(&drag(ButtonMask::MIDDLE, 50.0, 50.0)));
        assert!(!m.on_event(&InputEvent::Quit));
        assert_eq!(m, Manipulator::default());
    }
}
