//! Projection and camera helpers.
//!
//! Projections handed to the render device map the top of the viewport to
//! NDC y = -1. The device corrects for the window surface, so the same matrix
//! renders upright on screen and into framebuffers.

use glam::{Mat4, Vec3};

use crate::coords::Rect2D;

const FLIP_Y: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Right-handed perspective with a vertical field of view in radians.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    FLIP_Y * Mat4::perspective_rh_gl(fov_y, aspect, near, far)
}

/// Pixel-space projection for `viewport`. Pixel (0, 0) is the viewport's
/// top-left corner.
pub fn orthographic_2d(viewport: Rect2D) -> Mat4 {
    Mat4::orthographic_rh_gl(0.0, viewport.width(), 0.0, viewport.height(), -1.0, 1.0)
}

/// Camera-to-world frame of a camera at `eye` looking at `target`.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, target, up).inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn perspective_maps_up_to_negative_y() {
        let p = perspective(45f32.to_radians(), 1.0, 0.1, 100.0);
        let clip = p * Vec4::new(0.0, 1.0, -2.0, 1.0);
        assert!(clip.y / clip.w < 0.0);
    }

    #[test]
    fn ortho_maps_top_left_to_minus_one() {
        let p = orthographic_2d(Rect2D::new(100.0, 50.0, 200.0, 100.0));
        let tl = p * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let br = p * Vec4::new(200.0, 100.0, 0.0, 1.0);
        assert!(tl.truncate().abs_diff_eq(Vec3::new(-1.0, -1.0, 0.0), 1e-6));
        assert!(br.truncate().abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn look_at_places_camera() {
        let eye = Vec3::new(1.0, 1.0, 2.5);
        let c = look_at(eye, Vec3::ZERO, Vec3::Y);
        assert!(c.w_axis.truncate().abs_diff_eq(eye, 1e-5));
        let forward = -c.z_axis.truncate();
        assert!(forward.abs_diff_eq(-eye.normalize(), 1e-5));
    }
}
