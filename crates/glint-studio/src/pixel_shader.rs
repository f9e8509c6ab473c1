//! Pixel shader demo: per-pixel Phong on a procedural mesh with a selectable
//! material palette.
//!
//! Controls:
//! - digits pick the lambertian color, Space steps to the next one; with Shift
//!   they pick the glossy color instead
//! - Q/A, W/S, E/D and R/F raise and lower the lambertian, glossy, mirror and
//!   smoothness scalars
//! - left drag turns the model, right drag slides it

use std::rc::Rc;
use std::time::Duration;

use glam::{Mat4, Vec3};
use glint_engine::coords::{Color3, Color4};
use glint_engine::core::{App, AppCtx, Posed2D, Posed3D, sort_and_render_2d};
use glint_engine::input::{InputEvent, Key};
use glint_engine::render::{CullFace, NativeApi, PrimitiveType, RenderDevice, Shader, projection};

use crate::manipulator::Manipulator;
use crate::mesh::{Mesh, torus};
use crate::shading::{Film, Lighting, PhongMaterial, phong_shader};

pub const TITLE: &str = "Pixel Shader Demo";
pub const SIZE: u32 = 400;

const EYE: Vec3 = Vec3::new(1.0, 1.0, 2.5);
const FOV_Y_DEGREES: f32 = 45.0;
const RAINBOW_COLORS: usize = 10;
const BACKGROUND: Color4 = Color4::new(0.05, 0.05, 0.08, 1.0);
/// Rest orientation of the torus under the manipulator.
const TILT: f32 = std::f32::consts::FRAC_PI_2 * 0.6;
const SCALAR_STEP: f32 = 0.05;

/// Black, `RAINBOW_COLORS` hues, white.
pub fn palette() -> Vec<Color3> {
    let mut colors = Vec::with_capacity(RAINBOW_COLORS + 2);
    colors.push(Color3::black());
    colors.extend((0..RAINBOW_COLORS).map(|i| Color3::rainbow(i as f32 / RAINBOW_COLORS as f32)));
    colors.push(Color3::white());
    colors
}

/// Palette index picked by `key`: digits select entries 0 through 9, Space
/// advances to the next entry.
pub fn select_color(current: usize, key: Key, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match key {
        Key::Space => Some((current + 1) % len),
        _ => key.digit().map(|d| d as usize % len),
    }
}

/// Material scalar adjustable from the keyboard. All range over `[0, 1]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Scalar {
    Lambertian,
    Glossy,
    Mirror,
    Smoothness,
}

/// Scalar and signed step bound to `key`.
pub fn scalar_step(key: Key) -> Option<(Scalar, f32)> {
    Some(match key {
        Key::Q => (Scalar::Lambertian, SCALAR_STEP),
        Key::A => (Scalar::Lambertian, -SCALAR_STEP),
        Key::W => (Scalar::Glossy, SCALAR_STEP),
        Key::S => (Scalar::Glossy, -SCALAR_STEP),
        Key::E => (Scalar::Mirror, SCALAR_STEP),
        Key::D => (Scalar::Mirror, -SCALAR_STEP),
        Key::R => (Scalar::Smoothness, SCALAR_STEP),
        Key::F => (Scalar::Smoothness, -SCALAR_STEP),
        _ => return None,
    })
}

pub struct PixelShaderApp {
    mesh: Mesh,
    shader: Rc<Shader>,
    palette: Vec<Color3>,
    lambertian_index: usize,
    glossy_index: usize,
    material: PhongMaterial,
    lighting: Lighting,
    film: Film,
    manipulator: Manipulator,
}

impl PixelShaderApp {
    pub fn new() -> Self {
        let palette = palette();
        Self {
            mesh: Mesh::new(&torus(0.55, 0.22, 96, 48)),
            shader: phong_shader(),
            lambertian_index: 1,
            glossy_index: palette.len() - 1,
            palette,
            material: PhongMaterial::default(),
            lighting: Lighting { direction: Vec3::ONE, ambient: Color3::splat(0.3) },
            film: Film::new(),
            manipulator: Manipulator::default(),
        }
    }

    fn adjust(&mut self, scalar: Scalar, delta: f32) {
        let value = match scalar {
            Scalar::Lambertian => &mut self.material.lambertian_scalar,
            Scalar::Glossy => &mut self.material.glossy_scalar,
            Scalar::Mirror => &mut self.material.reflect,
            Scalar::Smoothness => &mut self.material.smoothness,
        };
        *value = (*value + delta).clamp(0.0, 1.0);
        log::debug!("{scalar:?} scalar {:.2}", *value);
    }

    fn object_to_world(&self) -> Mat4 {
        self.manipulator.frame() * Mat4::from_rotation_x(TILT)
    }

    fn material(&self) -> PhongMaterial {
        PhongMaterial {
            lambertian: self.palette[self.lambertian_index],
            glossy: self.palette[self.glossy_index],
            ..self.material
        }
    }
}

impl<A: NativeApi> App<A> for PixelShaderApp {
    fn on_event(&mut self, event: &InputEvent, _ctx: &mut AppCtx) -> bool {
        if self.manipulator.on_event(event) {
            return true;
        }
        let (sym, repeat) = match event {
            InputEvent::KeyDown(sym) => (sym, false),
            InputEvent::KeyRepeat(sym) => (sym, true),
            _ => return false,
        };
        if let Some((scalar, delta)) = scalar_step(sym.key) {
            self.adjust(scalar, delta);
            return true;
        }
        if repeat {
            return false;
        }

        let glossy = sym.modifiers.shift;
        let current = if glossy { self.glossy_index } else { self.lambertian_index };
        let Some(index) = select_color(current, sym.key, self.palette.len()) else {
            return false;
        };
        if glossy {
            self.glossy_index = index;
            log::debug!("glossy color {index}");
        } else {
            self.lambertian_index = index;
            log::debug!("lambertian color {index}");
        }
        true
    }

    fn on_wait(&mut self, _t: Duration) {}

    fn on_graphics(&mut self, rd: &mut RenderDevice<A>, _posed3d: &[Posed3D<A>], posed2d: &[Posed2D<A>]) {
        let (width, height) = rd.window_size();
        if width == 0 || height == 0 {
            return;
        }
        rd.clear_all();

        let framebuffer = self.film.framebuffer(width, height);
        rd.push_state_with(Some(framebuffer));
        {
            rd.set_color_clear_value(BACKGROUND);
            rd.clear_all();

            let aspect = width as f32 / height as f32;
            rd.set_projection_and_camera_matrix(
                projection::perspective(FOV_Y_DEGREES.to_radians(), aspect, 0.1, 50.0),
                projection::look_at(EYE, Vec3::ZERO, Vec3::Y),
            );
            rd.set_object_to_world_matrix(self.object_to_world());
            rd.set_cull_face(CullFace::None);

            let mut args = self.material().args(rd, &self.lighting);
            self.mesh.bind(&mut args);
            rd.apply(&self.shader, &args);
            rd.send_indices(PrimitiveType::Triangles, self.mesh.indices());
        }
        rd.pop_state();

        self.film.expose(rd);

        rd.push_2d_full();
        sort_and_render_2d(rd, posed2d);
        rd.pop_2d();
    }
}
