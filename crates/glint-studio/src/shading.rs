//! Phong material, lighting and the off-screen film shared by the demos.

use std::rc::Rc;

use glam::{Mat4, Vec3, Vec4};
use glint_engine::coords::Color3;
use glint_engine::render::{
    Args, AttachmentPoint, Compare, CullFace, Framebuffer, NativeApi, PrimitiveType, RenderDevice, Shader,
    Texture, TextureFormat,
};

const PHONG_WGSL: &str = include_str!("shaders/phong.wgsl");
const EXPOSE_WGSL: &str = include_str!("shaders/expose.wgsl");

pub fn phong_shader() -> Rc<Shader> {
    Shader::from_wgsl("phong", PHONG_WGSL)
}

/// Single directional light plus ambient.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Lighting {
    /// World space, toward the light.
    pub direction: Vec3,
    pub ambient: Color3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self { direction: Vec3::ONE, ambient: Color3::splat(0.3) }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PhongMaterial {
    pub lambertian: Color3,
    pub lambertian_scalar: f32,
    pub glossy: Color3,
    pub glossy_scalar: f32,
    pub reflect: f32,
    /// 0 is rough, 1 is mirror-sharp highlights.
    pub smoothness: f32,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            lambertian: Color3::white(),
            lambertian_scalar: 0.6,
            glossy: Color3::white(),
            glossy_scalar: 0.5,
            reflect: 0.1,
            smoothness: 0.2,
        }
    }
}

impl PhongMaterial {
    /// Shader arguments for the current camera of `rd`. Uniform order matches
    /// the block in `phong.wgsl`.
    pub fn args<A: NativeApi>(&self, rd: &RenderDevice<A>, lighting: &Lighting) -> Args {
        let camera_to_world = rd.camera_to_world_matrix();
        let light = camera_to_world.inverse().transform_vector3(lighting.direction).normalize_or_zero();

        let mut args = Args::new();
        args.set_uniform("light", light)
            .set_uniform("ambient", lighting.ambient)
            .set_uniform("lambertian", self.lambertian * self.lambertian_scalar)
            .set_uniform("glossy", self.glossy * self.glossy_scalar)
            .set_uniform("params", Vec4::new(self.reflect, self.smoothness.clamp(0.0, 1.0), 0.0, 0.0))
            .set_uniform("camera_to_world", camera_to_world);
        args
    }
}

/// Off-screen color + depth target sized to the window, exposed with a
/// full-screen pass.
pub struct Film {
    framebuffer: Rc<Framebuffer>,
    size: (u32, u32),
    expose: Rc<Shader>,
}

impl Film {
    pub fn new() -> Self {
        Self {
            framebuffer: Framebuffer::new("film"),
            size: (0, 0),
            expose: Shader::from_wgsl("expose", EXPOSE_WGSL),
        }
    }

    /// The framebuffer, with attachments reallocated when the size changed.
    pub fn framebuffer(&mut self, width: u32, height: u32) -> Rc<Framebuffer> {
        if self.size != (width, height) {
            self.framebuffer.set(
                AttachmentPoint::Color(0),
                Some(Texture::render_target("film color", width, height, TextureFormat::Rgba8)),
            );
            self.framebuffer.set(
                AttachmentPoint::Depth,
                Some(Texture::render_target("film depth", width, height, TextureFormat::Depth32Float)),
            );
            self.size = (width, height);
            log::debug!("film resized to {width}x{height}");
        }
        self.framebuffer.clone()
    }

    /// Draws the color target over the current viewport.
    pub fn expose<A: NativeApi>(&self, rd: &mut RenderDevice<A>) {
        let Some(color) = self.framebuffer.get(AttachmentPoint::Color(0)) else {
            return;
        };
        rd.push_state();
        rd.set_depth_test(Compare::AlwaysPass);
        rd.set_depth_write(false);
        rd.set_cull_face(CullFace::None);
        rd.set_object_to_world_matrix(Mat4::IDENTITY);

        let mut args = Args::new();
        args.set_texture("color", color);
        rd.apply(&self.expose, &args);
        rd.send_sequential_indices(PrimitiveType::Triangles, 0, 3);
        rd.pop_state();
    }
}

#[cfg(test)]
mod tests {
    use glint_engine::render::{Caps, NativeCall, RecordingApi, Uniform, projection};

    use super::*;

    fn device() -> RenderDevice<RecordingApi> {
        RenderDevice::new(RecordingApi::new(Caps::default()), 64, 64)
    }

    #[test]
    fn light_is_in_camera_space() {
        let mut rd = device();
        let camera = projection::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        rd.set_projection_and_camera_matrix(Mat4::IDENTITY, camera);

        let lighting = Lighting { direction: Vec3::Z, ..Lighting::default() };
        let args = PhongMaterial::default().args(&rd, &lighting);
        match args.uniform("light") {
            Some(Uniform::Vec3(l)) => assert!(l.abs_diff_eq(Vec3::Z, 1e-5)),
            other => panic!("unexpected light uniform {other:?}"),
        }
    }

    #[test]
    fn material_scalars_premultiply_colors() {
        let rd = device();
        let args = PhongMaterial::default().args(&rd, &Lighting::default());
        assert_eq!(args.uniform("lambertian"), Some(Uniform::Vec3(Vec3::splat(0.6))));
        assert_eq!(args.uniform("glossy"), Some(Uniform::Vec3(Vec3::splat(0.5))));
        assert_eq!(args.uniform("params"), Some(Uniform::Vec4(Vec4::new(0.1, 0.2, 0.0, 0.0))));
        // light, ambient, lambertian, glossy, params, then four matrix columns
        assert_eq!(args.packed_uniforms().len(), 9);
    }

    #[test]
    fn film_reallocates_only_on_resize() {
        let mut film = Film::new();
        let fb = film.framebuffer(32, 16);
        let color = fb.get(AttachmentPoint::Color(0)).unwrap();
        assert_eq!((color.width(), color.height()), (32, 16));
        assert!(fb.has(AttachmentPoint::Depth));

        let again = film.framebuffer(32, 16);
        assert!(Rc::ptr_eq(&again.get(AttachmentPoint::Color(0)).unwrap(), &color));

        let resized = film.framebuffer(8, 8);
        assert_eq!(resized.width(), 8);
    }

    #[test]
    fn expose_draws_one_full_screen_triangle() {
        let mut film = Film::new();
        film.framebuffer(64, 64);
        let mut rd = device();
        rd.api_mut().clear();

        film.expose(&mut rd);
        let calls = rd.api_mut().take();
        assert!(calls.contains(&NativeCall::DrawArrays { primitive: PrimitiveType::Triangles, start: 0, count: 3 }));
        assert_eq!(rd.stack_depth(), 0);
    }

    #[test]
    fn expose_without_target_draws_nothing() {
        let film = Film::new();
        let mut rd = device();
        rd.api_mut().clear();
        film.expose(&mut rd);
        assert!(rd.api_mut().take().is_empty());
    }
}
