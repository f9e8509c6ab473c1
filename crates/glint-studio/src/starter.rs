//! Starter app: a lit spinning mesh rendered off-screen, then exposed.

use std::rc::Rc;

use glam::{Mat4, Vec3};
use glint_engine::coords::{Color3, Color4};
use glint_engine::core::{App, AppCtx, Posed2D, Posed3D, sort_and_render_2d};
use glint_engine::input::{InputEvent, Key};
use glint_engine::render::{CullFace, NativeApi, PrimitiveType, RenderDevice, RenderMode, Shader, projection};
use glint_engine::time::{RealTime, SimTime};

use crate::mesh::{Mesh, torus};
use crate::shading::{Film, Lighting, PhongMaterial, phong_shader};

pub const FRAME_RATE: f64 = 30.0;

const EYE: Vec3 = Vec3::new(0.0, 1.2, 3.0);
const FOV_Y_DEGREES: f32 = 60.0;
const BACKGROUND: Color4 = Color4::new(0.1, 0.1, 0.12, 1.0);
/// Radians per simulated second.
const SPIN_RATE: f32 = 0.6;

pub struct StarterApp {
    mesh: Mesh,
    shader: Rc<Shader>,
    material: PhongMaterial,
    lighting: Lighting,
    film: Film,
    wireframe: bool,
    spin: f32,
}

impl StarterApp {
    pub fn new() -> Self {
        Self {
            mesh: Mesh::new(&torus(0.8, 0.3, 64, 32)),
            shader: phong_shader(),
            material: PhongMaterial { lambertian: Color3::new(1.0, 0.55, 0.2), ..PhongMaterial::default() },
            lighting: Lighting::default(),
            film: Film::new(),
            wireframe: false,
            spin: 0.0,
        }
    }
}

impl<A: NativeApi> App<A> for StarterApp {
    fn on_init(&mut self, rd: &mut RenderDevice<A>, ctx: &mut AppCtx) -> anyhow::Result<()> {
        // The host presents after each frame.
        rd.set_swap_buffers_automatically(false);
        ctx.settings.set_frame_rate(FRAME_RATE);
        log::info!("starter app initialized");
        Ok(())
    }

    fn on_event(&mut self, event: &InputEvent, _ctx: &mut AppCtx) -> bool {
        match event {
            InputEvent::KeyDown(sym) if sym.key == Key::W => {
                self.wireframe = !self.wireframe;
                log::info!("wireframe {}", if self.wireframe { "on" } else { "off" });
                true
            }
            _ => false,
        }
    }

    fn on_simulation(&mut self, _rdt: RealTime, sdt: SimTime, _idt: SimTime) {
        self.spin = (self.spin + sdt as f32 * SPIN_RATE) % std::f32::consts::TAU;
    }

    fn on_graphics(&mut self, rd: &mut RenderDevice<A>, _posed3d: &[Posed3D<A>], posed2d: &[Posed2D<A>]) {
        let (width, height) = rd.window_size();
        if width == 0 || height == 0 {
            return;
        }

        let framebuffer = self.film.framebuffer(width, height);
        rd.push_state_with(Some(framebuffer));
        {
            rd.set_color_clear_value(BACKGROUND);
            rd.clear_all();

            let aspect = width as f32 / height as f32;
            rd.set_projection_and_camera_matrix(
                projection::perspective(FOV_Y_DEGREES.to_radians(), aspect, 0.1, 100.0),
                projection::look_at(EYE, Vec3::ZERO, Vec3::Y),
            );
            rd.set_object_to_world_matrix(Mat4::from_rotation_y(self.spin) * Mat4::from_rotation_x(0.5));
            rd.set_cull_face(CullFace::None);
            if self.wireframe {
                rd.set_render_mode(RenderMode::Wireframe);
            }

            let mut args = self.material.args(rd, &self.lighting);
            self.mesh.bind(&mut args);
            rd.apply(&self.shader, &args);
            rd.send_indices(PrimitiveType::Triangles, self.mesh.indices());
        }
        rd.pop_state();

        rd.clear_all();
        self.film.expose(rd);

        rd.push_2d_full();
        sort_and_render_2d(rd, posed2d);
        rd.pop_2d();
    }
}

#[cfg(test)]
mod tests {
    use glint_engine::input::{KeySym, Modifiers};
    use glint_engine::render::{Caps, NativeCall, RecordingApi};

    use super::*;

    fn device() -> RenderDevice<RecordingApi> {
        RenderDevice::new(RecordingApi::new(Caps::default()), 800, 800)
    }

    fn key_down(key: Key) -> InputEvent {
        InputEvent::KeyDown(KeySym { key, modifiers: Modifiers::default(), unicode: 0, scancode: 0 })
    }

    // ── setup ─────────────────────────────────────────────────────────────

    #[test]
    fn init_sets_frame_rate_and_manual_swap() {
        let mut app = StarterApp::new();
        let mut rd = device();
        let mut ctx = AppCtx::default();
        App::<RecordingApi>::on_init(&mut app, &mut rd, &mut ctx).unwrap();
        assert!(!rd.swap_buffers_automatically());
        assert!((ctx.settings.frame_rate() - FRAME_RATE).abs() < 1e-9);
    }

    // ── input ─────────────────────────────────────────────────────────────

    #[test]
    fn w_toggles_wireframe() {
        let mut app = StarterApp::new();
        let mut ctx = AppCtx::default();
        assert!(App::<RecordingApi>::on_event(&mut app, &key_down(Key::W), &mut ctx));
        assert!(app.wireframe);
        assert!(App::<RecordingApi>::on_event(&mut app, &key_down(Key::W), &mut ctx));
        assert!(!app.wireframe);
        assert!(!App::<RecordingApi>::on_event(&mut app, &key_down(Key::Q), &mut ctx));
    }

    // ── graphics ──────────────────────────────────────────────────────────

    #[test]
    fn frame_renders_off_screen_then_exposes() {
        let mut app = StarterApp::new();
        let mut rd = device();
        rd.api_mut().clear();

        rd.begin_frame();
        App::<RecordingApi>::on_graphics(&mut app, &mut rd, &[], &[]);
        rd.end_frame();

        let calls = rd.api_mut().take();
        let mesh = calls.iter().position(|c| matches!(c, NativeCall::DrawElements { .. })).unwrap();
        let expose = calls
            .iter()
            .position(|c| matches!(c, NativeCall::DrawArrays { count: 3, .. }))
            .unwrap();
        assert!(mesh < expose);

        let unbind = calls
            .iter()
            .rposition(|c| matches!(c, NativeCall::BindFramebuffer { framebuffer: None, .. }))
            .unwrap();
        assert!(mesh < unbind && unbind < expose);
        assert_eq!(rd.stack_depth(), 0);
    }

    #[test]
    fn wireframe_switches_polygon_mode_inside_the_pass() {
        let mut app = StarterApp::new();
        let mut ctx = AppCtx::default();
        App::<RecordingApi>::on_event(&mut app, &key_down(Key::W), &mut ctx);

        let mut rd = device();
        rd.api_mut().clear();
        rd.begin_frame();
        App::<RecordingApi>::on_graphics(&mut app, &mut rd, &[], &[]);
        rd.end_frame();

        let calls = rd.api_mut().take();
        assert!(calls.contains(&NativeCall::PolygonMode(RenderMode::Wireframe)));
        assert_eq!(rd.state().render_mode, RenderMode::Solid);
    }

    #[test]
    fn zero_sized_window_draws_nothing() {
        let mut app = StarterApp::new();
        let mut rd = RenderDevice::new(RecordingApi::new(Caps::default()), 0, 0);
        rd.api_mut().clear();
        App::<RecordingApi>::on_graphics(&mut app, &mut rd, &[], &[]);
        assert!(rd.api_mut().take().is_empty());
    }
}
