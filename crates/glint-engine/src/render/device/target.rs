//! Render targets: viewport, 2D clip, framebuffers and draw/read buffers.

use std::rc::Rc;

use glam::Mat4;

use crate::coords::Rect2D;
use crate::render::error::FramebufferError;
use crate::render::native::{Capability, NativeApi, NativeCall};
use crate::render::resource::{AttachmentPoint, Framebuffer};
use crate::render::state::same_handle;
use crate::render::types::{ColorBuffer, Compare, CullFace, FramebufferTarget};

use super::RenderDevice;

impl<A: NativeApi> RenderDevice<A> {
    /// Width of the current draw target in pixels.
    pub fn width(&self) -> u32 {
        match &self.state.draw_framebuffer {
            Some(fb) => fb.width(),
            None => self.window_size.0,
        }
    }

    /// Height of the current draw target in pixels.
    pub fn height(&self) -> u32 {
        match &self.state.draw_framebuffer {
            Some(fb) => fb.height(),
            None => self.window_size.1,
        }
    }

    /// Rectangle covering the current draw target.
    pub fn target_rect(&self) -> Rect2D {
        Rect2D::from_size(self.width() as f32, self.height() as f32)
    }

    // ── viewport & clip ───────────────────────────────────────────────────

    pub fn set_viewport(&mut self, viewport: Rect2D) {
        if viewport == self.state.viewport {
            return;
        }
        self.force_set_viewport(viewport);
    }

    pub(super) fn force_set_viewport(&mut self, viewport: Rect2D) {
        self.minor_state_change();
        self.state.viewport = viewport;
        let (x, y, width, height) = self.to_native_rect(viewport);
        self.emit(NativeCall::Viewport { x, y, width, height });
    }

    /// Converts a top-left rect to native bottom-left integer coordinates.
    fn to_native_rect(&self, r: Rect2D) -> (i32, i32, i32, i32) {
        let x = r.x0() as i32;
        let w = r.width() as i32;
        let h = r.height() as i32;
        let y = if self.state.matrices.invert_y {
            self.height() as i32 - r.y1() as i32
        } else {
            r.y0() as i32
        };
        (x, y, w, h)
    }

    /// Restricts rasterization to `clip`.
    ///
    /// An infinite rect disables clipping. A zero-area rect clips everything.
    pub fn set_clip_2d(&mut self, clip: Rect2D) {
        if clip.is_finite() || clip.is_empty() {
            let stored = if clip.is_empty() { Rect2D::empty() } else { clip };
            if self.state.use_clip_2d && stored == self.state.clip_2d {
                return;
            }
            self.minor_state_change();
            self.state.clip_2d = stored;

            let r = stored.snapped_out();
            if r.area() == 0.0 {
                // Some drivers rasterize a literal zero-size scissor; use an empty
                // rect at the origin.
                self.emit(NativeCall::Scissor { x: 0, y: 0, width: 0, height: 0 });
            } else {
                let (x, y, width, height) = self.to_native_rect(r);
                self.emit(NativeCall::Scissor { x, y, width, height });
            }

            if !self.state.use_clip_2d {
                self.set_enabled(Capability::ScissorTest, true);
                self.state.use_clip_2d = true;
            }
        } else if self.state.use_clip_2d {
            self.minor_state_change();
            self.set_enabled(Capability::ScissorTest, false);
            self.state.use_clip_2d = false;
            self.state.clip_2d = Rect2D::inf();
        }
    }

    // ── framebuffers ──────────────────────────────────────────────────────

    /// Binds `fb` for both drawing and reading. `None` selects the window surface.
    pub fn set_framebuffer(&mut self, fb: Option<Rc<Framebuffer>>) {
        self.set_read_framebuffer(fb.clone());
        self.set_draw_framebuffer(fb);
    }

    /// Binds the draw target. Draw buffer selection for a framebuffer is
    /// deferred to [`before_primitive`](Self::before_primitive).
    ///
    /// Switching between the window and an off-screen target flips the Y
    /// convention and reapplies projection, viewport, culling and stencil ops.
    pub fn set_draw_framebuffer(&mut self, fb: Option<Rc<Framebuffer>>) {
        if same_handle(&self.state.draw_framebuffer, &fb) {
            return;
        }
        if fb.is_some() && !self.caps.framebuffer_objects {
            debug_assert!(false, "framebuffer objects not supported");
            log::error!("framebuffer objects not supported; draw target unchanged");
            return;
        }
        self.major_state_change();

        match fb {
            None => {
                self.emit(NativeCall::BindFramebuffer { target: FramebufferTarget::Draw, framebuffer: None });
                // Releases the framebuffer only after the native rebind.
                self.state.draw_framebuffer = None;
                self.emit(NativeCall::DrawBuffer(self.state.draw_buffer));
            }
            Some(fb) => {
                self.emit(NativeCall::BindFramebuffer {
                    target: FramebufferTarget::Draw,
                    framebuffer: Some(fb.clone()),
                });
                self.state.draw_framebuffer = Some(fb);
            }
        }
        self.draw_sync = None;

        let invert_y = self.state.draw_framebuffer.is_none();
        if invert_y != self.state.matrices.invert_y {
            self.state.matrices.invert_y = invert_y;
            let s = self.state.clone();
            self.force_set_projection_matrix(s.matrices.projection);
            self.force_set_viewport(s.viewport);
            self.force_set_cull_face(s.cull_face);
            self.force_set_stencil_op(
                [s.stencil.front_fail, s.stencil.front_zfail, s.stencil.front_zpass],
                [s.stencil.back_fail, s.stencil.back_zfail, s.stencil.back_zpass],
            );
        }
    }

    /// Binds the read target. Read buffer selection for a framebuffer is
    /// deferred to [`before_primitive`](Self::before_primitive).
    pub fn set_read_framebuffer(&mut self, fb: Option<Rc<Framebuffer>>) {
        if same_handle(&self.state.read_framebuffer, &fb) {
            return;
        }
        if fb.is_some() && !self.caps.framebuffer_objects {
            debug_assert!(false, "framebuffer objects not supported");
            log::error!("framebuffer objects not supported; read target unchanged");
            return;
        }
        self.major_state_change();

        match fb {
            None => {
                self.emit(NativeCall::BindFramebuffer { target: FramebufferTarget::Read, framebuffer: None });
                self.state.read_framebuffer = None;
                self.emit(NativeCall::ReadBuffer(self.state.read_buffer));
            }
            Some(fb) => {
                self.emit(NativeCall::BindFramebuffer {
                    target: FramebufferTarget::Read,
                    framebuffer: Some(fb.clone()),
                });
                self.state.read_framebuffer = Some(fb);
            }
        }
        self.read_sync = None;
    }

    #[inline]
    pub fn draw_framebuffer(&self) -> Option<&Rc<Framebuffer>> {
        self.state.draw_framebuffer.as_ref()
    }

    #[inline]
    pub fn read_framebuffer(&self) -> Option<&Rc<Framebuffer>> {
        self.state.read_framebuffer.as_ref()
    }

    /// Selects the window draw buffer. Attachment selectors require a bound
    /// framebuffer, whose draw buffers otherwise follow its attachments.
    pub fn set_draw_buffer(&mut self, buffer: ColorBuffer) {
        if buffer == self.state.draw_buffer {
            return;
        }
        debug_assert!(
            !buffer.is_attachment() || self.state.draw_framebuffer.is_some(),
            "color attachment draw buffer without a framebuffer"
        );
        self.minor_state_change();
        self.state.draw_buffer = buffer;
        if self.state.draw_framebuffer.is_none() {
            self.emit(NativeCall::DrawBuffer(buffer));
        }
    }

    pub fn set_read_buffer(&mut self, buffer: ColorBuffer) {
        if buffer == self.state.read_buffer {
            return;
        }
        debug_assert!(
            !buffer.is_attachment() || self.state.read_framebuffer.is_some(),
            "color attachment read buffer without a framebuffer"
        );
        self.minor_state_change();
        self.state.read_buffer = buffer;
        if self.state.read_framebuffer.is_none() {
            self.emit(NativeCall::ReadBuffer(buffer));
        }
    }

    // ── lazy sync ─────────────────────────────────────────────────────────

    /// Applies pending draw/read buffer selection. Runs before every draw and clear.
    pub fn before_primitive(&mut self) {
        self.sync_draw_buffer();
        self.sync_read_buffer();
    }

    fn sync_draw_buffer(&mut self) {
        let Some(fb) = self.state.draw_framebuffer.clone() else { return };
        let stamp = (fb.id(), fb.generation(), self.state.draw_buffer);
        if self.draw_sync == Some(stamp) {
            return;
        }
        let buffers = fb.color_buffers();
        if buffers.is_empty() {
            // Depth or stencil only.
            self.emit(NativeCall::DrawBuffers(vec![ColorBuffer::None]));
        } else {
            debug_assert!(
                buffers.len() <= self.caps.max_color_attachments,
                "backend supports {} draw buffers",
                self.caps.max_color_attachments
            );
            self.emit(NativeCall::DrawBuffers(buffers));
        }
        self.draw_sync = Some(stamp);
    }

    fn sync_read_buffer(&mut self) {
        let Some(fb) = self.state.read_framebuffer.clone() else { return };
        let stamp = (fb.id(), fb.generation(), self.state.read_buffer);
        if self.read_sync == Some(stamp) {
            return;
        }
        let buffer = if fb.is_depth_only() {
            ColorBuffer::None
        } else {
            match self.state.read_buffer {
                ColorBuffer::Front | ColorBuffer::Back => {
                    if fb.has(AttachmentPoint::Color(0)) {
                        ColorBuffer::Color(0)
                    } else {
                        ColorBuffer::None
                    }
                }
                other => other,
            }
        };
        self.emit(NativeCall::ReadBuffer(buffer));
        self.read_sync = Some(stamp);
    }

    /// Checks that the bound framebuffers can be drawn to and read from.
    pub fn check_framebuffer(&self) -> Result<(), FramebufferError> {
        if let Some(fb) = &self.state.draw_framebuffer {
            fb.check()?;
            if let ColorBuffer::Color(i) = self.state.draw_buffer {
                if !fb.has(AttachmentPoint::Color(i)) {
                    return Err(FramebufferError::MissingDrawBuffer);
                }
            }
        }
        if let Some(fb) = &self.state.read_framebuffer {
            fb.check()?;
            if let ColorBuffer::Color(i) = self.state.read_buffer {
                if !fb.has(AttachmentPoint::Color(i)) {
                    return Err(FramebufferError::MissingReadBuffer);
                }
            }
        }
        Ok(())
    }

    /// Debug-asserts framebuffer completeness; logs in release builds.
    pub(super) fn assert_framebuffer_complete(&self) -> bool {
        match self.check_framebuffer() {
            Ok(()) => true,
            Err(e) => {
                debug_assert!(false, "{e}");
                log::error!("{e}");
                false
            }
        }
    }

    // ── clear ─────────────────────────────────────────────────────────────

    /// Clears the selected buffers of the draw target, ignoring write masks.
    pub fn clear(&mut self, color: bool, depth: bool, stencil: bool) {
        self.before_primitive();
        if !self.assert_framebuffer_complete() {
            return;
        }

        let (old_color, old_alpha, old_depth) =
            (self.state.color_write, self.state.alpha_write, self.state.depth_write);
        if color {
            self.set_color_write(true);
            self.set_alpha_write(true);
        }
        if depth {
            self.set_depth_write(true);
        }

        self.major_state_change();
        self.emit(NativeCall::Clear { color, depth, stencil });

        self.set_depth_write(old_depth);
        self.set_color_write(old_color);
        self.set_alpha_write(old_alpha);
    }

    /// Clears color, depth and stencil.
    pub fn clear_all(&mut self) {
        self.clear(true, true, true);
    }

    // ── scoped targets ────────────────────────────────────────────────────

    /// Pushes state, then binds `fb` with the clip reset and the viewport
    /// covering the framebuffer.
    pub fn push_state_with(&mut self, fb: Option<Rc<Framebuffer>>) {
        self.push_state();
        if let Some(fb) = fb {
            let bounds = fb.rect();
            self.set_framebuffer(Some(fb));
            self.set_clip_2d(Rect2D::inf());
            self.set_viewport(bounds);
        }
    }

    /// Pushes state configured for pixel-space 2D drawing into `viewport` of
    /// `fb` (or the current target).
    pub fn push_2d(&mut self, fb: Option<Rc<Framebuffer>>, viewport: Rect2D) {
        self.push_state_with(fb);
        self.set_depth_write(false);
        self.set_depth_test(Compare::AlwaysPass);
        self.set_cull_face(CullFace::None);
        self.set_viewport(viewport);
        self.set_object_to_world_matrix(Mat4::IDENTITY);
        self.set_camera_to_world_matrix(Mat4::IDENTITY);
        self.set_projection_matrix(crate::render::projection::orthographic_2d(viewport));
    }

    /// [`push_2d`](Self::push_2d) covering the whole current target.
    pub fn push_2d_full(&mut self) {
        let rect = self.target_rect();
        self.push_2d(None, rect);
    }

    pub fn pop_2d(&mut self) {
        self.pop_state();
    }

    // ── read-back ─────────────────────────────────────────────────────────

    /// Reads the current viewport of the read target, top row first.
    pub fn screenshot(&mut self) -> anyhow::Result<image::RgbaImage> {
        self.sync_read_buffer();
        let v = self.state.viewport;
        // Addressed in the read target, which may differ from the draw target.
        let y = match self.state.read_framebuffer {
            Some(_) => v.y0(),
            None => self.window_size.1 as f32 - v.y1(),
        };
        let rect = Rect2D::new(v.x0().trunc(), y.trunc(), v.width().trunc(), v.height().trunc());
        let mut img = self.api.read_pixels(rect)?;
        if self.state.read_framebuffer.is_none() {
            // Window rows come back bottom-up.
            image::imageops::flip_vertical_in_place(&mut img);
        }
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::coords::Rect2D;
    use crate::render::device::test_support::*;
    use crate::render::native::{Capability, NativeCall};
    use crate::render::resource::{AttachmentPoint, Framebuffer, Texture, TextureFormat};
    use crate::render::types::{ColorBuffer, CullFace, FramebufferTarget};

    fn color_fb(w: u32, h: u32) -> Rc<Framebuffer> {
        let fb = Framebuffer::new("color");
        fb.set(AttachmentPoint::Color(0), Some(Texture::render_target("c0", w, h, TextureFormat::Rgba8)));
        fb.set(AttachmentPoint::Depth, Some(Texture::render_target("d", w, h, TextureFormat::Depth32Float)));
        fb
    }

    fn depth_fb(w: u32, h: u32) -> Rc<Framebuffer> {
        let fb = Framebuffer::new("depth");
        fb.set(AttachmentPoint::Depth, Some(Texture::render_target("d", w, h, TextureFormat::Depth32Float)));
        fb
    }

    fn draw_buffer_calls(calls: &[NativeCall]) -> Vec<NativeCall> {
        calls.iter().filter(|c| matches!(c, NativeCall::DrawBuffers(_))).cloned().collect()
    }

    // ── viewport ──────────────────────────────────────────────────────────

    #[test]
    fn viewport_on_window_is_flipped_to_bottom_left() {
        let mut rd = device();
        rd.set_viewport(Rect2D::new(10.0, 20.0, 100.0, 50.0));
        assert_eq!(
            drain(&mut rd),
            vec![NativeCall::Viewport { x: 10, y: 480 - 70, width: 100, height: 50 }]
        );
    }

    #[test]
    fn same_viewport_is_noop() {
        let mut rd = device();
        let v = rd.state().viewport;
        rd.set_viewport(v);
        assert!(drain(&mut rd).is_empty());
    }

    #[test]
    fn nested_push_pop_restores_viewport_chain() {
        let mut rd = device();
        let original = rd.state().viewport;
        rd.push_state();
        rd.set_viewport(Rect2D::new(1.0, 1.0, 10.0, 10.0));
        rd.push_state();
        rd.set_viewport(Rect2D::new(2.0, 2.0, 20.0, 20.0));
        rd.pop_state();
        assert_eq!(rd.state().viewport, Rect2D::new(1.0, 1.0, 10.0, 10.0));
        rd.pop_state();
        assert_eq!(rd.state().viewport, original);
    }

    // ── clip ──────────────────────────────────────────────────────────────

    #[test]
    fn finite_clip_enables_scissor_with_flipped_y() {
        let mut rd = device();
        rd.set_clip_2d(Rect2D::new(0.5, 10.0, 20.0, 30.0));
        assert_eq!(
            drain(&mut rd),
            vec![
                NativeCall::Scissor { x: 0, y: 440, width: 21, height: 30 },
                NativeCall::Enable(Capability::ScissorTest),
            ]
        );
        assert!(rd.state().use_clip_2d);
    }

    #[test]
    fn zero_area_clip_scissors_everything() {
        let mut rd = device();
        rd.set_clip_2d(Rect2D::new(5.0, 5.0, 0.0, 10.0));
        assert_eq!(
            drain(&mut rd),
            vec![
                NativeCall::Scissor { x: 0, y: 0, width: 0, height: 0 },
                NativeCall::Enable(Capability::ScissorTest),
            ]
        );
        assert_eq!(rd.state().clip_2d, Rect2D::empty());
    }

    #[test]
    fn infinite_clip_disables_scissor() {
        let mut rd = device();
        rd.set_clip_2d(Rect2D::new(0.0, 0.0, 10.0, 10.0));
        drain(&mut rd);
        rd.set_clip_2d(Rect2D::inf());
        assert_eq!(drain(&mut rd), vec![NativeCall::Disable(Capability::ScissorTest)]);
        rd.set_clip_2d(Rect2D::inf());
        assert!(drain(&mut rd).is_empty());
    }

    // ── framebuffers ──────────────────────────────────────────────────────

    #[test]
    fn binding_framebuffer_defers_draw_buffers() {
        let mut rd = device();
        let fb = color_fb(64, 32);
        rd.set_draw_framebuffer(Some(fb.clone()));
        let calls = drain(&mut rd);
        assert!(calls.contains(&NativeCall::BindFramebuffer {
            target: FramebufferTarget::Draw,
            framebuffer: Some(fb),
        }));
        assert!(draw_buffer_calls(&calls).is_empty());

        rd.before_primitive();
        assert_eq!(drain(&mut rd), vec![NativeCall::DrawBuffers(vec![ColorBuffer::Color(0)])]);

        rd.before_primitive();
        assert!(drain(&mut rd).is_empty());
    }

    #[test]
    fn depth_only_framebuffer_selects_no_color_buffers() {
        let mut rd = device();
        rd.set_draw_framebuffer(Some(color_fb(16, 16)));
        rd.before_primitive();
        drain(&mut rd);

        rd.set_draw_framebuffer(Some(depth_fb(16, 16)));
        rd.before_primitive();
        assert_eq!(
            draw_buffer_calls(&drain(&mut rd)),
            vec![NativeCall::DrawBuffers(vec![ColorBuffer::None])]
        );
    }

    #[test]
    fn attachment_change_forces_resync() {
        let mut rd = device();
        let fb = color_fb(8, 8);
        rd.set_draw_framebuffer(Some(fb.clone()));
        rd.before_primitive();
        drain(&mut rd);

        fb.set(AttachmentPoint::Color(1), Some(Texture::render_target("c1", 8, 8, TextureFormat::Rgba8)));
        rd.before_primitive();
        assert_eq!(
            drain(&mut rd),
            vec![NativeCall::DrawBuffers(vec![ColorBuffer::Color(0), ColorBuffer::Color(1)])]
        );
    }

    #[test]
    fn framebuffer_swapped_out_before_draw_never_syncs() {
        let mut rd = device();
        rd.set_draw_framebuffer(Some(color_fb(8, 8)));
        rd.set_draw_framebuffer(None);
        rd.before_primitive();
        assert!(draw_buffer_calls(&drain(&mut rd)).is_empty());
    }

    #[test]
    fn unbinding_restores_legacy_draw_buffer() {
        let mut rd = device();
        rd.set_draw_framebuffer(Some(color_fb(8, 8)));
        drain(&mut rd);
        rd.set_draw_framebuffer(None);
        let calls = drain(&mut rd);
        assert_eq!(
            &calls[..2],
            &[
                NativeCall::BindFramebuffer { target: FramebufferTarget::Draw, framebuffer: None },
                NativeCall::DrawBuffer(ColorBuffer::Back),
            ]
        );
    }

    #[test]
    fn depth_only_read_framebuffer_reads_none() {
        let mut rd = device();
        rd.set_read_framebuffer(Some(depth_fb(4, 4)));
        drain(&mut rd);
        rd.before_primitive();
        assert_eq!(drain(&mut rd), vec![NativeCall::ReadBuffer(ColorBuffer::None)]);
    }

    #[test]
    fn back_read_buffer_maps_to_first_attachment() {
        let mut rd = device();
        rd.set_read_framebuffer(Some(color_fb(4, 4)));
        drain(&mut rd);
        rd.before_primitive();
        assert_eq!(drain(&mut rd), vec![NativeCall::ReadBuffer(ColorBuffer::Color(0))]);
    }

    // ── y inversion ───────────────────────────────────────────────────────

    #[test]
    fn offscreen_target_clears_invert_y_and_reapplies_dependents() {
        let mut rd = device();
        rd.set_cull_face(CullFace::Back);
        drain(&mut rd);

        rd.set_draw_framebuffer(Some(color_fb(64, 64)));
        assert!(!rd.state().matrices.invert_y);
        let calls = drain(&mut rd);
        assert!(calls.iter().any(|c| matches!(c, NativeCall::LoadProjectionMatrix(_))));
        assert!(calls.iter().any(|c| matches!(c, NativeCall::Viewport { .. })));
        assert!(calls.contains(&NativeCall::CullFace(CullFace::Front)));
        assert!(calls.iter().any(|c| matches!(c, NativeCall::StencilOpSeparate { .. })));

        rd.set_draw_framebuffer(None);
        assert!(rd.state().matrices.invert_y);
        assert!(drain(&mut rd).contains(&NativeCall::CullFace(CullFace::Back)));
    }

    #[test]
    fn offscreen_viewport_is_not_flipped() {
        let mut rd = device();
        rd.set_draw_framebuffer(Some(color_fb(64, 64)));
        drain(&mut rd);
        rd.set_viewport(Rect2D::new(0.0, 8.0, 16.0, 16.0));
        assert_eq!(drain(&mut rd), vec![NativeCall::Viewport { x: 0, y: 8, width: 16, height: 16 }]);
    }

    #[test]
    fn push_state_with_framebuffer_resets_viewport_and_clip() {
        let mut rd = device();
        rd.set_clip_2d(Rect2D::new(0.0, 0.0, 5.0, 5.0));
        let fb = color_fb(32, 16);
        rd.push_state_with(Some(fb.clone()));
        assert_eq!(rd.state().viewport, Rect2D::from_size(32.0, 16.0));
        assert!(!rd.state().use_clip_2d);
        assert!(rd.draw_framebuffer().is_some_and(|f| Rc::ptr_eq(f, &fb)));
        assert!(rd.read_framebuffer().is_some());
        rd.pop_state();
        assert!(rd.draw_framebuffer().is_none());
        assert!(rd.state().matrices.invert_y);
        assert!(rd.state().use_clip_2d);
        assert_eq!(rd.state().viewport, Rect2D::from_size(640.0, 480.0));
    }

    #[test]
    fn push_2d_sets_pixel_space_state() {
        let mut rd = device();
        rd.push_2d_full();
        assert!(!rd.state().depth_write);
        assert_eq!(rd.state().cull_face, CullFace::None);
        rd.pop_2d();
        assert!(rd.state().depth_write);
        assert_eq!(rd.state().cull_face, CullFace::Back);
    }

    // ── clear ─────────────────────────────────────────────────────────────

    #[test]
    fn clear_forces_writes_and_restores_them() {
        let mut rd = device();
        rd.set_depth_write(false);
        drain(&mut rd);
        rd.clear(true, true, false);
        assert_eq!(
            drain(&mut rd),
            vec![
                NativeCall::DepthMask(true),
                NativeCall::Clear { color: true, depth: true, stencil: false },
                NativeCall::DepthMask(false),
            ]
        );
        assert!(!rd.state().depth_write);
    }

    #[test]
    fn clear_syncs_draw_buffers_first() {
        let mut rd = device();
        rd.set_draw_framebuffer(Some(color_fb(8, 8)));
        drain(&mut rd);
        rd.clear_all();
        let calls = drain(&mut rd);
        assert_eq!(calls[0], NativeCall::DrawBuffers(vec![ColorBuffer::Color(0)]));
    }

    #[test]
    #[should_panic(expected = "Missing attachment")]
    fn clearing_empty_framebuffer_panics_in_debug() {
        let mut rd = device();
        rd.set_draw_framebuffer(Some(Framebuffer::new("empty")));
        rd.clear_all();
    }

    // ── screenshot ────────────────────────────────────────────────────────

    #[test]
    fn screenshot_matches_viewport_size() {
        let mut rd = device();
        rd.set_viewport(Rect2D::from_size(20.0, 10.0));
        let img = rd.screenshot().unwrap();
        assert_eq!(img.dimensions(), (20, 10));
    }

    #[test]
    fn screenshot_addresses_the_read_target() {
        let mut rd = device();
        rd.set_viewport(Rect2D::new(0.0, 10.0, 20.0, 10.0));

        rd.screenshot().unwrap();
        rd.set_read_framebuffer(Some(color_fb(64, 64)));
        rd.screenshot().unwrap();
        rd.set_read_framebuffer(None);
        rd.set_draw_framebuffer(Some(color_fb(64, 64)));
        rd.set_viewport(Rect2D::new(0.0, 10.0, 20.0, 10.0));
        rd.screenshot().unwrap();

        assert_eq!(
            rd.api_mut().reads(),
            &[
                Rect2D::new(0.0, 460.0, 20.0, 10.0),
                Rect2D::new(0.0, 10.0, 20.0, 10.0),
                Rect2D::new(0.0, 460.0, 20.0, 10.0),
            ]
        );
    }
}
