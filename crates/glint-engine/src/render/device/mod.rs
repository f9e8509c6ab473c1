//! The render state cache.
//!
//! [`RenderDevice`] owns the current [`RenderState`] and a stack of saved
//! snapshots. Every setter compares the requested value against the cached one,
//! does nothing when they match, and otherwise emits the minimal sequence of
//! [`NativeCall`]s to the backend.
//!
//! `push_state` saves the current snapshot and clears the two delta markers
//! (highest texture unit touched, matrices changed) on the working copy.
//! `pop_state` replays setters only for the fields those markers say may differ,
//! so a pop costs O(changed state).
//!
//! Contract violations (bad unit index, unbalanced push/pop, nested frames) are
//! debug assertions. Release builds log them and leave the state untouched.

mod draw;
mod raster;
mod target;
mod texture;
mod transform;

use std::time::Instant;

use super::caps::{Caps, StencilSupport};
use crate::coords::Rect2D;
use super::native::{Capability, NativeApi, NativeCall};
use super::resource::ResourceId;
use super::state::RenderState;
use super::stats::RenderStats;
use super::types::{ColorBuffer, Compare, FramebufferTarget};

/// Last draw/read buffer selection applied to a bound framebuffer.
type SyncStamp = (ResourceId, u64, ColorBuffer);

/// Window size and viewport replaced by [`RenderDevice::make_window_current`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindowBinding {
    size: (u32, u32),
    viewport: Rect2D,
}

pub struct RenderDevice<A: NativeApi> {
    api: A,
    caps: Caps,

    state: RenderState,
    stack: Vec<RenderState>,

    stats: RenderStats,
    window_size: (u32, u32),

    // Native shadows for state whose logical value does not map 1:1.
    native_depth_enabled: Option<bool>,
    native_depth_func: Option<Compare>,
    active_texture: Option<usize>,
    draw_sync: Option<SyncStamp>,
    read_sync: Option<SyncStamp>,

    begin_end_frame: i32,
    swap_pending: bool,
    swap_automatically: bool,
    last_frame: Instant,
}

impl<A: NativeApi> RenderDevice<A> {
    /// Creates a device for a `width` x `height` window surface and applies the
    /// default state.
    pub fn new(api: A, width: u32, height: u32) -> Self {
        let caps = api.caps().clamped();
        if caps.stencil == StencilSupport::SingleSided {
            log::warn!("two-sided stencil unsupported; back-face stencil ops are ignored");
        }
        if !caps.framebuffer_objects {
            log::warn!("framebuffer objects unsupported; off-screen rendering disabled");
        }

        let mut rd = Self {
            api,
            caps,
            state: RenderState::new(width, height),
            stack: Vec::new(),
            stats: RenderStats::default(),
            window_size: (width, height),
            native_depth_enabled: None,
            native_depth_func: None,
            active_texture: None,
            draw_sync: None,
            read_sync: None,
            begin_end_frame: 0,
            swap_pending: false,
            swap_automatically: true,
            last_frame: Instant::now(),
        };
        rd.reset_state();
        log::info!(
            "render device ready ({} image units, {} fixed units, stencil {:?})",
            rd.caps.num_textures,
            rd.caps.num_texture_units,
            rd.caps.stencil
        );
        rd
    }

    #[inline]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[inline]
    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    #[inline]
    pub fn caps(&self) -> &Caps {
        &self.caps
    }

    /// The current snapshot.
    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[inline]
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Depth of the push/pop stack.
    #[inline]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Updates the window surface size used while no framebuffer is bound.
    ///
    /// Window rectangles are flipped against the height, so a bound window
    /// target gets its viewport and clip re-emitted.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        let viewport = self.state.viewport;
        self.retarget_window(width, height, viewport);
    }

    /// Points the device at a `width` x `height` window and resets the
    /// viewport to cover all of it. The returned binding restores the
    /// replaced size and viewport through [`Self::restore_window`].
    pub fn make_window_current(&mut self, width: u32, height: u32) -> WindowBinding {
        let previous = WindowBinding { size: self.window_size, viewport: self.state.viewport };
        self.retarget_window(width, height, Rect2D::from_size(width as f32, height as f32));
        previous
    }

    pub fn restore_window(&mut self, binding: WindowBinding) {
        let (width, height) = binding.size;
        self.retarget_window(width, height, binding.viewport);
    }

    fn retarget_window(&mut self, width: u32, height: u32, viewport: Rect2D) {
        let resized = (width, height) != self.window_size;
        self.window_size = (width, height);
        let reflip = resized && self.state.draw_framebuffer.is_none();
        if reflip || viewport != self.state.viewport {
            self.force_set_viewport(viewport);
        }
        if reflip && self.state.use_clip_2d {
            let clip = self.state.clip_2d;
            self.state.clip_2d = Rect2D::inf();
            self.set_clip_2d(clip);
        }
    }

    #[inline]
    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    // ── emission ──────────────────────────────────────────────────────────

    fn emit(&mut self, call: NativeCall) {
        if call.is_major() {
            self.stats.major_native_changes += 1;
        } else {
            self.stats.minor_native_changes += 1;
        }
        self.api.submit(call);
    }

    #[inline]
    fn minor_state_change(&mut self) {
        self.stats.minor_state_changes += 1;
    }

    #[inline]
    fn major_state_change(&mut self) {
        self.stats.major_state_changes += 1;
    }

    fn set_enabled(&mut self, cap: Capability, on: bool) {
        self.emit(if on { NativeCall::Enable(cap) } else { NativeCall::Disable(cap) });
    }

    // ── reset ─────────────────────────────────────────────────────────────

    /// Replaces the current state with the defaults and forces every piece of
    /// it onto the backend. Clears the push/pop stack.
    pub fn reset_state(&mut self) {
        let (w, h) = self.window_size;
        self.stack.clear();
        self.state = RenderState::new(w, h);
        self.native_depth_enabled = None;
        self.native_depth_func = None;
        self.active_texture = None;
        self.draw_sync = None;
        self.read_sync = None;

        let s = self.state.clone();

        self.emit(NativeCall::BindFramebuffer { target: FramebufferTarget::Draw, framebuffer: None });
        self.emit(NativeCall::BindFramebuffer { target: FramebufferTarget::Read, framebuffer: None });
        self.emit(NativeCall::DrawBuffer(s.draw_buffer));
        self.emit(NativeCall::ReadBuffer(s.read_buffer));

        self.force_set_viewport(s.viewport);
        self.set_enabled(Capability::ScissorTest, false);

        self.emit(NativeCall::DepthMask(s.depth_write));
        self.emit(NativeCall::ColorMask { rgb: s.color_write, alpha: s.alpha_write });
        self.apply_depth_test();

        self.set_enabled(Capability::StencilTest, false);
        self.force_set_stencil_test(s.stencil.test, s.stencil.reference);
        self.force_set_stencil_op(
            [s.stencil.front_fail, s.stencil.front_zfail, s.stencil.front_zpass],
            [s.stencil.back_fail, s.stencil.back_zfail, s.stencil.back_zpass],
        );
        self.emit(NativeCall::ClearStencil(s.stencil.clear));
        self.emit(NativeCall::ClearDepth(s.depth_clear));
        self.emit(NativeCall::ClearColor(s.color_clear));

        self.set_enabled(Capability::AlphaTest, false);
        self.set_enabled(Capability::Blend, false);
        self.set_enabled(Capability::ColorLogicOp, false);
        self.set_enabled(Capability::PolygonOffsetFill, false);
        self.set_enabled(Capability::FramebufferSrgb, s.srgb_conversion);
        self.force_set_cull_face(s.cull_face);

        self.emit(NativeCall::LineWidth(s.line_width));
        self.emit(NativeCall::PointSize(s.point_size));
        self.emit(NativeCall::ShadeModel(s.shade_mode));
        self.emit(NativeCall::PolygonMode(s.render_mode));
        self.emit(NativeCall::DepthRange { near: s.depth_range.0, far: s.depth_range.1 });

        for unit in 0..self.caps.num_textures {
            self.select_texture_unit(unit);
            self.emit(NativeCall::BindTexture(None));
        }
        for unit in 0..self.caps.num_texture_units {
            let tu = s.texture_units[unit].clone();
            self.select_texture_unit(unit);
            self.emit(NativeCall::DisableAllTextures(unit));
            self.emit(NativeCall::TexEnvCombine(tu.combine_mode));
            self.emit(NativeCall::TextureMatrix(tu.texture_matrix));
            self.emit(NativeCall::TextureLodBias(tu.lod_bias));
        }
        for unit in 0..self.caps.num_texture_coords {
            self.emit(NativeCall::MultiTexCoord { unit, coord: s.texture_units[unit].tex_coord });
        }

        self.force_set_projection_matrix(s.matrices.projection);
        self.load_model_view();
    }

    // ── push / pop ────────────────────────────────────────────────────────

    /// Saves the current state. Must be balanced by [`pop_state`](Self::pop_state).
    pub fn push_state(&mut self) {
        self.stack.push(self.state.clone());
        self.state.matrices.changed = false;
        self.state.highest_texture_unit_changed = None;
        self.stats.push_states += 1;
    }

    /// Restores the state saved by the matching [`push_state`](Self::push_state).
    pub fn pop_state(&mut self) {
        debug_assert!(!self.stack.is_empty(), "pop_state without a matching push_state");
        let Some(saved) = self.stack.pop() else {
            log::error!("pop_state without a matching push_state; ignored");
            return;
        };
        self.set_state(saved);
    }

    /// Applies `new` by replaying only the setters that may differ.
    fn set_state(&mut self, new: RenderState) {
        // Framebuffer first: it can change the viewport convention.
        if !super::state::same_handle(&self.state.draw_framebuffer, &new.draw_framebuffer) {
            self.set_draw_framebuffer(new.draw_framebuffer.clone());
            // Invalidate so the viewport below is always re-sent for the new target.
            self.state.viewport = Rect2D::new(-1.0, -1.0, -1.0, -1.0);
        }
        if !super::state::same_handle(&self.state.read_framebuffer, &new.read_framebuffer) {
            self.set_read_framebuffer(new.read_framebuffer.clone());
        }

        self.set_viewport(new.viewport);
        if new.use_clip_2d {
            self.set_clip_2d(new.clip_2d);
        } else {
            self.set_clip_2d(Rect2D::inf());
        }

        self.set_depth_write(new.depth_write);
        self.set_color_write(new.color_write);
        self.set_alpha_write(new.alpha_write);

        self.set_draw_buffer(new.draw_buffer);
        self.set_read_buffer(new.read_buffer);

        self.set_shade_mode(new.shade_mode);
        self.set_depth_test(new.depth_test);

        if new.stencil != self.state.stencil {
            let st = new.stencil;
            self.set_stencil_constant(st.reference);
            self.set_stencil_test(st.test);
            self.set_stencil_op(
                st.front_fail, st.front_zfail, st.front_zpass,
                st.back_fail, st.back_zfail, st.back_zpass,
            );
            self.set_stencil_clear_value(st.clear);
        }

        self.set_depth_clear_value(new.depth_clear);
        self.set_color_clear_value(new.color_clear);
        self.set_alpha_test(new.alpha_test, new.alpha_reference);
        self.set_blend_func(new.blend.src, new.blend.dst, new.blend.eq);
        self.set_logic_op(new.logic_op);
        self.set_render_mode(new.render_mode);
        self.set_polygon_offset(new.polygon_offset);
        self.set_line_width(new.line_width);
        self.set_point_size(new.point_size);

        if let Some(highest) = self.state.highest_texture_unit_changed {
            for unit in (0..=highest).rev() {
                self.restore_texture_unit(unit, &new);
            }
        }

        self.set_cull_face(new.cull_face);
        self.set_srgb_conversion(new.srgb_conversion);
        self.set_depth_range(new.depth_range.0, new.depth_range.1);

        if self.state.matrices.changed {
            let m = new.matrices;
            if m.camera_to_world != self.state.matrices.camera_to_world {
                self.set_camera_to_world_matrix(m.camera_to_world);
            }
            if m.object_to_world != self.state.matrices.object_to_world {
                self.set_object_to_world_matrix(m.object_to_world);
            }
            self.set_projection_matrix(m.projection);
        }

        // Adopt the restored snapshot's deltas relative to its own push.
        self.state.highest_texture_unit_changed = new.highest_texture_unit_changed;
        self.state.matrices.changed = new.matrices.changed;
    }

    // ── frame bracketing ──────────────────────────────────────────────────

    /// Starts a frame. Performs the swap left pending by the previous `end_frame`.
    pub fn begin_frame(&mut self) {
        if self.swap_pending {
            self.swap_buffers();
        }
        self.stats.reset();

        self.begin_end_frame += 1;
        debug_assert_eq!(self.begin_end_frame, 1, "nested begin_frame");
    }

    /// Ends a frame. The swap is deferred to the next `begin_frame` when swapping
    /// automatically.
    pub fn end_frame(&mut self) {
        self.begin_end_frame -= 1;
        debug_assert_eq!(self.begin_end_frame, 0, "end_frame without begin_frame");

        self.swap_pending = self.swap_automatically;

        debug_assert!(self.stack.is_empty(), "missing pop_state or pop_2d before end_frame");

        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_frame).as_secs_f64();
        self.stats.end_frame(dt);
        self.last_frame = now;
    }

    /// True between `begin_frame` and `end_frame`.
    #[inline]
    pub fn in_frame(&self) -> bool {
        self.begin_end_frame > 0
    }

    #[inline]
    pub fn swap_pending(&self) -> bool {
        self.swap_pending
    }

    /// Presents the window surface now.
    pub fn swap_buffers(&mut self) {
        self.swap_pending = false;
        self.emit(NativeCall::SwapBuffers);
    }

    /// When off, `end_frame` never schedules a swap and the caller presents with
    /// [`swap_buffers`](Self::swap_buffers). Turning it either way flushes a
    /// pending swap first.
    pub fn set_swap_buffers_automatically(&mut self, automatic: bool) {
        if automatic == self.swap_automatically {
            return;
        }
        if self.swap_pending {
            self.swap_buffers();
        }
        self.swap_automatically = automatic;
    }

    #[inline]
    pub fn swap_buffers_automatically(&self) -> bool {
        self.swap_automatically
    }

    /// Submits all outstanding native work.
    pub fn flush(&mut self) {
        self.emit(NativeCall::Flush);
    }

    /// Flushes outstanding work before the backend is torn down.
    pub fn cleanup(&mut self) {
        if !self.stack.is_empty() {
            log::warn!("render device cleaned up with {} pushed states", self.stack.len());
            self.stack.clear();
        }
        self.flush();
        log::info!("render device cleaned up");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::render::native::RecordingApi;

    pub fn device_with(caps: Caps) -> RenderDevice<RecordingApi> {
        let mut rd = RenderDevice::new(RecordingApi::new(caps), 640, 480);
        rd.api_mut().clear();
        rd
    }

    pub fn device() -> RenderDevice<RecordingApi> {
        device_with(Caps::default())
    }

    /// Returns the calls emitted since the last drain.
    pub fn drain(rd: &mut RenderDevice<RecordingApi>) -> Vec<NativeCall> {
        rd.api_mut().take()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::coords::Rect2D;

    // ── window size ───────────────────────────────────────────────────────

    #[test]
    fn window_resize_reflips_viewport_and_clip() {
        let mut rd = device();
        rd.set_viewport(Rect2D::new(0.0, 0.0, 100.0, 100.0));
        rd.set_clip_2d(Rect2D::new(0.0, 0.0, 10.0, 10.0));
        drain(&mut rd);

        rd.set_window_size(640, 400);
        assert_eq!(
            drain(&mut rd),
            vec![
                NativeCall::Viewport { x: 0, y: 300, width: 100, height: 100 },
                NativeCall::Scissor { x: 0, y: 390, width: 10, height: 10 },
            ]
        );

        rd.set_window_size(640, 400);
        assert!(drain(&mut rd).is_empty());
    }

    #[test]
    fn making_a_smaller_window_current_covers_it() {
        let mut rd = RenderDevice::new(crate::render::native::RecordingApi::new(Caps::default()), 800, 800);
        drain(&mut rd);

        let binding = rd.make_window_current(400, 400);
        assert_eq!(rd.state().viewport, Rect2D::from_size(400.0, 400.0));
        assert_eq!(drain(&mut rd), vec![NativeCall::Viewport { x: 0, y: 0, width: 400, height: 400 }]);

        rd.restore_window(binding);
        assert_eq!(rd.window_size(), (800, 800));
        assert_eq!(rd.state().viewport, Rect2D::from_size(800.0, 800.0));
        assert_eq!(drain(&mut rd), vec![NativeCall::Viewport { x: 0, y: 0, width: 800, height: 800 }]);
    }

    #[test]
    fn making_a_window_current_resets_a_narrowed_viewport() {
        let mut rd = device();
        rd.set_viewport(Rect2D::new(10.0, 10.0, 50.0, 50.0));
        drain(&mut rd);

        rd.make_window_current(640, 480);
        assert_eq!(rd.state().viewport, Rect2D::from_size(640.0, 480.0));
        assert_eq!(drain(&mut rd), vec![NativeCall::Viewport { x: 0, y: 0, width: 640, height: 480 }]);

        rd.make_window_current(640, 480);
        assert!(drain(&mut rd).is_empty());
    }

    // ── push / pop ────────────────────────────────────────────────────────

    #[test]
    fn pop_restores_viewport() {
        let mut rd = device();
        let before = rd.state().viewport;
        rd.push_state();
        rd.set_viewport(Rect2D::new(10.0, 20.0, 30.0, 40.0));
        rd.pop_state();
        assert_eq!(rd.state().viewport, before);
        assert_eq!(rd.stack_depth(), 0);
    }

    #[test]
    fn push_counts_and_clears_delta_markers() {
        let mut rd = device();
        rd.push_state();
        assert_eq!(rd.stats().push_states, 1);
        assert_eq!(rd.state().highest_texture_unit_changed, None);
        assert!(!rd.state().matrices.changed);
        rd.pop_state();
    }

    #[test]
    fn push_pop_without_changes_emits_nothing() {
        let mut rd = device();
        rd.push_state();
        rd.pop_state();
        assert!(drain(&mut rd).is_empty());
    }

    #[test]
    fn pop_restores_outer_delta_markers() {
        let mut rd = device();
        rd.push_state();
        rd.set_texture_lod_bias(1, 0.5);
        rd.push_state();
        rd.set_texture_lod_bias(0, 0.25);
        rd.pop_state();
        assert_eq!(rd.state().highest_texture_unit_changed, Some(1));
        rd.pop_state();
        assert_eq!(rd.state().texture_units[1].lod_bias, 0.0);
    }

    #[test]
    #[should_panic(expected = "pop_state without a matching push_state")]
    fn unbalanced_pop_panics_in_debug() {
        let mut rd = device();
        rd.pop_state();
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn swap_is_deferred_to_next_begin_frame() {
        let mut rd = device();
        rd.begin_frame();
        rd.end_frame();
        assert!(rd.swap_pending());
        assert!(!drain(&mut rd).contains(&NativeCall::SwapBuffers));

        rd.begin_frame();
        assert_eq!(drain(&mut rd), vec![NativeCall::SwapBuffers]);
        rd.end_frame();
    }

    #[test]
    fn manual_swapping_never_schedules() {
        let mut rd = device();
        rd.set_swap_buffers_automatically(false);
        rd.begin_frame();
        rd.end_frame();
        assert!(!rd.swap_pending());
        rd.begin_frame();
        assert!(drain(&mut rd).is_empty());
        rd.end_frame();
    }

    #[test]
    fn toggling_swap_mode_flushes_pending_swap() {
        let mut rd = device();
        rd.begin_frame();
        rd.end_frame();
        drain(&mut rd);
        rd.set_swap_buffers_automatically(false);
        assert_eq!(drain(&mut rd), vec![NativeCall::SwapBuffers]);
        assert!(!rd.swap_pending());
    }

    #[test]
    #[should_panic(expected = "nested begin_frame")]
    fn nested_begin_frame_panics_in_debug() {
        let mut rd = device();
        rd.begin_frame();
        rd.begin_frame();
    }

    #[test]
    #[should_panic(expected = "missing pop_state")]
    fn end_frame_with_pushed_state_panics_in_debug() {
        let mut rd = device();
        rd.begin_frame();
        rd.push_state();
        rd.end_frame();
    }

    #[test]
    fn begin_frame_resets_counters() {
        let mut rd = device();
        rd.set_line_width(3.0);
        assert!(rd.stats().native_calls() > 0);
        rd.begin_frame();
        assert_eq!(rd.stats().native_calls(), 0);
        rd.end_frame();
    }

    // ── reset ─────────────────────────────────────────────────────────────

    #[test]
    fn reset_applies_defaults_natively() {
        let mut rd = device();
        rd.reset_state();
        let calls = drain(&mut rd);
        assert!(calls.contains(&NativeCall::DepthFunc(Compare::LEqual)));
        assert!(calls.contains(&NativeCall::Disable(Capability::Blend)));
        assert!(calls.contains(&NativeCall::DrawBuffer(ColorBuffer::Back)));
    }
}
