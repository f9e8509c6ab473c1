//! Depth, stencil, blend and rasterizer setters.

use crate::coords::Color4;
use crate::render::caps::StencilSupport;
use crate::render::native::{Capability, NativeApi, NativeCall, StencilFace};
use crate::render::types::{
    BlendEq, BlendFunc, Compare, CullFace, LogicOp, RenderMode, ShadeMode, StencilOp,
};

use super::RenderDevice;

impl<A: NativeApi> RenderDevice<A> {
    // ── depth ─────────────────────────────────────────────────────────────

    /// Sets the depth comparison.
    ///
    /// `AlwaysPass` is re-evaluated even when already set: the native depth test
    /// is switched off only while depth writes are also off, and writes may have
    /// changed since.
    pub fn set_depth_test(&mut self, test: Compare) {
        if test == Compare::Current {
            return;
        }
        if test == self.state.depth_test && test != Compare::AlwaysPass {
            return;
        }
        self.minor_state_change();
        self.state.depth_test = test;
        self.apply_depth_test();
    }

    /// Realizes the cached depth test and write mask against the native shadow.
    pub(super) fn apply_depth_test(&mut self) {
        let test = self.state.depth_test;
        let enable = !(test == Compare::AlwaysPass && !self.state.depth_write);

        if self.native_depth_enabled != Some(enable) {
            self.set_enabled(Capability::DepthTest, enable);
            self.native_depth_enabled = Some(enable);
        }
        if enable && self.native_depth_func != Some(test) {
            self.emit(NativeCall::DepthFunc(test));
            self.native_depth_func = Some(test);
        }
    }

    pub fn set_depth_write(&mut self, write: bool) {
        if write == self.state.depth_write {
            return;
        }
        self.minor_state_change();
        self.emit(NativeCall::DepthMask(write));
        self.state.depth_write = write;

        // Writes need the native test enabled, even when it always passes.
        if write && self.state.depth_test == Compare::AlwaysPass {
            self.apply_depth_test();
        }
    }

    pub fn set_color_write(&mut self, write: bool) {
        if write == self.state.color_write {
            return;
        }
        self.minor_state_change();
        self.state.color_write = write;
        self.emit(NativeCall::ColorMask { rgb: write, alpha: self.state.alpha_write });
    }

    pub fn set_alpha_write(&mut self, write: bool) {
        if write == self.state.alpha_write {
            return;
        }
        self.minor_state_change();
        self.state.alpha_write = write;
        self.emit(NativeCall::ColorMask { rgb: self.state.color_write, alpha: write });
    }

    pub fn set_depth_range(&mut self, near: f32, far: f32) {
        if (near, far) == self.state.depth_range {
            return;
        }
        self.minor_state_change();
        self.state.depth_range = (near, far);
        self.emit(NativeCall::DepthRange { near, far });
    }

    pub fn set_depth_clear_value(&mut self, depth: f32) {
        if depth == self.state.depth_clear {
            return;
        }
        self.minor_state_change();
        self.state.depth_clear = depth;
        self.emit(NativeCall::ClearDepth(depth));
    }

    pub fn set_color_clear_value(&mut self, color: Color4) {
        if color == self.state.color_clear {
            return;
        }
        self.minor_state_change();
        self.state.color_clear = color;
        self.emit(NativeCall::ClearColor(color));
    }

    // ── stencil ───────────────────────────────────────────────────────────

    /// Sets the stencil comparison.
    ///
    /// `AlwaysPass` disables the native stencil test only while every op is
    /// `Keep`; the ops share its enable bit.
    pub fn set_stencil_test(&mut self, test: Compare) {
        if test == Compare::Current || test == self.state.stencil.test {
            return;
        }
        self.minor_state_change();

        let two_sided = self.caps.stencil.two_sided();
        if test == Compare::AlwaysPass {
            if self.state.stencil.ops_are_keep(two_sided) {
                self.set_enabled(Capability::StencilTest, false);
            } else {
                self.force_set_stencil_test(test, self.state.stencil.reference);
            }
        } else {
            self.set_enabled(Capability::StencilTest, true);
            self.force_set_stencil_test(test, self.state.stencil.reference);
        }
        self.state.stencil.test = test;
    }

    /// Sets the stencil reference value.
    pub fn set_stencil_constant(&mut self, reference: i32) {
        if reference == self.state.stencil.reference {
            return;
        }
        self.minor_state_change();
        self.state.stencil.reference = reference;

        let st = self.state.stencil;
        let active = st.test != Compare::AlwaysPass || !st.ops_are_keep(self.caps.stencil.two_sided());
        if active {
            self.force_set_stencil_test(st.test, reference);
        }
    }

    pub fn set_stencil_clear_value(&mut self, value: i32) {
        if value == self.state.stencil.clear {
            return;
        }
        self.minor_state_change();
        self.state.stencil.clear = value;
        self.emit(NativeCall::ClearStencil(value));
    }

    /// Emits the stencil function for both faces.
    pub(super) fn force_set_stencil_test(&mut self, test: Compare, reference: i32) {
        match self.caps.stencil {
            StencilSupport::TwoSidedExt => {
                self.emit(NativeCall::ActiveStencilFace(StencilFace::Back));
                self.emit(NativeCall::StencilFunc { func: test, reference });
                self.emit(NativeCall::ActiveStencilFace(StencilFace::Front));
                self.emit(NativeCall::StencilFunc { func: test, reference });
            }
            StencilSupport::SeparateAti => {
                self.emit(NativeCall::StencilFuncSeparate { front: test, back: test, reference });
            }
            StencilSupport::SingleSided => {
                self.emit(NativeCall::StencilFunc { func: test, reference });
            }
        }
    }

    /// Same stencil ops for both faces.
    pub fn set_stencil_op_both(&mut self, fail: StencilOp, zfail: StencilOp, zpass: StencilOp) {
        self.set_stencil_op(fail, zfail, zpass, fail, zfail, zpass);
    }

    /// Sets independent front and back stencil ops.
    ///
    /// Back ops only take part in change detection when the backend supports
    /// two-sided stencil; otherwise they are stored but not applied.
    #[allow(clippy::too_many_arguments)]
    pub fn set_stencil_op(
        &mut self,
        front_fail: StencilOp,
        front_zfail: StencilOp,
        front_zpass: StencilOp,
        back_fail: StencilOp,
        back_zfail: StencilOp,
        back_zpass: StencilOp,
    ) {
        let st = self.state.stencil;
        let pick = |op: StencilOp, cur: StencilOp| if op == StencilOp::Current { cur } else { op };
        let front = [
            pick(front_fail, st.front_fail),
            pick(front_zfail, st.front_zfail),
            pick(front_zpass, st.front_zpass),
        ];
        let back = [
            pick(back_fail, st.back_fail),
            pick(back_zfail, st.back_zfail),
            pick(back_zpass, st.back_zpass),
        ];

        let two_sided = self.caps.stencil.two_sided();
        if !two_sided && front != back {
            log::debug!("single-sided stencil: back ops {back:?} ignored");
        }

        let front_changed = front != [st.front_fail, st.front_zfail, st.front_zpass];
        let back_changed = back != [st.back_fail, st.back_zfail, st.back_zpass];
        if !(front_changed || (two_sided && back_changed)) {
            return;
        }
        self.minor_state_change();
        self.force_set_stencil_op(front, back);

        let s = &mut self.state.stencil;
        [s.front_fail, s.front_zfail, s.front_zpass] = front;
        [s.back_fail, s.back_zfail, s.back_zpass] = back;
        let st = *s;

        if st.test == Compare::AlwaysPass {
            if st.ops_are_keep(two_sided) {
                self.set_enabled(Capability::StencilTest, false);
            } else {
                self.set_enabled(Capability::StencilTest, true);
                self.force_set_stencil_test(Compare::AlwaysPass, st.reference);
            }
        }
    }

    /// Emits stencil ops. Front and back swap when drawing off-screen, where
    /// the winding convention is reversed.
    pub(super) fn force_set_stencil_op(&mut self, front: [StencilOp; 3], back: [StencilOp; 3]) {
        let (front, back) = if self.state.matrices.invert_y { (front, back) } else { (back, front) };
        let op = |ops: [StencilOp; 3]| NativeCall::StencilOp { fail: ops[0], zfail: ops[1], zpass: ops[2] };
        let sep = |face, ops: [StencilOp; 3]| NativeCall::StencilOpSeparate {
            face,
            fail: ops[0],
            zfail: ops[1],
            zpass: ops[2],
        };

        match self.caps.stencil {
            StencilSupport::TwoSidedExt => {
                self.emit(NativeCall::ActiveStencilFace(StencilFace::Back));
                self.emit(op(back));
                self.emit(NativeCall::ActiveStencilFace(StencilFace::Front));
                self.emit(op(front));
            }
            StencilSupport::SeparateAti => {
                self.emit(sep(StencilFace::Front, front));
                self.emit(sep(StencilFace::Back, back));
            }
            StencilSupport::SingleSided => {
                self.emit(op(front));
            }
        }
    }

    // ── blending ──────────────────────────────────────────────────────────

    /// Sets the blend function. `(One, Zero)` with `Add` or `Subtract` disables
    /// blending instead of issuing a blend function.
    pub fn set_blend_func(&mut self, src: BlendFunc, dst: BlendFunc, eq: BlendEq) {
        let cur = self.state.blend;
        let src = if src == BlendFunc::Current { cur.src } else { src };
        let dst = if dst == BlendFunc::Current { cur.dst } else { dst };
        let eq = if eq == BlendEq::Current { cur.eq } else { eq };
        if (src, dst, eq) == (cur.src, cur.dst, cur.eq) {
            return;
        }
        self.minor_state_change();
        self.state.blend.src = src;
        self.state.blend.dst = dst;
        self.state.blend.eq = eq;

        if self.state.blend.is_identity() {
            self.set_enabled(Capability::Blend, false);
            return;
        }
        self.set_enabled(Capability::Blend, true);
        self.emit(NativeCall::BlendFunc { src, dst });
        if self.caps.blend_equation {
            self.emit(NativeCall::BlendEquation(eq));
        } else {
            debug_assert_eq!(eq, BlendEq::Add, "blend equations unsupported by this backend");
        }
    }

    pub fn set_alpha_test(&mut self, test: Compare, reference: f32) {
        let test = if test == Compare::Current { self.state.alpha_test } else { test };
        if test == self.state.alpha_test && reference == self.state.alpha_reference {
            return;
        }
        self.minor_state_change();
        self.state.alpha_test = test;
        self.state.alpha_reference = reference;
        if test == Compare::AlwaysPass {
            self.set_enabled(Capability::AlphaTest, false);
        } else {
            self.set_enabled(Capability::AlphaTest, true);
            self.emit(NativeCall::AlphaFunc { func: test, reference });
        }
    }

    pub fn set_logic_op(&mut self, op: LogicOp) {
        if op == LogicOp::Current || op == self.state.logic_op {
            return;
        }
        self.minor_state_change();
        self.state.logic_op = op;
        if op == LogicOp::Copy {
            self.set_enabled(Capability::ColorLogicOp, false);
        } else {
            self.set_enabled(Capability::ColorLogicOp, true);
            self.emit(NativeCall::LogicOp(op));
        }
    }

    // ── rasterizer ────────────────────────────────────────────────────────

    /// Sets the culled face. Front and back are swapped natively while drawing
    /// off-screen so the visible winding stays the same for every target.
    pub fn set_cull_face(&mut self, face: CullFace) {
        if face == CullFace::Current || face == self.state.cull_face {
            return;
        }
        self.force_set_cull_face(face);
    }

    pub(super) fn force_set_cull_face(&mut self, face: CullFace) {
        self.minor_state_change();
        self.state.cull_face = face;
        if face == CullFace::None {
            self.set_enabled(Capability::CullFace, false);
        } else {
            self.set_enabled(Capability::CullFace, true);
            let native = if self.state.matrices.invert_y { face } else { face.flipped() };
            self.emit(NativeCall::CullFace(native));
        }
    }

    /// Depth offset for coplanar geometry. Zero disables it.
    pub fn set_polygon_offset(&mut self, offset: f32) {
        if offset == self.state.polygon_offset {
            return;
        }
        self.minor_state_change();
        self.state.polygon_offset = offset;
        if offset == 0.0 {
            self.set_enabled(Capability::PolygonOffsetFill, false);
        } else {
            self.set_enabled(Capability::PolygonOffsetFill, true);
            self.emit(NativeCall::PolygonOffset { factor: offset.signum() * 2.0, units: offset });
        }
    }

    pub fn set_line_width(&mut self, width: f32) {
        if width == self.state.line_width {
            return;
        }
        self.minor_state_change();
        self.state.line_width = width;
        self.emit(NativeCall::LineWidth(width));
    }

    pub fn set_point_size(&mut self, size: f32) {
        if size == self.state.point_size {
            return;
        }
        self.minor_state_change();
        self.state.point_size = size;
        self.emit(NativeCall::PointSize(size));
    }

    pub fn set_shade_mode(&mut self, mode: ShadeMode) {
        if mode == self.state.shade_mode {
            return;
        }
        self.minor_state_change();
        self.state.shade_mode = mode;
        self.emit(NativeCall::ShadeModel(mode));
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if mode == self.state.render_mode {
            return;
        }
        self.minor_state_change();
        self.state.render_mode = mode;
        self.emit(NativeCall::PolygonMode(mode));
    }

    pub fn set_srgb_conversion(&mut self, on: bool) {
        if on == self.state.srgb_conversion {
            return;
        }
        self.minor_state_change();
        self.state.srgb_conversion = on;
        self.set_enabled(Capability::FramebufferSrgb, on);
    }
}
