//! The emulated native state: what a GL driver would hold after the calls
//! it has received so far.

use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::coords::Color4;
use crate::render::{
    BlendEq, BlendFunc, Capability, ColorBuffer, Compare, CullFace, Framebuffer, FramebufferTarget,
    NativeCall, RenderMode, Shader, StencilFace, StencilOp, Texture, VertexStream,
};

/// Number of texture image units exposed to shaders.
pub const TEXTURE_SLOTS: usize = 2;

/// Native rectangle, bottom-left origin: `[x, y, width, height]`.
pub type NativeRect = [i32; 4];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StencilFaceOps {
    pub func: Compare,
    pub fail: StencilOp,
    pub zfail: StencilOp,
    pub zpass: StencilOp,
}

impl Default for StencilFaceOps {
    fn default() -> Self {
        Self { func: Compare::AlwaysPass, fail: StencilOp::Keep, zfail: StencilOp::Keep, zpass: StencilOp::Keep }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Enabled {
    pub depth_test: bool,
    pub stencil_test: bool,
    pub alpha_test: bool,
    pub blend: bool,
    pub cull_face: bool,
    pub scissor_test: bool,
    pub logic_op: bool,
    pub polygon_offset: bool,
    pub srgb: bool,
}

/// Shader program bound by the last `UseProgram`.
#[derive(Debug, Clone)]
pub struct Program {
    pub shader: Rc<Shader>,
    pub uniforms: Vec<[f32; 4]>,
    pub streams: Vec<(u32, Rc<VertexStream>)>,
}

#[derive(Debug, Clone)]
pub struct GlState {
    pub enabled: Enabled,

    pub depth_func: Compare,
    pub depth_mask: bool,
    pub color_mask: (bool, bool),

    active_stencil_face: Option<StencilFace>,
    pub stencil_front: StencilFaceOps,
    pub stencil_back: StencilFaceOps,
    pub stencil_ref: i32,

    pub blend_src: BlendFunc,
    pub blend_dst: BlendFunc,
    pub blend_eq: BlendEq,
    pub cull_face: CullFace,
    pub polygon_offset: (f32, f32),
    pub polygon_mode: RenderMode,
    pub depth_range: (f32, f32),

    pub clear_color: Color4,
    pub clear_depth: f32,
    pub clear_stencil: i32,

    pub viewport: NativeRect,
    pub scissor: NativeRect,

    pub draw_fb: Option<Rc<Framebuffer>>,
    pub read_fb: Option<Rc<Framebuffer>>,
    pub draw_buffer: ColorBuffer,
    pub draw_buffers: Vec<ColorBuffer>,
    pub read_buffer: ColorBuffer,

    pub active_texture: usize,
    pub textures: [Option<Rc<Texture>>; TEXTURE_SLOTS],

    pub projection: Mat4,
    pub model_view: Mat4,
    pub program: Option<Program>,
}

impl Default for GlState {
    fn default() -> Self {
        Self {
            enabled: Enabled::default(),
            depth_func: Compare::Less,
            depth_mask: true,
            color_mask: (true, true),
            active_stencil_face: None,
            stencil_front: StencilFaceOps::default(),
            stencil_back: StencilFaceOps::default(),
            stencil_ref: 0,
            blend_src: BlendFunc::One,
            blend_dst: BlendFunc::Zero,
            blend_eq: BlendEq::Add,
            cull_face: CullFace::Back,
            polygon_offset: (0.0, 0.0),
            polygon_mode: RenderMode::Solid,
            depth_range: (0.0, 1.0),
            clear_color: Color4::new(0.0, 0.0, 0.0, 0.0),
            clear_depth: 1.0,
            clear_stencil: 0,
            viewport: [0, 0, 0, 0],
            scissor: [0, 0, 0, 0],
            draw_fb: None,
            read_fb: None,
            draw_buffer: ColorBuffer::Back,
            draw_buffers: vec![ColorBuffer::Color(0)],
            read_buffer: ColorBuffer::Back,
            active_texture: 0,
            textures: Default::default(),
            projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            program: None,
        }
    }
}

/// What the backend must do beyond updating state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Clear { color: bool, depth: bool, stencil: bool },
    Draw,
    Flush,
    Swap,
    /// A fixed-function call with no programmable equivalent.
    Unsupported(&'static str),
}

impl GlState {
    /// Applies `call` and reports the work it requests. Draw calls are
    /// reported; their parameters stay in `call`.
    pub fn apply(&mut self, call: &NativeCall) -> Action {
        match call {
            NativeCall::Enable(cap) => return self.set_enabled(*cap, true),
            NativeCall::Disable(cap) => return self.set_enabled(*cap, false),

            NativeCall::DepthFunc(f) => self.depth_func = *f,
            NativeCall::DepthMask(m) => self.depth_mask = *m,
            NativeCall::ColorMask { rgb, alpha } => self.color_mask = (*rgb, *alpha),
            NativeCall::AlphaFunc { .. } => {}

            NativeCall::ActiveStencilFace(face) => self.active_stencil_face = Some(*face),
            NativeCall::StencilFunc { func, reference } => {
                self.stencil_ref = *reference;
                for ops in self.stencil_targets() {
                    ops.func = *func;
                }
            }
            NativeCall::StencilFuncSeparate { front, back, reference } => {
                self.stencil_ref = *reference;
                self.stencil_front.func = *front;
                self.stencil_back.func = *back;
            }
            NativeCall::StencilOp { fail, zfail, zpass } => {
                for ops in self.stencil_targets() {
                    ops.fail = *fail;
                    ops.zfail = *zfail;
                    ops.zpass = *zpass;
                }
            }
            NativeCall::StencilOpSeparate { face, fail, zfail, zpass } => {
                let ops = match face {
                    StencilFace::Front => &mut self.stencil_front,
                    StencilFace::Back => &mut self.stencil_back,
                };
                ops.fail = *fail;
                ops.zfail = *zfail;
                ops.zpass = *zpass;
            }

            NativeCall::BlendFunc { src, dst } => {
                self.blend_src = *src;
                self.blend_dst = *dst;
            }
            NativeCall::BlendEquation(eq) => self.blend_eq = *eq,
            NativeCall::LogicOp(_) => {}
            NativeCall::CullFace(face) => self.cull_face = *face,
            NativeCall::PolygonOffset { factor, units } => self.polygon_offset = (*factor, *units),
            NativeCall::LineWidth(w) if *w != 1.0 => return Action::Unsupported("line width"),
            NativeCall::PointSize(s) if *s != 1.0 => return Action::Unsupported("point size"),
            NativeCall::LineWidth(_) | NativeCall::PointSize(_) => {}
            NativeCall::ShadeModel(_) => {}
            NativeCall::PolygonMode(mode) => self.polygon_mode = *mode,
            NativeCall::DepthRange { near, far } => self.depth_range = (*near, *far),

            NativeCall::ClearColor(c) => self.clear_color = *c,
            NativeCall::ClearDepth(d) => self.clear_depth = *d,
            NativeCall::ClearStencil(s) => self.clear_stencil = *s,
            NativeCall::Clear { color, depth, stencil } => {
                return Action::Clear { color: *color, depth: *depth, stencil: *stencil };
            }

            NativeCall::Viewport { x, y, width, height } => self.viewport = [*x, *y, *width, *height],
            NativeCall::Scissor { x, y, width, height } => self.scissor = [*x, *y, *width, *height],

            NativeCall::BindFramebuffer { target, framebuffer } => match target {
                FramebufferTarget::Draw => self.draw_fb = framebuffer.clone(),
                FramebufferTarget::Read => self.read_fb = framebuffer.clone(),
            },
            NativeCall::DrawBuffer(b) => self.draw_buffer = *b,
            NativeCall::DrawBuffers(list) => self.draw_buffers = list.clone(),
            NativeCall::ReadBuffer(b) => self.read_buffer = *b,

            NativeCall::ActiveTexture(unit) => self.active_texture = *unit,
            NativeCall::BindTexture(texture) => {
                if let Some(slot) = self.textures.get_mut(self.active_texture) {
                    *slot = texture.clone();
                }
            }
            NativeCall::DisableAllTextures(_)
            | NativeCall::EnableTexture(_)
            | NativeCall::TexEnvCombine(_)
            | NativeCall::TextureMatrix(_)
            | NativeCall::TextureLodBias(_) => {}
            NativeCall::MultiTexCoord { coord, .. } if *coord != Vec4::new(0.0, 0.0, 0.0, 1.0) => {
                return Action::Unsupported("texture coordinate constant");
            }
            NativeCall::MultiTexCoord { .. } => {}

            NativeCall::LoadProjectionMatrix(m) => self.projection = *m,
            NativeCall::LoadModelViewMatrix(m) => self.model_view = *m,

            NativeCall::UseProgram { shader, uniforms, streams } => {
                self.program = Some(Program { shader: shader.clone(), uniforms: uniforms.clone(), streams: streams.clone() });
            }
            NativeCall::DrawArrays { .. } | NativeCall::DrawElements { .. } => return Action::Draw,

            NativeCall::Flush => return Action::Flush,
            NativeCall::SwapBuffers => return Action::Swap,
        }
        Action::None
    }

    /// Color targets selected for drawing, in output location order.
    pub fn color_outputs(&self) -> Vec<ColorBuffer> {
        if self.draw_fb.is_some() {
            self.draw_buffers.iter().copied().filter(|b| b.is_attachment()).collect()
        } else {
            match self.draw_buffer {
                ColorBuffer::None => Vec::new(),
                _ => vec![ColorBuffer::Back],
            }
        }
    }

    fn set_enabled(&mut self, cap: Capability, on: bool) -> Action {
        let e = &mut self.enabled;
        match cap {
            Capability::DepthTest => e.depth_test = on,
            Capability::StencilTest => e.stencil_test = on,
            Capability::Blend => e.blend = on,
            Capability::CullFace => e.cull_face = on,
            Capability::ScissorTest => e.scissor_test = on,
            Capability::PolygonOffsetFill => e.polygon_offset = on,
            Capability::FramebufferSrgb => e.srgb = on,
            Capability::AlphaTest => {
                e.alpha_test = on;
                if on {
                    return Action::Unsupported("alpha test");
                }
            }
            Capability::ColorLogicOp => {
                e.logic_op = on;
                if on {
                    return Action::Unsupported("logic op");
                }
            }
        }
        Action::None
    }

    fn stencil_targets(&mut self) -> Vec<&mut StencilFaceOps> {
        match self.active_stencil_face {
            Some(StencilFace::Front) => vec![&mut self.stencil_front],
            Some(StencilFace::Back) => vec![&mut self.stencil_back],
            None => vec![&mut self.stencil_front, &mut self.stencil_back],
        }
    }
}
