//! The boundary between the render state cache and a native graphics backend.
//!
//! The cache translates logical state changes into [`NativeCall`]s, modeled on
//! the fixed-function OpenGL entry points. A backend executes them in order.

use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::coords::{Color4, Rect2D};

use super::caps::Caps;
use super::resource::{Framebuffer, Texture};
use super::shader::{IndexStream, Shader, VertexStream};
use super::types::{
    BlendEq, BlendFunc, ColorBuffer, CombineMode, Compare, CullFace, FramebufferTarget, LogicOp,
    PrimitiveType, RenderMode, ShadeMode, StencilOp,
};

/// Native enable/disable capability bit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Capability {
    DepthTest,
    StencilTest,
    AlphaTest,
    Blend,
    CullFace,
    ScissorTest,
    ColorLogicOp,
    PolygonOffsetFill,
    FramebufferSrgb,
}

/// Stencil face selector for two-sided stencil entry points.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StencilFace {
    Front,
    Back,
}

/// One native API call.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    Enable(Capability),
    Disable(Capability),

    DepthFunc(Compare),
    DepthMask(bool),
    ColorMask { rgb: bool, alpha: bool },
    AlphaFunc { func: Compare, reference: f32 },

    ActiveStencilFace(StencilFace),
    StencilFunc { func: Compare, reference: i32 },
    StencilFuncSeparate { front: Compare, back: Compare, reference: i32 },
    StencilOp { fail: StencilOp, zfail: StencilOp, zpass: StencilOp },
    StencilOpSeparate { face: StencilFace, fail: StencilOp, zfail: StencilOp, zpass: StencilOp },

    BlendFunc { src: BlendFunc, dst: BlendFunc },
    BlendEquation(BlendEq),
    LogicOp(LogicOp),
    CullFace(CullFace),
    PolygonOffset { factor: f32, units: f32 },
    LineWidth(f32),
    PointSize(f32),
    ShadeModel(ShadeMode),
    PolygonMode(RenderMode),
    DepthRange { near: f32, far: f32 },

    ClearColor(Color4),
    ClearDepth(f32),
    ClearStencil(i32),
    Clear { color: bool, depth: bool, stencil: bool },

    /// Rectangle in bottom-left-origin pixels.
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    /// Rectangle in bottom-left-origin pixels.
    Scissor { x: i32, y: i32, width: i32, height: i32 },

    BindFramebuffer { target: FramebufferTarget, framebuffer: Option<Rc<Framebuffer>> },
    /// Legacy single draw buffer for the window surface.
    DrawBuffer(ColorBuffer),
    /// Draw buffer array for a bound framebuffer; `[None]` means no color output.
    DrawBuffers(Vec<ColorBuffer>),
    ReadBuffer(ColorBuffer),

    ActiveTexture(usize),
    BindTexture(Option<Rc<Texture>>),
    DisableAllTextures(usize),
    EnableTexture(usize),
    TexEnvCombine(CombineMode),
    TextureMatrix(Mat4),
    TextureLodBias(f32),
    MultiTexCoord { unit: usize, coord: Vec4 },

    LoadProjectionMatrix(Mat4),
    LoadModelViewMatrix(Mat4),

    UseProgram { shader: Rc<Shader>, uniforms: Vec<[f32; 4]>, streams: Vec<(u32, Rc<VertexStream>)> },
    DrawArrays { primitive: PrimitiveType, start: u32, count: u32 },
    DrawElements { primitive: PrimitiveType, indices: Rc<IndexStream> },

    Flush,
    SwapBuffers,
}

impl NativeCall {
    /// Calls that rebind objects or submit work are counted as major changes.
    pub fn is_major(&self) -> bool {
        matches!(
            self,
            NativeCall::BindFramebuffer { .. }
                | NativeCall::BindTexture(_)
                | NativeCall::UseProgram { .. }
                | NativeCall::DrawArrays { .. }
                | NativeCall::DrawElements { .. }
                | NativeCall::Clear { .. }
                | NativeCall::SwapBuffers
        )
    }
}

/// A native graphics backend.
pub trait NativeApi {
    /// Capabilities of the backend. Must not change after device init.
    fn caps(&self) -> Caps;

    /// Executes one call.
    fn submit(&mut self, call: NativeCall);

    /// Reads back `rect` (bottom-left-origin pixels) of the current read target.
    fn read_pixels(&mut self, rect: Rect2D) -> anyhow::Result<image::RgbaImage>;
}

/// Backend that records every call. Used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingApi {
    caps: Caps,
    calls: Vec<NativeCall>,
    reads: Vec<Rect2D>,
}

impl RecordingApi {
    pub fn new(caps: Caps) -> Self {
        Self { caps, calls: Vec::new(), reads: Vec::new() }
    }

    #[inline]
    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    /// Rectangles passed to `read_pixels`, oldest first.
    #[inline]
    pub fn reads(&self) -> &[Rect2D] {
        &self.reads
    }

    /// Returns and forgets the recorded calls.
    pub fn take(&mut self) -> Vec<NativeCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl NativeApi for RecordingApi {
    fn caps(&self) -> Caps {
        self.caps.clone()
    }

    fn submit(&mut self, call: NativeCall) {
        log::trace!("native: {call:?}");
        self.calls.push(call);
    }

    fn read_pixels(&mut self, rect: Rect2D) -> anyhow::Result<image::RgbaImage> {
        self.reads.push(rect);
        let w = rect.width().max(0.0) as u32;
        let h = rect.height().max(0.0) as u32;
        Ok(image::RgbaImage::new(w, h))
    }
}
