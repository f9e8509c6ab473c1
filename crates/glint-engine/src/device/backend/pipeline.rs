//! Folding emulated fixed-function state into wgpu pipelines.

use crate::render::{BlendEq, BlendFunc, Compare, CullFace, PrimitiveType, RenderMode, ResourceId, StencilOp};

use super::state::{GlState, NativeRect, StencilFaceOps};

/// Everything a render pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub shader: ResourceId,
    pub colors: Vec<wgpu::TextureFormat>,
    pub depth_format: Option<wgpu::TextureFormat>,
    /// `(shader location, component count)` per vertex buffer slot.
    pub vertex_layout: Vec<(u32, u32)>,
    pub topology: PrimitiveType,

    pub cull: CullFace,
    pub polygon_mode: RenderMode,

    /// `None` when the depth test is off or there is no depth attachment.
    pub depth_test: Option<Compare>,
    pub depth_write: bool,
    /// Polygon offset `(factor, units)` as raw bits.
    pub depth_bias: Option<(u32, u32)>,
    pub stencil: Option<(StencilFaceOps, StencilFaceOps)>,

    pub blend: Option<(BlendFunc, BlendFunc, BlendEq)>,
    pub color_mask: (bool, bool),
}

/// Formats of the attachments a draw renders into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFormats {
    pub colors: Vec<wgpu::TextureFormat>,
    pub depth: Option<wgpu::TextureFormat>,
}

/// Polygon fill modes the device can rasterize besides `Fill`.
#[derive(Debug, Copy, Clone, Default)]
pub struct PolygonSupport {
    pub line: bool,
    pub point: bool,
}

impl PolygonSupport {
    pub fn from_features(features: wgpu::Features) -> Self {
        Self {
            line: features.contains(wgpu::Features::POLYGON_MODE_LINE),
            point: features.contains(wgpu::Features::POLYGON_MODE_POINT),
        }
    }

    /// Downgrades unsupported modes to solid.
    pub fn resolve(self, mode: RenderMode) -> RenderMode {
        match mode {
            RenderMode::Wireframe if !self.line => RenderMode::Solid,
            RenderMode::Points if !self.point => RenderMode::Solid,
            m => m,
        }
    }
}

impl PipelineKey {
    pub fn new(
        gl: &GlState,
        shader: ResourceId,
        targets: &TargetFormats,
        vertex_layout: Vec<(u32, u32)>,
        topology: PrimitiveType,
        polygons: PolygonSupport,
    ) -> Self {
        let e = &gl.enabled;
        let has_depth = targets.depth.is_some_and(|f| f.has_depth_aspect());
        let has_stencil = targets.depth.is_some_and(|f| f.has_stencil_aspect());

        // A disabled depth test also disables depth writes.
        let depth_test = (e.depth_test && has_depth).then_some(gl.depth_func);
        let depth_bias = (e.polygon_offset && has_depth && gl.polygon_offset != (0.0, 0.0))
            .then(|| (gl.polygon_offset.0.to_bits(), gl.polygon_offset.1.to_bits()));

        Self {
            shader,
            colors: targets.colors.clone(),
            depth_format: targets.depth,
            vertex_layout,
            topology,
            cull: if e.cull_face { gl.cull_face } else { CullFace::None },
            polygon_mode: polygons.resolve(gl.polygon_mode),
            depth_test,
            depth_write: depth_test.is_some() && gl.depth_mask,
            depth_bias,
            stencil: (e.stencil_test && has_stencil).then_some((gl.stencil_front, gl.stencil_back)),
            blend: e.blend.then_some((gl.blend_src, gl.blend_dst, gl.blend_eq)),
            color_mask: gl.color_mask,
        }
    }

    pub fn primitive_state(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: topology(self.topology),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: match self.cull {
                CullFace::Front => Some(wgpu::Face::Front),
                CullFace::Back => Some(wgpu::Face::Back),
                CullFace::None | CullFace::Current => None,
            },
            polygon_mode: match self.polygon_mode {
                RenderMode::Solid => wgpu::PolygonMode::Fill,
                RenderMode::Wireframe => wgpu::PolygonMode::Line,
                RenderMode::Points => wgpu::PolygonMode::Point,
            },
            unclipped_depth: false,
            conservative: false,
        }
    }

    pub fn depth_stencil_state(&self) -> Option<wgpu::DepthStencilState> {
        let format = self.depth_format?;

        let stencil = match self.stencil {
            Some((front, back)) => wgpu::StencilState {
                front: stencil_face(front),
                back: stencil_face(back),
                read_mask: 0xff,
                write_mask: 0xff,
            },
            None => wgpu::StencilState::default(),
        };

        let bias = match self.depth_bias {
            Some((factor, units)) => wgpu::DepthBiasState {
                constant: f32::from_bits(units) as i32,
                slope_scale: f32::from_bits(factor),
                clamp: 0.0,
            },
            None => wgpu::DepthBiasState::default(),
        };

        Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.depth_write,
            depth_compare: self.depth_test.map_or(wgpu::CompareFunction::Always, compare),
            stencil,
            bias,
        })
    }

    pub fn color_targets(&self) -> Vec<Option<wgpu::ColorTargetState>> {
        let blend = self.blend.map(|(src, dst, eq)| blend_state(src, dst, eq));
        let write_mask = color_writes(self.color_mask);
        self.colors
            .iter()
            .map(|&format| Some(wgpu::ColorTargetState { format, blend, write_mask }))
            .collect()
    }
}

/// Pipeline used to emulate a native clear.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClearKey {
    pub colors: Vec<wgpu::TextureFormat>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl ClearKey {
    /// `None` when the request writes nothing to this target.
    pub fn new(targets: &TargetFormats, color: bool, depth: bool, stencil: bool) -> Option<Self> {
        let color = color && !targets.colors.is_empty();
        let depth = depth && targets.depth.is_some_and(|f| f.has_depth_aspect());
        let stencil = stencil && targets.depth.is_some_and(|f| f.has_stencil_aspect());
        if !(color || depth || stencil) {
            return None;
        }
        Some(Self { colors: targets.colors.clone(), depth_format: targets.depth, color, depth, stencil })
    }

    pub fn depth_stencil_state(&self) -> Option<wgpu::DepthStencilState> {
        let format = self.depth_format?;
        let pass_op = if self.stencil { wgpu::StencilOperation::Replace } else { wgpu::StencilOperation::Keep };
        let face = wgpu::StencilFaceState {
            compare: wgpu::CompareFunction::Always,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Keep,
            pass_op,
        };
        Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.depth,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState { front: face, back: face, read_mask: 0xff, write_mask: 0xff },
            bias: wgpu::DepthBiasState::default(),
        })
    }

    pub fn color_targets(&self) -> Vec<Option<wgpu::ColorTargetState>> {
        let write_mask = if self.color { wgpu::ColorWrites::ALL } else { wgpu::ColorWrites::empty() };
        self.colors
            .iter()
            .map(|&format| Some(wgpu::ColorTargetState { format, blend: None, write_mask }))
            .collect()
    }
}

/// WGSL for a full-target triangle writing the clear color to `outputs`
/// color targets at the clear depth.
pub fn clear_shader_source(outputs: usize) -> String {
    let mut src = String::from(
        "struct ClearParams {\n    color: vec4<f32>,\n    depth: vec4<f32>,\n};\n\n\
         @group(0) @binding(0) var<uniform> params: ClearParams;\n\n\
         @vertex\nfn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {\n    \
         let uv = vec2<f32>(f32((i << 1u) & 2u), f32(i & 2u));\n    \
         return vec4<f32>(uv * 2.0 - 1.0, params.depth.x, 1.0);\n}\n\n",
    );

    if outputs == 0 {
        src.push_str("@fragment\nfn fs_main() {}\n");
        return src;
    }

    src.push_str("struct ClearOut {\n");
    for i in 0..outputs {
        src.push_str(&format!("    @location({i}) c{i}: vec4<f32>,\n"));
    }
    src.push_str("};\n\n@fragment\nfn fs_main() -> ClearOut {\n    var out: ClearOut;\n");
    for i in 0..outputs {
        src.push_str(&format!("    out.c{i} = params.color;\n"));
    }
    src.push_str("    return out;\n}\n");
    src
}

/// Converts a bottom-left-origin rectangle to a top-left one inside a
/// `width` x `height` target, clipped to its bounds. `None` if nothing is left.
pub fn to_target_rect(rect: NativeRect, width: u32, height: u32) -> Option<[u32; 4]> {
    let [x, y, w, h] = rect;
    let (tw, th) = (width as i64, height as i64);

    let x0 = (x as i64).clamp(0, tw);
    let x1 = (x as i64 + w as i64).clamp(0, tw);
    let top = (th - (y as i64 + h as i64)).clamp(0, th);
    let bottom = (th - y as i64).clamp(0, th);

    (x1 > x0 && bottom > top).then(|| [x0 as u32, top as u32, (x1 - x0) as u32, (bottom - top) as u32])
}

pub fn compare(c: Compare) -> wgpu::CompareFunction {
    match c {
        Compare::Greater => wgpu::CompareFunction::Greater,
        Compare::Less => wgpu::CompareFunction::Less,
        Compare::GEqual => wgpu::CompareFunction::GreaterEqual,
        Compare::LEqual => wgpu::CompareFunction::LessEqual,
        Compare::NotEqual => wgpu::CompareFunction::NotEqual,
        Compare::Equal => wgpu::CompareFunction::Equal,
        Compare::NeverPass => wgpu::CompareFunction::Never,
        Compare::AlwaysPass | Compare::Current => wgpu::CompareFunction::Always,
    }
}

fn stencil_op(op: StencilOp) -> wgpu::StencilOperation {
    match op {
        StencilOp::Keep | StencilOp::Current => wgpu::StencilOperation::Keep,
        StencilOp::Zero => wgpu::StencilOperation::Zero,
        StencilOp::Replace => wgpu::StencilOperation::Replace,
        StencilOp::IncrSat => wgpu::StencilOperation::IncrementClamp,
        StencilOp::DecrSat => wgpu::StencilOperation::DecrementClamp,
        StencilOp::Invert => wgpu::StencilOperation::Invert,
        StencilOp::IncrWrap => wgpu::StencilOperation::IncrementWrap,
        StencilOp::DecrWrap => wgpu::StencilOperation::DecrementWrap,
    }
}

fn stencil_face(ops: StencilFaceOps) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: compare(ops.func),
        fail_op: stencil_op(ops.fail),
        depth_fail_op: stencil_op(ops.zfail),
        pass_op: stencil_op(ops.zpass),
    }
}

fn blend_factor(f: BlendFunc) -> wgpu::BlendFactor {
    match f {
        BlendFunc::Zero => wgpu::BlendFactor::Zero,
        BlendFunc::One | BlendFunc::Current => wgpu::BlendFactor::One,
        BlendFunc::SrcColor => wgpu::BlendFactor::Src,
        BlendFunc::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
        BlendFunc::DstColor => wgpu::BlendFactor::Dst,
        BlendFunc::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
        BlendFunc::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFunc::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFunc::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFunc::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        BlendFunc::ConstantColor => wgpu::BlendFactor::Constant,
        BlendFunc::OneMinusConstantColor => wgpu::BlendFactor::OneMinusConstant,
        BlendFunc::SrcAlphaSaturate => wgpu::BlendFactor::SrcAlphaSaturated,
    }
}

fn blend_state(src: BlendFunc, dst: BlendFunc, eq: BlendEq) -> wgpu::BlendState {
    let (operation, src, dst) = match eq {
        BlendEq::Add | BlendEq::Current => (wgpu::BlendOperation::Add, blend_factor(src), blend_factor(dst)),
        BlendEq::Subtract => (wgpu::BlendOperation::Subtract, blend_factor(src), blend_factor(dst)),
        BlendEq::ReverseSubtract => (wgpu::BlendOperation::ReverseSubtract, blend_factor(src), blend_factor(dst)),
        // Min and max ignore the factors; wgpu requires them to be one.
        BlendEq::Min => (wgpu::BlendOperation::Min, wgpu::BlendFactor::One, wgpu::BlendFactor::One),
        BlendEq::Max => (wgpu::BlendOperation::Max, wgpu::BlendFactor::One, wgpu::BlendFactor::One),
    };
    let component = wgpu::BlendComponent { src_factor: src, dst_factor: dst, operation };
    wgpu::BlendState { color: component, alpha: component }
}

fn color_writes((rgb, alpha): (bool, bool)) -> wgpu::ColorWrites {
    let mut w = wgpu::ColorWrites::empty();
    if rgb {
        w |= wgpu::ColorWrites::COLOR;
    }
    if alpha {
        w |= wgpu::ColorWrites::ALPHA;
    }
    w
}

fn topology(p: PrimitiveType) -> wgpu::PrimitiveTopology {
    match p {
        PrimitiveType::Points => wgpu::PrimitiveTopology::PointList,
        PrimitiveType::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveType::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveType::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveType::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

pub fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Capability, NativeCall};

    fn window_targets() -> TargetFormats {
        TargetFormats {
            colors: vec![wgpu::TextureFormat::Bgra8UnormSrgb],
            depth: Some(wgpu::TextureFormat::Depth24PlusStencil8),
        }
    }

    fn key(gl: &GlState, targets: &TargetFormats) -> PipelineKey {
        PipelineKey::new(
            gl,
            ResourceId::next(),
            targets,
            vec![(0, 3)],
            PrimitiveType::Triangles,
            PolygonSupport::default(),
        )
    }

    // ── key folding ───────────────────────────────────────────────────────

    #[test]
    fn disabled_depth_test_disables_writes() {
        let gl = GlState::default();
        let k = key(&gl, &window_targets());
        assert_eq!(k.depth_test, None);
        assert!(!k.depth_write);
        assert_eq!(k.depth_stencil_state().unwrap().depth_compare, wgpu::CompareFunction::Always);
    }

    #[test]
    fn enabled_depth_test_folds_func_and_mask() {
        let mut gl = GlState::default();
        gl.apply(&NativeCall::Enable(Capability::DepthTest));
        gl.apply(&NativeCall::DepthFunc(Compare::LEqual));
        let k = key(&gl, &window_targets());
        assert_eq!(k.depth_test, Some(Compare::LEqual));
        assert!(k.depth_write);

        let ds = k.depth_stencil_state().unwrap();
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(ds.depth_write_enabled);
    }

    #[test]
    fn depth_state_needs_a_depth_attachment() {
        let mut gl = GlState::default();
        gl.apply(&NativeCall::Enable(Capability::DepthTest));
        gl.apply(&NativeCall::Enable(Capability::StencilTest));
        let targets = TargetFormats { colors: vec![wgpu::TextureFormat::Rgba8Unorm], depth: None };
        let k = key(&gl, &targets);
        assert_eq!(k.depth_test, None);
        assert_eq!(k.stencil, None);
        assert!(k.depth_stencil_state().is_none());
    }

    #[test]
    fn stencil_needs_a_stencil_aspect() {
        let mut gl = GlState::default();
        gl.apply(&NativeCall::Enable(Capability::StencilTest));
        assert!(key(&gl, &window_targets()).stencil.is_some());

        let targets = TargetFormats { colors: vec![], depth: Some(wgpu::TextureFormat::Depth32Float) };
        assert!(key(&gl, &targets).stencil.is_none());
    }

    #[test]
    fn cull_and_blend_only_when_enabled() {
        let mut gl = GlState::default();
        gl.apply(&NativeCall::BlendFunc { src: BlendFunc::SrcAlpha, dst: BlendFunc::OneMinusSrcAlpha });
        let k = key(&gl, &window_targets());
        assert_eq!(k.cull, CullFace::None);
        assert_eq!(k.blend, None);
        assert_eq!(k.primitive_state().cull_mode, None);

        gl.apply(&NativeCall::Enable(Capability::CullFace));
        gl.apply(&NativeCall::Enable(Capability::Blend));
        let k = key(&gl, &window_targets());
        assert_eq!(k.primitive_state().cull_mode, Some(wgpu::Face::Back));
        let target = k.color_targets()[0].clone().unwrap();
        assert_eq!(target.blend.unwrap().color.src_factor, wgpu::BlendFactor::SrcAlpha);
    }

    #[test]
    fn equal_states_share_a_key() {
        let gl = GlState::default();
        let shader = ResourceId::next();
        let a = PipelineKey::new(&gl, shader, &window_targets(), vec![], PrimitiveType::Triangles, PolygonSupport::default());
        let b = PipelineKey::new(&gl, shader, &window_targets(), vec![], PrimitiveType::Triangles, PolygonSupport::default());
        assert_eq!(a, b);

        let c = PipelineKey::new(&gl, shader, &window_targets(), vec![], PrimitiveType::Lines, PolygonSupport::default());
        assert_ne!(a, c);
    }

    #[test]
    fn unsupported_wireframe_falls_back_to_fill() {
        let mut gl = GlState::default();
        gl.apply(&NativeCall::PolygonMode(RenderMode::Wireframe));
        assert_eq!(key(&gl, &window_targets()).polygon_mode, RenderMode::Solid);

        let line = PolygonSupport { line: true, point: false };
        assert_eq!(line.resolve(RenderMode::Wireframe), RenderMode::Wireframe);
        assert_eq!(line.resolve(RenderMode::Points), RenderMode::Solid);
    }

    #[test]
    fn min_max_blend_uses_unit_factors() {
        let b = blend_state(BlendFunc::SrcAlpha, BlendFunc::Zero, BlendEq::Max);
        assert_eq!(b.color.operation, wgpu::BlendOperation::Max);
        assert_eq!(b.color.src_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn color_mask_maps_to_write_flags() {
        assert_eq!(color_writes((true, false)), wgpu::ColorWrites::COLOR);
        assert_eq!(color_writes((false, true)), wgpu::ColorWrites::ALPHA);
        assert_eq!(color_writes((true, true)), wgpu::ColorWrites::ALL);
    }

    // ── clears ────────────────────────────────────────────────────────────

    #[test]
    fn clear_key_drops_missing_aspects() {
        let targets = TargetFormats { colors: vec![], depth: Some(wgpu::TextureFormat::Depth32Float) };
        assert!(ClearKey::new(&targets, true, false, true).is_none());

        let k = ClearKey::new(&targets, true, true, true).unwrap();
        assert!(!k.color && k.depth && !k.stencil);
    }

    #[test]
    fn clear_without_color_keeps_attachments_but_masks_writes() {
        let k = ClearKey::new(&window_targets(), false, true, false).unwrap();
        let targets = k.color_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].as_ref().unwrap().write_mask, wgpu::ColorWrites::empty());
        assert!(k.depth_stencil_state().unwrap().depth_write_enabled);
    }

    #[test]
    fn clear_shader_writes_every_output() {
        let src = clear_shader_source(3);
        assert!(src.contains("@location(2) c2"));
        assert_eq!(src.matches("= params.color").count(), 3);
        assert!(clear_shader_source(0).contains("fn fs_main() {}"));
    }

    // ── rectangles ────────────────────────────────────────────────────────

    #[test]
    fn rects_flip_to_top_left_origin() {
        // Bottom 10 rows of a 100x50 target.
        assert_eq!(to_target_rect([0, 0, 100, 10], 100, 50), Some([0, 40, 100, 10]));
        assert_eq!(to_target_rect([5, 40, 10, 10], 100, 50), Some([5, 0, 10, 10]));
    }

    #[test]
    fn rects_clip_to_target() {
        assert_eq!(to_target_rect([-10, -10, 30, 30], 100, 50), Some([0, 30, 20, 20]));
        assert_eq!(to_target_rect([0, 0, 0, 0], 100, 50), None);
        assert_eq!(to_target_rect([200, 0, 10, 10], 100, 50), None);
    }
}
