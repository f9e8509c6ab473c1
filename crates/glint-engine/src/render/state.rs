//! The render state snapshot.

use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::coords::{Color4, Rect2D};

use super::caps::{MAX_TRACKED_TEXTURE_IMAGE_UNITS, MAX_TRACKED_TEXTURE_UNITS};
use super::resource::{Framebuffer, Texture};
use super::types::{
    BlendEq, BlendFunc, ColorBuffer, CombineMode, Compare, CullFace, LogicOp, RenderMode,
    ShadeMode, StencilOp,
};

/// Fixed-function texture unit state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureUnit {
    pub tex_coord: Vec4,
    pub texture_matrix: Mat4,
    pub combine_mode: CombineMode,
    pub lod_bias: f32,
}

impl Default for TextureUnit {
    fn default() -> Self {
        Self {
            tex_coord: Vec4::new(0.0, 0.0, 0.0, 1.0),
            texture_matrix: Mat4::IDENTITY,
            combine_mode: CombineMode::Modulate,
            lod_bias: 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StencilState {
    pub test: Compare,
    pub reference: i32,
    pub clear: i32,
    pub front_fail: StencilOp,
    pub front_zfail: StencilOp,
    pub front_zpass: StencilOp,
    pub back_fail: StencilOp,
    pub back_zfail: StencilOp,
    pub back_zpass: StencilOp,
}

impl StencilState {
    /// True when no stencil op has any effect.
    pub fn ops_are_keep(&self, two_sided: bool) -> bool {
        let front = [self.front_fail, self.front_zfail, self.front_zpass]
            .iter()
            .all(|op| *op == StencilOp::Keep);
        let back = [self.back_fail, self.back_zfail, self.back_zpass]
            .iter()
            .all(|op| *op == StencilOp::Keep);
        front && (!two_sided || back)
    }
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            test: Compare::AlwaysPass,
            reference: 0,
            clear: 0,
            front_fail: StencilOp::Keep,
            front_zfail: StencilOp::Keep,
            front_zpass: StencilOp::Keep,
            back_fail: StencilOp::Keep,
            back_zfail: StencilOp::Keep,
            back_zpass: StencilOp::Keep,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlendState {
    pub src: BlendFunc,
    pub dst: BlendFunc,
    pub eq: BlendEq,
}

impl BlendState {
    /// `(ONE, ZERO)` with ADD or SUBTRACT leaves the destination untouched by blending.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.src == BlendFunc::One
            && self.dst == BlendFunc::Zero
            && matches!(self.eq, BlendEq::Add | BlendEq::Subtract)
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self { src: BlendFunc::One, dst: BlendFunc::Zero, eq: BlendEq::Add }
    }
}

/// Camera, object and projection transforms.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrices {
    pub camera_to_world: Mat4,
    pub object_to_world: Mat4,
    pub projection: Mat4,
    /// Whether any matrix changed since this snapshot was pushed.
    pub changed: bool,
    /// True while drawing to the window surface.
    pub invert_y: bool,
}

impl Matrices {
    /// Native projection correction for the current Y convention.
    pub fn invert_y_matrix(&self) -> Mat4 {
        if self.invert_y {
            Mat4::from_scale(glam::Vec3::new(1.0, -1.0, 1.0))
        } else {
            Mat4::IDENTITY
        }
    }

    /// `camera_to_world^-1 * object_to_world`.
    pub fn model_view(&self) -> Mat4 {
        self.camera_to_world.inverse() * self.object_to_world
    }
}

impl Default for Matrices {
    fn default() -> Self {
        Self {
            camera_to_world: Mat4::IDENTITY,
            object_to_world: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            changed: true,
            invert_y: true,
        }
    }
}

/// Every piece of pipeline state the render device manages.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub viewport: Rect2D,
    pub clip_2d: Rect2D,
    pub use_clip_2d: bool,

    pub depth_write: bool,
    pub color_write: bool,
    pub alpha_write: bool,

    pub draw_buffer: ColorBuffer,
    pub read_buffer: ColorBuffer,
    pub draw_framebuffer: Option<Rc<Framebuffer>>,
    pub read_framebuffer: Option<Rc<Framebuffer>>,

    pub depth_test: Compare,
    pub alpha_test: Compare,
    pub alpha_reference: f32,
    pub stencil: StencilState,
    pub blend: BlendState,
    pub logic_op: LogicOp,
    pub cull_face: CullFace,
    pub polygon_offset: f32,
    pub line_width: f32,
    pub point_size: f32,
    pub shade_mode: ShadeMode,
    pub render_mode: RenderMode,
    pub srgb_conversion: bool,
    pub depth_range: (f32, f32),

    pub color_clear: Color4,
    pub depth_clear: f32,

    pub texture_units: [TextureUnit; MAX_TRACKED_TEXTURE_UNITS],
    pub texture_image_units: [Option<Rc<Texture>>; MAX_TRACKED_TEXTURE_IMAGE_UNITS],

    pub matrices: Matrices,

    /// Highest texture (image) unit touched since this snapshot was pushed.
    pub highest_texture_unit_changed: Option<usize>,
}

impl RenderState {
    /// Defaults for a `width` x `height` window surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Rect2D::from_size(width as f32, height as f32),
            clip_2d: Rect2D::inf(),
            use_clip_2d: false,

            depth_write: true,
            color_write: true,
            alpha_write: true,

            draw_buffer: ColorBuffer::Back,
            read_buffer: ColorBuffer::Back,
            draw_framebuffer: None,
            read_framebuffer: None,

            depth_test: Compare::LEqual,
            alpha_test: Compare::AlwaysPass,
            alpha_reference: 0.0,
            stencil: StencilState::default(),
            blend: BlendState::default(),
            logic_op: LogicOp::Copy,
            cull_face: CullFace::Back,
            polygon_offset: 0.0,
            line_width: 1.0,
            point_size: 1.0,
            shade_mode: ShadeMode::Flat,
            render_mode: RenderMode::Solid,
            srgb_conversion: false,
            depth_range: (0.0, 1.0),

            color_clear: Color4::black(),
            depth_clear: 1.0,

            texture_units: Default::default(),
            texture_image_units: Default::default(),

            matrices: Matrices::default(),

            highest_texture_unit_changed: Some(
                MAX_TRACKED_TEXTURE_UNITS.max(MAX_TRACKED_TEXTURE_IMAGE_UNITS) - 1,
            ),
        }
    }

    /// Records that texture unit `unit` was modified.
    #[inline]
    pub fn touch_texture_unit(&mut self, unit: usize) {
        self.highest_texture_unit_changed =
            Some(self.highest_texture_unit_changed.map_or(unit, |u| u.max(unit)));
    }

    /// The texture bound to image unit `unit`.
    pub fn texture(&self, unit: usize) -> Option<&Rc<Texture>> {
        self.texture_image_units.get(unit).and_then(|t| t.as_ref())
    }
}

/// Handle identity comparison for optional shared resources.
pub(crate) fn same_handle<T>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let s = RenderState::new(640, 480);
        assert_eq!(s.depth_test, Compare::LEqual);
        assert!(s.depth_write && s.color_write && s.alpha_write);
        assert!(s.blend.is_identity());
        assert_eq!(s.cull_face, CullFace::Back);
        assert_eq!(s.viewport, Rect2D::from_size(640.0, 480.0));
        assert!(s.matrices.invert_y);
        assert!(!s.use_clip_2d);
    }

    #[test]
    fn fresh_state_marks_every_unit_changed() {
        let s = RenderState::new(1, 1);
        assert_eq!(
            s.highest_texture_unit_changed,
            Some(MAX_TRACKED_TEXTURE_UNITS.max(MAX_TRACKED_TEXTURE_IMAGE_UNITS) - 1)
        );
    }

    #[test]
    fn touch_keeps_highest_index() {
        let mut s = RenderState::new(1, 1);
        s.highest_texture_unit_changed = None;
        s.touch_texture_unit(2);
        s.touch_texture_unit(1);
        assert_eq!(s.highest_texture_unit_changed, Some(2));
    }

    #[test]
    fn subtract_with_one_zero_is_identity_blend() {
        let b = BlendState { src: BlendFunc::One, dst: BlendFunc::Zero, eq: BlendEq::Subtract };
        assert!(b.is_identity());
        let b = BlendState { src: BlendFunc::SrcAlpha, dst: BlendFunc::OneMinusSrcAlpha, eq: BlendEq::Add };
        assert!(!b.is_identity());
    }

    #[test]
    fn keep_ops_ignore_back_when_single_sided() {
        let mut s = StencilState::default();
        s.back_zpass = StencilOp::Replace;
        assert!(s.ops_are_keep(false));
        assert!(!s.ops_are_keep(true));
    }

    #[test]
    fn invert_y_matrix_flips_only_when_on_window() {
        let mut m = Matrices::default();
        assert_eq!(m.invert_y_matrix().y_axis.y, -1.0);
        m.invert_y = false;
        assert_eq!(m.invert_y_matrix(), Mat4::IDENTITY);
    }
}
