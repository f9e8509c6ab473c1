//! Enumerations describing fixed-function pipeline state.
//!
//! Most parameter enums carry a `Current` variant: passing it to a setter keeps the
//! cached value for that parameter.

/// Comparison function shared by the depth, alpha and stencil tests.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Compare {
    Greater,
    Less,
    GEqual,
    LEqual,
    NotEqual,
    Equal,
    AlwaysPass,
    NeverPass,
    Current,
}

pub type DepthTest = Compare;
pub type AlphaTest = Compare;
pub type StencilTest = Compare;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrSat,
    DecrSat,
    Invert,
    IncrWrap,
    DecrWrap,
    Current,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFunc {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    SrcAlphaSaturate,
    Current,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendEq {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
    Current,
}

/// Polygon face selector.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CullFace {
    Front,
    Back,
    None,
    Current,
}

impl CullFace {
    /// Swaps front and back; other values pass through.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            CullFace::Front => CullFace::Back,
            CullFace::Back => CullFace::Front,
            other => other,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    Copy,
    AndInverted,
    Noop,
    Xor,
    Or,
    Nor,
    Equiv,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
    Current,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShadeMode {
    Flat,
    Smooth,
}

/// Polygon rasterization mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RenderMode {
    Solid,
    Wireframe,
    Points,
}

/// Draw/read buffer selector.
///
/// `Front` and `Back` name the window surface buffers; `Color(i)` names the
/// i-th color attachment of a bound framebuffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ColorBuffer {
    None,
    Front,
    Back,
    Color(u8),
}

impl ColorBuffer {
    #[inline]
    pub fn is_attachment(self) -> bool {
        matches!(self, ColorBuffer::Color(_))
    }
}

/// Fixed-function texture environment combine mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CombineMode {
    Replace,
    Blend,
    Modulate,
    Interpolate,
    Add,
    Subtract,
    AddSigned,
    Current,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

impl PrimitiveType {
    /// Number of triangles rasterized for `count` vertices.
    pub fn triangle_count(self, count: usize) -> usize {
        match self {
            PrimitiveType::Triangles => count / 3,
            PrimitiveType::TriangleStrip => count.saturating_sub(2),
            _ => 0,
        }
    }
}

/// Framebuffer binding point.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FramebufferTarget {
    Draw,
    Read,
}
