/// Number of fixed-function texture units whose state is tracked.
pub const MAX_TRACKED_TEXTURE_UNITS: usize = 4;

/// Number of addressable texture image units whose bindings are tracked.
pub const MAX_TRACKED_TEXTURE_IMAGE_UNITS: usize = 8;

/// How the native backend realizes separate front/back stencil state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StencilSupport {
    /// Select the face first, then issue a single-sided call.
    TwoSidedExt,
    /// Dedicated separate front/back entry points.
    SeparateAti,
    /// One state for both faces; back values are ignored.
    SingleSided,
}

impl StencilSupport {
    #[inline]
    pub fn two_sided(self) -> bool {
        !matches!(self, StencilSupport::SingleSided)
    }
}

/// Capabilities of the native backend, queried once at device init.
#[derive(Debug, Clone)]
pub struct Caps {
    pub stencil: StencilSupport,
    /// Addressable texture image units.
    pub num_textures: usize,
    /// Fixed-function texture units.
    pub num_texture_units: usize,
    /// Texture coordinate sets.
    pub num_texture_coords: usize,
    pub framebuffer_objects: bool,
    pub blend_equation: bool,
    pub max_color_attachments: usize,
}

impl Caps {
    /// Clamps the counts to the tracked array sizes.
    pub fn clamped(mut self) -> Self {
        self.num_textures = self.num_textures.min(MAX_TRACKED_TEXTURE_IMAGE_UNITS);
        self.num_texture_units = self.num_texture_units.min(MAX_TRACKED_TEXTURE_UNITS);
        self.num_texture_coords = self.num_texture_coords.min(MAX_TRACKED_TEXTURE_UNITS);
        self
    }
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            stencil: StencilSupport::SeparateAti,
            num_textures: MAX_TRACKED_TEXTURE_IMAGE_UNITS,
            num_texture_units: MAX_TRACKED_TEXTURE_UNITS,
            num_texture_coords: MAX_TRACKED_TEXTURE_UNITS,
            framebuffer_objects: true,
            blend_equation: true,
            max_color_attachments: 4,
        }
    }
}
