/// How the shared [`GpuContext`](super::GpuContext) and every window surface
/// are created.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode of window surfaces. FIFO is supported everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Requested compositing alpha mode. Falls back to the first supported one.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features. Device creation fails without them.
    pub required_features: wgpu::Features,

    /// Features requested only if the adapter has them. Wireframe and point
    /// polygon modes fall back to solid fill without them.
    pub optional_features: wgpu::Features,

    /// Device limits. The backend caps color attachments at four regardless.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for window surfaces. A hint.
    pub desired_maximum_frame_latency: u32,

    /// Format of the depth/stencil buffer created with each window surface.
    pub depth_format: wgpu::TextureFormat,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            optional_features: wgpu::Features::POLYGON_MODE_LINE | wgpu::Features::POLYGON_MODE_POINT,
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            depth_format: wgpu::TextureFormat::Depth24PlusStencil8,
        }
    }
}
