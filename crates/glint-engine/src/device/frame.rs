/// The window surface as a draw target for one frame.
///
/// Holding the surface texture prevents acquisition of subsequent frames, so
/// this is presented or dropped before the next one is acquired.
pub struct WindowFrame {
    surface_texture: Option<wgpu::SurfaceTexture>,
    pub(crate) view: wgpu::TextureView,
    pub(crate) format: wgpu::TextureFormat,
    pub(crate) depth: Option<(wgpu::TextureView, wgpu::TextureFormat)>,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl WindowFrame {
    pub fn new(surface_texture: wgpu::SurfaceTexture, depth: Option<(wgpu::TextureView, wgpu::TextureFormat)>) -> Self {
        let view = surface_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let format = surface_texture.texture.format();
        let width = surface_texture.texture.width();
        let height = surface_texture.texture.height();
        Self { surface_texture: Some(surface_texture), view, format, depth, width, height }
    }

    /// The acquired texture, until presented.
    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.surface_texture.as_ref().map(|s| &s.texture)
    }

    #[inline]
    pub fn presented(&self) -> bool {
        self.surface_texture.is_none()
    }

    /// Presents the frame. Returns `false` if it was already presented.
    pub fn present(&mut self) -> bool {
        match self.surface_texture.take() {
            Some(st) => {
                st.present();
                true
            }
            None => false,
        }
    }
}
