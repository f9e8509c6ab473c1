//! Render surfaces and the current-surface guard.
//!
//! Several windows share one [`GpuContext`] and one render device. Only one
//! surface is current at a time: [`make_current`] points the backend's default
//! framebuffer at a surface's next texture and resets the viewport to cover
//! it. The returned [`CurrentGuard`] puts the previous target back when dropped.

use std::ops::{Deref, DerefMut};

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;

use crate::device::{GpuContext, SurfaceErrorAction, WgpuBackend, WindowFrame, surface};
use crate::render::{RenderDevice, WindowBinding};

/// A configured window surface plus its depth/stencil buffer.
pub struct RenderSurface<'w> {
    surface: wgpu::Surface<'w>,
    config: wgpu::SurfaceConfiguration,
    depth: (wgpu::Texture, wgpu::TextureView),
    size: PhysicalSize<u32>,
}

impl<'w> RenderSurface<'w> {
    pub fn new(gpu: &GpuContext, surface: wgpu::Surface<'w>, size: PhysicalSize<u32>) -> Result<Self> {
        let caps = surface.get_capabilities(gpu.adapter());
        let config = surface::surface_config(&caps, gpu.init(), size).context("no supported surface formats")?;
        surface.configure(gpu.device(), &config);
        log::debug!("surface configured: {:?} {}x{}", config.format, config.width, config.height);

        let depth = surface::create_depth_texture(gpu.device(), gpu.init().depth_format, config.width, config.height);
        Ok(Self { surface, config, depth, size })
    }

    #[inline]
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Reconfigures after a resize. Zero sizes (minimized) are recorded but
    /// leave the configuration alone.
    pub fn update(&mut self, gpu: &GpuContext, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if self.config.width == new_size.width && self.config.height == new_size.height {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(gpu.device(), &self.config);
        self.depth = surface::create_depth_texture(gpu.device(), self.depth.0.format(), new_size.width, new_size.height);
    }

    fn acquire(&mut self, gpu: &GpuContext) -> Result<WindowFrame, SurfaceErrorAction> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(SurfaceErrorAction::SkipFrame);
        }
        match self.surface.get_current_texture() {
            Ok(texture) => {
                let depth = Some((self.depth.1.clone(), self.depth.0.format()));
                Ok(WindowFrame::new(texture, depth))
            }
            Err(err) => {
                let action = SurfaceErrorAction::classify(&err);
                log::debug!("surface acquire failed: {err} ({action:?})");
                if action == SurfaceErrorAction::Reconfigured {
                    self.surface.configure(gpu.device(), &self.config);
                }
                Err(action)
            }
        }
    }
}

/// Keeps a surface current on the shared render device.
pub struct CurrentGuard<'a> {
    rd: &'a mut RenderDevice<WgpuBackend>,
    previous: Option<WindowFrame>,
    binding: WindowBinding,
}

/// Makes `surface` the render device's window target until the guard drops.
pub fn make_current<'a>(
    rd: &'a mut RenderDevice<WgpuBackend>,
    gpu: &GpuContext,
    surface: &mut RenderSurface<'_>,
) -> Result<CurrentGuard<'a>, SurfaceErrorAction> {
    let frame = surface.acquire(gpu)?;
    let size = surface.size();
    let binding = rd.make_window_current(size.width, size.height);
    let previous = rd.api_mut().attach_frame(frame);
    Ok(CurrentGuard { rd, previous, binding })
}

impl CurrentGuard<'_> {
    /// Presents what was drawn to the surface.
    pub fn flush_buffer(&mut self) {
        self.rd.swap_buffers();
    }
}

impl Deref for CurrentGuard<'_> {
    type Target = RenderDevice<WgpuBackend>;

    fn deref(&self) -> &Self::Target {
        self.rd
    }
}

impl DerefMut for CurrentGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.rd
    }
}

impl Drop for CurrentGuard<'_> {
    fn drop(&mut self) {
        // An unpresented frame is discarded with the detached surface texture.
        let _ = self.rd.api_mut().detach_frame();
        if let Some(previous) = self.previous.take() {
            self.rd.api_mut().attach_frame(previous);
        }
        self.rd.restore_window(self.binding);
    }
}
