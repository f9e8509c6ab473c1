//! GPU-side copies of shared render resources.
//!
//! Entries are keyed by [`ResourceId`] and hold only a weak reference to the
//! CPU-side handle; [`ResourceCache::purge`] drops entries whose owner is gone.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wgpu::util::DeviceExt;

use crate::render::{IndexStream, ResourceId, Shader, Texture, VertexStream};

/// A realized texture.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

struct Entry<T, G> {
    owner: Weak<T>,
    gpu: G,
}

impl<T, G> Entry<T, G> {
    fn alive(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

#[derive(Default)]
pub struct ResourceCache {
    textures: HashMap<ResourceId, Entry<Texture, GpuTexture>>,
    vertex_buffers: HashMap<ResourceId, Entry<VertexStream, wgpu::Buffer>>,
    index_buffers: HashMap<ResourceId, Entry<IndexStream, wgpu::Buffer>>,
    modules: HashMap<ResourceId, Entry<Shader, wgpu::ShaderModule>>,
}

impl ResourceCache {
    pub fn texture(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &Rc<Texture>) -> GpuTexture {
        self.textures
            .entry(texture.id())
            .or_insert_with(|| Entry { owner: Rc::downgrade(texture), gpu: create_texture(device, queue, texture) })
            .gpu
            .clone()
    }

    pub fn vertex_buffer(&mut self, device: &wgpu::Device, stream: &Rc<VertexStream>) -> wgpu::Buffer {
        self.vertex_buffers
            .entry(stream.id())
            .or_insert_with(|| {
                let gpu = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("glint vertex stream"),
                    contents: bytemuck::cast_slice(stream.data()),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                Entry { owner: Rc::downgrade(stream), gpu }
            })
            .gpu
            .clone()
    }

    pub fn index_buffer(&mut self, device: &wgpu::Device, stream: &Rc<IndexStream>) -> wgpu::Buffer {
        self.index_buffers
            .entry(stream.id())
            .or_insert_with(|| {
                let gpu = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("glint index stream"),
                    contents: bytemuck::cast_slice(stream.indices()),
                    usage: wgpu::BufferUsages::INDEX,
                });
                Entry { owner: Rc::downgrade(stream), gpu }
            })
            .gpu
            .clone()
    }

    pub fn shader_module(&mut self, device: &wgpu::Device, shader: &Rc<Shader>) -> wgpu::ShaderModule {
        self.modules
            .entry(shader.id())
            .or_insert_with(|| {
                log::debug!("compiling shader '{}'", shader.name());
                let gpu = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(shader.name()),
                    source: wgpu::ShaderSource::Wgsl(shader.source().into()),
                });
                Entry { owner: Rc::downgrade(shader), gpu }
            })
            .gpu
            .clone()
    }

    /// Drops GPU copies of resources nothing refers to anymore.
    pub fn purge(&mut self) -> usize {
        let before = self.len();
        self.textures.retain(|_, e| e.alive());
        self.vertex_buffers.retain(|_, e| e.alive());
        self.index_buffers.retain(|_, e| e.alive());
        self.modules.retain(|_, e| e.alive());
        before - self.len()
    }

    pub fn len(&self) -> usize {
        self.textures.len() + self.vertex_buffers.len() + self.index_buffers.len() + self.modules.len()
    }
}

fn create_texture(device: &wgpu::Device, queue: &wgpu::Queue, texture: &Texture) -> GpuTexture {
    let format = texture.format().to_wgpu();
    let size = wgpu::Extent3d { width: texture.width(), height: texture.height(), depth_or_array_layers: 1 };

    let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT;
    if !texture.format().is_depth() {
        usage |= wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST;
    }

    let gpu = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(texture.name()),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });

    if let Some(pixels) = texture.pixels() {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texture.width() * 4),
                rows_per_image: Some(texture.height()),
            },
            size,
        );
    }

    let view = gpu.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture: gpu, view, format }
}
