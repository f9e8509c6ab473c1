//! Executes [`NativeCall`]s on wgpu.
//!
//! wgpu has no global state, so the backend keeps an emulated copy of what a
//! GL driver would hold ([`GlState`]) and folds it into a render pipeline at
//! every draw. Each draw or clear records its own render pass with
//! `LoadOp::Load`; passes are batched in one command encoder until a flush,
//! swap or readback.
//!
//! Memory row 0 of every target is the top row. Native rectangles have a
//! bottom-left origin and are flipped against the target height, which leaves
//! off-screen renders upside down in memory relative to the window.

mod pipeline;
mod readback;
mod resources;
mod state;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::coords::Rect2D;
use crate::render::{
    AttachmentPoint, Caps, ColorBuffer, Framebuffer, NativeApi, NativeCall, StencilSupport, Texture,
};

use super::{GpuContext, WindowFrame};

use pipeline::{ClearKey, PipelineKey, PolygonSupport, TargetFormats, clear_shader_source, to_target_rect, vertex_format};
use resources::{GpuTexture, ResourceCache};
use state::{Action, GlState, Program, TEXTURE_SLOTS};

/// Maps GL clip-space depth `[-w, w]` to wgpu's `[0, w]`.
const GL_TO_WGPU_DEPTH: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.5, 0.0, //
    0.0, 0.0, 0.5, 1.0,
]);

/// Built-in uniform slots: projection and model-view.
const BUILTIN_UNIFORM_SLOTS: usize = 8;

/// Attachments resolved for one pass.
struct DrawTarget {
    colors: Vec<(wgpu::TextureView, wgpu::TextureFormat)>,
    depth: Option<(wgpu::TextureView, wgpu::TextureFormat)>,
    width: u32,
    height: u32,
}

impl DrawTarget {
    fn formats(&self) -> TargetFormats {
        TargetFormats {
            colors: self.colors.iter().map(|(_, f)| *f).collect(),
            depth: self.depth.as_ref().map(|(_, f)| *f),
        }
    }

    fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.depth.is_none()
    }
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    caps: Caps,
    polygons: PolygonSupport,

    gl: GlState,
    resources: ResourceCache,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    clear_pipelines: HashMap<ClearKey, wgpu::RenderPipeline>,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    white: GpuTexture,

    encoder: Option<wgpu::CommandEncoder>,
    frame: Option<WindowFrame>,
    warned: HashSet<&'static str>,
}

impl WgpuBackend {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = gpu.device().clone();
        let queue = gpu.queue().clone();

        let caps = Caps {
            stencil: StencilSupport::SeparateAti,
            num_textures: TEXTURE_SLOTS,
            num_texture_units: TEXTURE_SLOTS,
            num_texture_coords: TEXTURE_SLOTS,
            framebuffer_objects: true,
            blend_equation: true,
            max_color_attachments: (device.limits().max_color_attachments as usize).min(4),
        };

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glint bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(3),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glint pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glint sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let white = white_texture(&device, &queue);

        Self {
            device,
            queue,
            caps,
            polygons: PolygonSupport::from_features(gpu.device().features()),
            gl: GlState::default(),
            resources: ResourceCache::default(),
            pipelines: HashMap::new(),
            clear_pipelines: HashMap::new(),
            bind_group_layout,
            pipeline_layout,
            sampler,
            white,
            encoder: None,
            frame: None,
            warned: HashSet::new(),
        }
    }

    // ── window frames ─────────────────────────────────────────────────────

    /// Makes `frame` the default framebuffer. Returns the previous one.
    pub fn attach_frame(&mut self, frame: WindowFrame) -> Option<WindowFrame> {
        self.flush();
        self.frame.replace(frame)
    }

    /// Detaches the default framebuffer after submitting pending work.
    pub fn detach_frame(&mut self) -> Option<WindowFrame> {
        self.flush();
        self.frame.take()
    }

    #[inline]
    pub fn has_frame(&self) -> bool {
        self.frame.is_some()
    }

    // ── commands ──────────────────────────────────────────────────────────

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("glint encoder") })
        })
    }

    /// Submits recorded passes.
    fn flush(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    fn swap(&mut self) {
        self.flush();
        match self.frame.as_mut() {
            Some(frame) => {
                if !frame.present() {
                    log::warn!("swap requested for an already presented frame");
                }
            }
            None => log::warn!("swap requested with no window surface attached"),
        }
        let purged = self.resources.purge();
        if purged > 0 {
            log::trace!("released {purged} gpu resources");
        }
    }

    fn warn_once(&mut self, what: &'static str) {
        if self.warned.insert(what) {
            log::warn!("{what}");
        }
    }

    // ── targets ───────────────────────────────────────────────────────────

    fn draw_target(&mut self) -> Option<DrawTarget> {
        let outputs = self.gl.color_outputs();
        let target = match self.gl.draw_fb.clone() {
            None => {
                let Some(frame) = self.frame.as_ref() else {
                    self.warn_once("draw to the window with no surface attached; skipped");
                    return None;
                };
                if frame.presented() {
                    self.warn_once("draw to an already presented frame; skipped");
                    return None;
                }
                DrawTarget {
                    colors: if outputs.is_empty() { Vec::new() } else { vec![(frame.view.clone(), frame.format)] },
                    depth: frame.depth.clone(),
                    width: frame.width,
                    height: frame.height,
                }
            }
            Some(fb) => self.framebuffer_target(&fb, &outputs),
        };
        (!target.is_empty()).then_some(target)
    }

    fn framebuffer_target(&mut self, fb: &Rc<Framebuffer>, outputs: &[ColorBuffer]) -> DrawTarget {
        let mut colors = Vec::with_capacity(outputs.len());
        for buffer in outputs {
            let ColorBuffer::Color(i) = *buffer else { continue };
            if let Some(texture) = fb.get(AttachmentPoint::Color(i)) {
                let gpu = self.resources.texture(&self.device, &self.queue, &texture);
                colors.push((gpu.view, gpu.format));
            }
        }
        let depth = fb
            .get(AttachmentPoint::DepthAndStencil)
            .or_else(|| fb.get(AttachmentPoint::Depth))
            .map(|t| {
                let gpu = self.resources.texture(&self.device, &self.queue, &t);
                (gpu.view, gpu.format)
            });
        DrawTarget { colors, depth, width: fb.width(), height: fb.height() }
    }

    fn begin_pass<'e>(encoder: &'e mut wgpu::CommandEncoder, target: &DrawTarget, label: &str) -> wgpu::RenderPass<'e> {
        let colors: Vec<Option<wgpu::RenderPassColorAttachment>> = target
            .colors
            .iter()
            .map(|(view, _)| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: keep(),
                    depth_slice: None,
                })
            })
            .collect();
        let depth = target.depth.as_ref().map(|(view, format)| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: format.has_depth_aspect().then(keep),
            stencil_ops: format.has_stencil_aspect().then(keep),
        });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &colors,
            depth_stencil_attachment: depth,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn scissor(&self, target: &DrawTarget) -> Option<Option<[u32; 4]>> {
        if !self.gl.enabled.scissor_test {
            return Some(None);
        }
        to_target_rect(self.gl.scissor, target.width, target.height).map(Some)
    }

    // ── draws ─────────────────────────────────────────────────────────────

    fn draw(&mut self, call: &NativeCall) {
        let (topology, indices, range) = match call {
            NativeCall::DrawArrays { primitive, start, count } => (*primitive, None, *start..start + count),
            NativeCall::DrawElements { primitive, indices } => {
                (*primitive, Some(indices.clone()), 0..indices.len() as u32)
            }
            _ => return,
        };
        if range.is_empty() {
            return;
        }
        let Some(program) = self.gl.program.clone() else {
            self.warn_once("draw without a shader program; skipped");
            return;
        };
        let Some(target) = self.draw_target() else { return };
        let Some([vx, vy, vw, vh]) = to_target_rect(self.gl.viewport, target.width, target.height) else {
            return;
        };
        let Some(scissor) = self.scissor(&target) else { return };

        let vertex_layout = program.streams.iter().map(|(loc, s)| (*loc, s.components())).collect();
        let key = PipelineKey::new(
            &self.gl,
            program.shader.id(),
            &target.formats(),
            vertex_layout,
            topology,
            self.polygons,
        );
        if key.polygon_mode != self.gl.polygon_mode {
            self.warn_once("polygon mode not supported by this device; drawing solid");
        }
        let pipeline = self.pipeline(&key, &program);
        let bind_group = self.draw_bind_group(&program);
        let vertex_buffers: Vec<wgpu::Buffer> = program
            .streams
            .iter()
            .map(|(_, s)| self.resources.vertex_buffer(&self.device, s))
            .collect();
        let index_buffer = indices.as_ref().map(|i| self.resources.index_buffer(&self.device, i));

        let (near, far) = self.depth_range();
        let stencil_ref = self.gl.stencil_ref.clamp(0, 0xff) as u32;

        let encoder = self.encoder();
        let mut pass = Self::begin_pass(encoder, &target, "glint draw pass");
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        for (slot, buffer) in vertex_buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        pass.set_viewport(vx as f32, vy as f32, vw as f32, vh as f32, near, far);
        if let Some([x, y, w, h]) = scissor {
            pass.set_scissor_rect(x, y, w, h);
        }
        pass.set_stencil_reference(stencil_ref);
        match index_buffer {
            Some(buffer) => {
                pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(range, 0, 0..1);
            }
            None => pass.draw(range, 0..1),
        }
    }

    fn depth_range(&mut self) -> (f32, f32) {
        let (near, far) = self.gl.depth_range;
        let (near, far) = (near.clamp(0.0, 1.0), far.clamp(0.0, 1.0));
        if near > far {
            self.warn_once("reversed depth range not supported; using [0, 1]");
            return (0.0, 1.0);
        }
        (near, far)
    }

    fn pipeline(&mut self, key: &PipelineKey, program: &Program) -> wgpu::RenderPipeline {
        if let Some(p) = self.pipelines.get(key) {
            return p.clone();
        }
        log::debug!("creating pipeline for shader '{}' ({} cached)", program.shader.name(), self.pipelines.len());

        let module = self.resources.shader_module(&self.device, &program.shader);
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .vertex_layout
            .iter()
            .map(|&(location, components)| {
                [wgpu::VertexAttribute { format: vertex_format(components), offset: 0, shader_location: location }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = key
            .vertex_layout
            .iter()
            .zip(&attributes)
            .map(|(&(_, components), attrs)| wgpu::VertexBufferLayout {
                array_stride: components as u64 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();
        let targets = key.color_targets();

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.shader.name()),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &targets,
            }),
            primitive: key.primitive_state(),
            depth_stencil: key.depth_stencil_state(),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.pipelines.insert(key.clone(), pipeline.clone());
        pipeline
    }

    fn draw_bind_group(&mut self, program: &Program) -> wgpu::BindGroup {
        let mut slots: Vec<[f32; 4]> = Vec::with_capacity(BUILTIN_UNIFORM_SLOTS + program.uniforms.len());
        slots.extend((GL_TO_WGPU_DEPTH * self.gl.projection).to_cols_array_2d());
        slots.extend(self.gl.model_view.to_cols_array_2d());
        slots.extend_from_slice(&program.uniforms);

        let views = [self.texture_view(0), self.texture_view(1)];
        self.bind_group(bytemuck::cast_slice(&slots), views)
    }

    fn texture_view(&mut self, unit: usize) -> wgpu::TextureView {
        match self.gl.textures.get(unit).cloned().flatten() {
            Some(texture) if texture.format().is_depth() => {
                self.warn_once("sampling depth textures is not supported; bound white instead");
                self.white.view.clone()
            }
            Some(texture) => self.resources.texture(&self.device, &self.queue, &texture).view,
            None => self.white.view.clone(),
        }
    }

    fn bind_group(&self, uniforms: &[u8], [t0, t1]: [wgpu::TextureView; 2]) -> wgpu::BindGroup {
        let ubo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glint uniforms"),
            contents: uniforms,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&t0) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&t1) },
            ],
        })
    }

    // ── clears ────────────────────────────────────────────────────────────

    fn clear(&mut self, color: bool, depth: bool, stencil: bool) {
        let Some(target) = self.draw_target() else { return };
        let Some(key) = ClearKey::new(&target.formats(), color, depth, stencil) else { return };
        let Some(scissor) = self.scissor(&target) else { return };

        let pipeline = self.clear_pipeline(&key);
        let c = self.gl.clear_color;
        let params: [[f32; 4]; 2] = [[c.r, c.g, c.b, c.a], [self.gl.clear_depth.clamp(0.0, 1.0), 0.0, 0.0, 0.0]];
        let bind_group = self.bind_group(bytemuck::cast_slice(&params), [self.white.view.clone(), self.white.view.clone()]);
        let stencil_ref = (self.gl.clear_stencil & 0xff) as u32;

        let encoder = self.encoder();
        let mut pass = Self::begin_pass(encoder, &target, "glint clear pass");
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_viewport(0.0, 0.0, target.width as f32, target.height as f32, 0.0, 1.0);
        if let Some([x, y, w, h]) = scissor {
            pass.set_scissor_rect(x, y, w, h);
        }
        pass.set_stencil_reference(stencil_ref);
        pass.draw(0..3, 0..1);
    }

    fn clear_pipeline(&mut self, key: &ClearKey) -> wgpu::RenderPipeline {
        if let Some(p) = self.clear_pipelines.get(key) {
            return p.clone();
        }
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glint clear"),
            source: wgpu::ShaderSource::Wgsl(clear_shader_source(key.colors.len()).into()),
        });
        let targets = key.color_targets();
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("glint clear pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &targets,
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: key.depth_stencil_state(),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.clear_pipelines.insert(key.clone(), pipeline.clone());
        pipeline
    }

    // ── read-back ─────────────────────────────────────────────────────────

    fn read_texture(&mut self) -> Result<wgpu::Texture> {
        match self.gl.read_fb.clone() {
            None => {
                if !matches!(self.gl.read_buffer, ColorBuffer::Back | ColorBuffer::Front) {
                    bail!("read buffer {:?} is not a window buffer", self.gl.read_buffer);
                }
                let frame = self.frame.as_ref().context("no window surface attached")?;
                frame.texture().cloned().context("window frame was already presented")
            }
            Some(fb) => {
                let ColorBuffer::Color(i) = self.gl.read_buffer else {
                    bail!("read buffer {:?} is not a color attachment", self.gl.read_buffer);
                };
                let texture: Rc<Texture> = fb
                    .get(AttachmentPoint::Color(i))
                    .ok_or_else(|| anyhow!("framebuffer '{}' has no color attachment {i}", fb.name()))?;
                Ok(self.resources.texture(&self.device, &self.queue, &texture).texture)
            }
        }
    }
}

impl NativeApi for WgpuBackend {
    fn caps(&self) -> Caps {
        self.caps.clone()
    }

    fn submit(&mut self, call: NativeCall) {
        match self.gl.apply(&call) {
            Action::None => {}
            Action::Clear { color, depth, stencil } => self.clear(color, depth, stencil),
            Action::Draw => self.draw(&call),
            Action::Flush => self.flush(),
            Action::Swap => self.swap(),
            Action::Unsupported(what) => self.warn_once(what),
        }
    }

    fn read_pixels(&mut self, rect: Rect2D) -> Result<image::RgbaImage> {
        self.flush();
        let texture = self.read_texture()?;
        let (tw, th) = (texture.width(), texture.height());

        let native = [rect.x0() as i32, rect.y0() as i32, rect.width() as i32, rect.height() as i32];
        let Some([x, top, w, h]) = to_target_rect(native, tw, th) else {
            return Ok(image::RgbaImage::new(0, 0));
        };
        let pixels = readback::read_region(&self.device, &self.queue, &texture, (x, top), (w, h))?;
        image::RgbaImage::from_raw(w, h, pixels).context("readback size mismatch")
    }
}

/// Load and store, so consecutive passes accumulate.
fn keep<V>() -> wgpu::Operations<V> {
    wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store }
}

fn white_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> GpuTexture {
    let size = wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 };
    let format = wgpu::TextureFormat::Rgba8Unorm;
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("glint white"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[0xff; 4],
        wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(4), rows_per_image: Some(1) },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view, format }
}
