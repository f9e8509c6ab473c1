//! Shared GPU resource handles.
//!
//! Textures and framebuffers are reference counted (`Rc`). The render state keeps
//! a clone of every bound handle, so a resource lives at least as long as it is
//! bound. The native backend keeps only weak references and releases its side of
//! a resource once the last strong handle is gone.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::Rect2D;

use super::error::FramebufferError;
use super::types::ColorBuffer;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a texture or framebuffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Rgba8Srgb,
    Rgba16Float,
    Depth24,
    Depth32Float,
    Depth24Stencil8,
}

impl TextureFormat {
    #[inline]
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth24 | TextureFormat::Depth32Float | TextureFormat::Depth24Stencil8
        )
    }

    #[inline]
    pub fn has_stencil(self) -> bool {
        matches!(self, TextureFormat::Depth24Stencil8)
    }

    #[inline]
    pub fn is_color(self) -> bool {
        !self.is_depth()
    }

    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba8Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::Depth24 => wgpu::TextureFormat::Depth24Plus,
            TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
            TextureFormat::Depth24Stencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
        }
    }
}

/// 2D texture description plus optional initial pixels.
#[derive(Debug)]
pub struct Texture {
    id: ResourceId,
    name: String,
    width: u32,
    height: u32,
    format: TextureFormat,
    pixels: Option<Vec<u8>>,
}

/// Identity: two handles are equal when they name the same texture.
impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Texture {}

impl Texture {
    /// Texture initialized from tightly packed RGBA8 rows (top row first).
    pub fn from_rgba8(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Rc<Self> {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize, "pixel buffer size mismatch");
        Rc::new(Self {
            id: ResourceId::next(),
            name: name.into(),
            width,
            height,
            format: TextureFormat::Rgba8Srgb,
            pixels: Some(pixels),
        })
    }

    /// Uninitialized texture suitable as a framebuffer attachment.
    pub fn render_target(name: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Rc<Self> {
        Rc::new(Self {
            id: ResourceId::next(),
            name: name.into(),
            width: width.max(1),
            height: height.max(1),
            format,
            pixels: None,
        })
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    #[inline]
    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    #[inline]
    pub fn rect(&self) -> Rect2D {
        Rect2D::from_size(self.width as f32, self.height as f32)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum AttachmentPoint {
    Color(u8),
    Depth,
    Stencil,
    DepthAndStencil,
}

impl AttachmentPoint {
    #[inline]
    pub fn is_depth(self) -> bool {
        matches!(self, AttachmentPoint::Depth | AttachmentPoint::DepthAndStencil)
    }
}

/// Off-screen render target: a set of texture attachments.
///
/// Every attachment change bumps [`Framebuffer::generation`]; the render device
/// uses it to decide whether the native draw/read buffer selection must be
/// resynchronized.
#[derive(Debug)]
pub struct Framebuffer {
    id: ResourceId,
    name: String,
    attachments: RefCell<Vec<(AttachmentPoint, Rc<Texture>)>>,
    generation: Cell<u64>,
}

impl PartialEq for Framebuffer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Framebuffer {}

impl Framebuffer {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id: ResourceId::next(),
            name: name.into(),
            attachments: RefCell::new(Vec::new()),
            generation: Cell::new(0),
        })
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Attaches `texture` at `point`, or detaches with `None`.
    pub fn set(&self, point: AttachmentPoint, texture: Option<Rc<Texture>>) {
        let mut attachments = self.attachments.borrow_mut();
        attachments.retain(|(p, _)| *p != point);
        if let Some(texture) = texture {
            attachments.push((point, texture));
            attachments.sort_by_key(|(p, _)| *p);
        }
        self.generation.set(self.generation.get() + 1);
    }

    pub fn get(&self, point: AttachmentPoint) -> Option<Rc<Texture>> {
        self.attachments
            .borrow()
            .iter()
            .find(|(p, _)| *p == point)
            .map(|(_, t)| t.clone())
    }

    #[inline]
    pub fn has(&self, point: AttachmentPoint) -> bool {
        self.attachments.borrow().iter().any(|(p, _)| *p == point)
    }

    #[inline]
    pub fn num_attachments(&self) -> usize {
        self.attachments.borrow().len()
    }

    /// Snapshot of the attachments in attachment-point order.
    pub fn attachments(&self) -> Vec<(AttachmentPoint, Rc<Texture>)> {
        self.attachments.borrow().clone()
    }

    /// Color attachments as draw buffer selectors, in index order.
    pub fn color_buffers(&self) -> Vec<ColorBuffer> {
        self.attachments
            .borrow()
            .iter()
            .filter_map(|(p, _)| match p {
                AttachmentPoint::Color(i) => Some(ColorBuffer::Color(*i)),
                _ => None,
            })
            .collect()
    }

    /// True when the only attachment is a depth buffer.
    pub fn is_depth_only(&self) -> bool {
        let attachments = self.attachments.borrow();
        attachments.len() == 1 && attachments[0].0.is_depth()
    }

    pub fn width(&self) -> u32 {
        self.attachments.borrow().first().map_or(0, |(_, t)| t.width())
    }

    pub fn height(&self) -> u32 {
        self.attachments.borrow().first().map_or(0, |(_, t)| t.height())
    }

    pub fn rect(&self) -> Rect2D {
        Rect2D::from_size(self.width() as f32, self.height() as f32)
    }

    /// Attachment-level completeness: presence, matching sizes, compatible formats.
    pub fn check(&self) -> Result<(), FramebufferError> {
        let attachments = self.attachments.borrow();
        let Some((_, first)) = attachments.first() else {
            return Err(FramebufferError::MissingAttachment);
        };
        for (point, texture) in attachments.iter() {
            let format_ok = match point {
                AttachmentPoint::Color(_) => texture.format().is_color(),
                AttachmentPoint::Depth => texture.format().is_depth(),
                AttachmentPoint::Stencil | AttachmentPoint::DepthAndStencil => {
                    texture.format().has_stencil()
                }
            };
            if !format_ok {
                return Err(FramebufferError::UnsupportedFormat);
            }
            if texture.width() != first.width() || texture.height() != first.height() {
                return Err(FramebufferError::IncompleteAttachment);
            }
        }
        Ok(())
    }
}
