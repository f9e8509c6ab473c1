//! Shader programs and their argument lists.
//!
//! A [`Shader`] is WGSL source with a fixed binding contract:
//!
//! - group 0, binding 0: uniform block. Two built-in `mat4x4<f32>` values
//!   (`projection`, `model_view`) followed by the user uniforms in the order they
//!   were first set on [`Args`], each padded to one `vec4<f32>` slot (matrices
//!   take four).
//! - group 0, binding 1/3: textures bound to image units 0 and 1.
//! - group 0, binding 2: linear sampler.
//! - vertex inputs: one buffer per [`VertexStream`] argument, at the shader
//!   location given when the stream was set.

use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::coords::{Color3, Color4};

use super::resource::{ResourceId, Texture};

#[derive(Debug)]
pub struct Shader {
    id: ResourceId,
    name: String,
    source: String,
}

/// Compared by identity, like the other GPU resources.
impl PartialEq for Shader {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Shader {}

impl Shader {
    pub fn from_wgsl(name: impl Into<String>, source: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id: ResourceId::next(),
            name: name.into(),
            source: source.into(),
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
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A uniform value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Uniform {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl Uniform {
    fn write_slots(&self, out: &mut Vec<[f32; 4]>) {
        match *self {
            Uniform::Float(v) => out.push([v, 0.0, 0.0, 0.0]),
            Uniform::Int(v) => out.push([v as f32, 0.0, 0.0, 0.0]),
            Uniform::Bool(v) => out.push([if v { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0]),
            Uniform::Vec2(v) => out.push([v.x, v.y, 0.0, 0.0]),
            Uniform::Vec3(v) => out.push([v.x, v.y, v.z, 0.0]),
            Uniform::Vec4(v) => out.push(v.to_array()),
            Uniform::Mat4(m) => out.extend(m.to_cols_array_2d()),
        }
    }
}

impl From<f32> for Uniform {
    fn from(v: f32) -> Self {
        Uniform::Float(v)
    }
}

impl From<i32> for Uniform {
    fn from(v: i32) -> Self {
        Uniform::Int(v)
    }
}

impl From<bool> for Uniform {
    fn from(v: bool) -> Self {
        Uniform::Bool(v)
    }
}

impl From<Vec2> for Uniform {
    fn from(v: Vec2) -> Self {
        Uniform::Vec2(v)
    }
}

impl From<Vec3> for Uniform {
    fn from(v: Vec3) -> Self {
        Uniform::Vec3(v)
    }
}

impl From<Vec4> for Uniform {
    fn from(v: Vec4) -> Self {
        Uniform::Vec4(v)
    }
}

impl From<Mat4> for Uniform {
    fn from(v: Mat4) -> Self {
        Uniform::Mat4(v)
    }
}

impl From<Color3> for Uniform {
    fn from(c: Color3) -> Self {
        Uniform::Vec3(Vec3::new(c.r, c.g, c.b))
    }
}

impl From<Color4> for Uniform {
    fn from(c: Color4) -> Self {
        Uniform::Vec4(Vec4::from_array(c.to_array()))
    }
}

/// Per-vertex attribute array of 1 to 4 `f32` components.
#[derive(Debug)]
pub struct VertexStream {
    id: ResourceId,
    components: u32,
    data: Vec<f32>,
}

impl PartialEq for VertexStream {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VertexStream {}

impl VertexStream {
    pub fn new(components: u32, data: Vec<f32>) -> Rc<Self> {
        debug_assert!((1..=4).contains(&components), "vertex streams hold 1 to 4 components");
        debug_assert_eq!(data.len() % components as usize, 0, "partial vertex in stream");
        Rc::new(Self { id: ResourceId::next(), components, data })
    }

    pub fn from_vec3(values: &[Vec3]) -> Rc<Self> {
        Self::new(3, values.iter().flat_map(|v| v.to_array()).collect())
    }

    pub fn from_vec2(values: &[Vec2]) -> Rc<Self> {
        Self::new(2, values.iter().flat_map(|v| v.to_array()).collect())
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn components(&self) -> u32 {
        self.components
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.components as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug)]
pub struct IndexStream {
    id: ResourceId,
    indices: Vec<u32>,
}

impl PartialEq for IndexStream {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for IndexStream {}

impl IndexStream {
    pub fn new(indices: Vec<u32>) -> Rc<Self> {
        Rc::new(Self { id: ResourceId::next(), indices })
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Arguments for one shader invocation.
#[derive(Debug, Default, Clone)]
pub struct Args {
    uniforms: Vec<(String, Uniform)>,
    streams: Vec<(u32, Rc<VertexStream>)>,
    textures: Vec<(String, Rc<Texture>)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a uniform. Re-setting a name keeps its original slot.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<Uniform>) -> &mut Self {
        let value = value.into();
        match self.uniforms.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
        self
    }

    pub fn uniform(&self, name: &str) -> Option<Uniform> {
        self.uniforms.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Binds a vertex attribute stream to a shader input location.
    pub fn set_attribute(&mut self, location: u32, stream: Rc<VertexStream>) -> &mut Self {
        self.streams.retain(|(l, _)| *l != location);
        self.streams.push((location, stream));
        self.streams.sort_by_key(|(l, _)| *l);
        self
    }

    /// Binds a texture to the next free image unit, in call order.
    pub fn set_texture(&mut self, name: &str, texture: Rc<Texture>) -> &mut Self {
        match self.textures.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = texture,
            None => self.textures.push((name.to_string(), texture)),
        }
        self
    }

    #[inline]
    pub fn streams(&self) -> &[(u32, Rc<VertexStream>)] {
        &self.streams
    }

    #[inline]
    pub fn textures(&self) -> &[(String, Rc<Texture>)] {
        &self.textures
    }

    /// Number of vertices shared by all streams (the shortest stream wins).
    pub fn vertex_count(&self) -> usize {
        self.streams.iter().map(|(_, s)| s.len()).min().unwrap_or(0)
    }

    /// Uniforms packed into `vec4` slots, in declaration order.
    pub fn packed_uniforms(&self) -> Vec<[f32; 4]> {
        let mut out = Vec::with_capacity(self.uniforms.len());
        for (_, value) in &self.uniforms {
            value.write_slots(&mut out);
        }
        out
    }
}
