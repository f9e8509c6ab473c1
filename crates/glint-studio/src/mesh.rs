//! Procedural demo geometry.

use std::f32::consts::TAU;
use std::rc::Rc;

use glam::Vec3;
use glint_engine::render::{Args, IndexStream, VertexStream};

/// Indexed triangle list with per-vertex normals.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// Torus around the Y axis. `rings` segments go around the axis and `sides`
/// around the tube; seams duplicate vertices.
pub fn torus(major: f32, minor: f32, rings: u32, sides: u32) -> MeshData {
    let rings = rings.max(3);
    let sides = sides.max(3);
    let count = ((rings + 1) * (sides + 1)) as usize;

    let mut mesh = MeshData {
        positions: Vec::with_capacity(count),
        normals: Vec::with_capacity(count),
        indices: Vec::with_capacity((rings * sides * 6) as usize),
    };

    for i in 0..=rings {
        let (su, cu) = (i as f32 / rings as f32 * TAU).sin_cos();
        let center = Vec3::new(cu * major, 0.0, su * major);
        for j in 0..=sides {
            let (sv, cv) = (j as f32 / sides as f32 * TAU).sin_cos();
            let normal = Vec3::new(cu * cv, sv, su * cv);
            mesh.positions.push(center + normal * minor);
            mesh.normals.push(normal);
        }
    }

    let stride = sides + 1;
    for i in 0..rings {
        for j in 0..sides {
            let a = i * stride + j;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    mesh
}

/// Mesh streams ready to bind. GPU copies are made on first draw.
pub struct Mesh {
    positions: Rc<VertexStream>,
    normals: Rc<VertexStream>,
    indices: Rc<IndexStream>,
}

impl Mesh {
    pub fn new(data: &MeshData) -> Self {
        Self {
            positions: VertexStream::from_vec3(&data.positions),
            normals: VertexStream::from_vec3(&data.normals),
            indices: IndexStream::new(data.indices.clone()),
        }
    }

    /// Binds positions to location 0 and normals to location 1.
    pub fn bind(&self, args: &mut Args) {
        args.set_attribute(0, self.positions.clone())
            .set_attribute(1, self.normals.clone());
    }

    #[inline]
    pub fn indices(&self) -> &Rc<IndexStream> {
        &self.indices
    }
}
