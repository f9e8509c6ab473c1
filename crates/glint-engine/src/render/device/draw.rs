//! Shader application and primitive submission.

use std::rc::Rc;

use crate::render::native::{NativeApi, NativeCall};
use crate::render::shader::{Args, IndexStream, Shader};
use crate::render::types::PrimitiveType;

use super::RenderDevice;

impl<A: NativeApi> RenderDevice<A> {
    /// Binds `shader` with `args`. Textures in `args` go to image units in the
    /// order they were set.
    pub fn apply(&mut self, shader: &Rc<Shader>, args: &Args) {
        for (unit, (name, texture)) in args.textures().iter().enumerate() {
            if unit >= self.caps.num_textures {
                log::warn!("shader {}: texture {name} exceeds {} units", shader.name(), self.caps.num_textures);
                break;
            }
            self.set_texture(unit, Some(texture.clone()));
        }
        self.major_state_change();
        self.emit(NativeCall::UseProgram {
            shader: shader.clone(),
            uniforms: args.packed_uniforms(),
            streams: args.streams().to_vec(),
        });
    }

    /// Draws `count` vertices of the applied streams starting at `start`.
    pub fn send_sequential_indices(&mut self, primitive: PrimitiveType, start: u32, count: u32) {
        self.before_primitive();
        if !self.assert_framebuffer_complete() {
            return;
        }
        self.emit(NativeCall::DrawArrays { primitive, start, count });
        self.count_primitive(primitive, count as usize);
    }

    /// Draws the applied streams through `indices`.
    pub fn send_indices(&mut self, primitive: PrimitiveType, indices: &Rc<IndexStream>) {
        self.before_primitive();
        if !self.assert_framebuffer_complete() {
            return;
        }
        self.emit(NativeCall::DrawElements { primitive, indices: indices.clone() });
        self.count_primitive(primitive, indices.len());
    }

    /// Applies `shader` and draws every vertex of `args`.
    pub fn draw(&mut self, shader: &Rc<Shader>, args: &Args, primitive: PrimitiveType) {
        self.apply(shader, args);
        self.send_sequential_indices(primitive, 0, args.vertex_count() as u32);
    }

    fn count_primitive(&mut self, primitive: PrimitiveType, count: usize) {
        self.stats.primitives += 1;
        self.stats.triangles += primitive.triangle_count(count) as u64;
    }
}
