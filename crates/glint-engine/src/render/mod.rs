//! Render state management.
//!
//! [`RenderDevice`] is a write-through cache of pipeline state in front of a
//! [`NativeApi`] backend. It never reads state back from the backend; every
//! redundant change is filtered out before a [`NativeCall`] is emitted.
//!
//! Conventions:
//! - Rectangles are in pixels with a top-left origin, +Y down.
//! - Projections map the top of the viewport to NDC y = -1 (see [`projection`]).

mod caps;
mod device;
mod error;
mod native;
pub mod projection;
mod resource;
mod shader;
mod state;
mod stats;
mod types;

pub use caps::{Caps, MAX_TRACKED_TEXTURE_IMAGE_UNITS, MAX_TRACKED_TEXTURE_UNITS, StencilSupport};
pub use device::{RenderDevice, WindowBinding};
pub use error::FramebufferError;
pub use native::{Capability, NativeApi, NativeCall, RecordingApi, StencilFace};
pub use resource::{AttachmentPoint, Framebuffer, ResourceId, Texture, TextureFormat};
pub use shader::{Args, IndexStream, Shader, Uniform, VertexStream};
pub use state::{BlendState, Matrices, RenderState, StencilState, TextureUnit};
pub use stats::RenderStats;
#[cfg(test)]
pub(crate) use device::test_support;
pub use types::{
    AlphaTest, BlendEq, BlendFunc, ColorBuffer, CombineMode, Compare, CullFace, DepthTest,
    FramebufferTarget, LogicOp, PrimitiveType, RenderMode, ShadeMode, StencilOp, StencilTest,
};
