//! GPU device management and the wgpu implementation of the native API.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue ([`GpuContext`])
//! - surface configuration helpers and per-frame window targets
//! - [`WgpuBackend`], which executes native calls on wgpu

mod backend;
mod error;
mod frame;
mod gpu;
mod init;
pub(crate) mod surface;

pub use backend::WgpuBackend;
pub use error::SurfaceErrorAction;
pub use frame::WindowFrame;
pub use gpu::GpuContext;
pub use init::GpuInit;
