//! Windows and the runtime loop.
//!
//! Owns the `winit` EventLoop and its windows. Every window holds a
//! [`SurfaceWidget`] bound to a [`RenderSurface`]; all of them share one
//! [`GpuContext`](crate::device::GpuContext) and one render device, and the
//! runtime updates each widget on a fixed tick.

mod context;
mod runtime;
mod widget;

pub use context::{CurrentGuard, RenderSurface, make_current};
pub use runtime::{DEFAULT_TICK, Runtime, RuntimeConfig, WindowSpec};
pub use widget::{SurfaceWidget, WidgetConfig};
