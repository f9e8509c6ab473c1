//! Application loop.
//!
//! An [`App`] implements callbacks; a [`LoopController`] drives them one frame
//! at a time on behalf of whatever host owns the window.

mod app;
mod controller;
mod settings;
mod surface;

pub use app::{App, AppCtx};
pub use controller::LoopController;
pub use settings::LoopSettings;
pub use surface::{Posed2D, Posed3D, Surface, Surface2D, sort_and_render_2d};
