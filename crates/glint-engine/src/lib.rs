//! Glint engine crate.
//!
//! A render-state cache over a GPU backend, plus the loop, input and window
//! plumbing that drives applications against it.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
