//! Coordinate and geometry types shared by the render device and the widgets.
//!
//! Canonical CPU space:
//! - Pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The render device converts to the native bottom-left convention when the
//! Y-inversion flag asks for it.

mod color;
mod rect;

pub use color::{Color3, Color4};
pub use rect::Rect2D;

pub use glam::{Mat4, Vec2, Vec3, Vec4};
