//! Compositor
//!
//! Merges the active sources into one video output per frame at a fixed
//! resolution, applying layout rules and per-pixel effects.

pub mod effects;
pub mod layout;
pub mod renderer;
pub mod surface;

pub use effects::VideoEffect;
pub use layout::{Rect, MAX_DRAWN_SOURCES};
pub use renderer::{Compositor, CompositorConfig};
pub use surface::Surface;
