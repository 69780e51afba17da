//! Render module - Turning decoded frames into image files.

mod renderer;
mod sink;

pub use renderer::*;
pub use sink::*;
