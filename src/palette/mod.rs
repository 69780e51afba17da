//! Palette module - Pixel interning and color assignment.

mod assign;
mod table;

pub use assign::*;
pub use table::*;
