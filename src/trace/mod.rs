//! Trace module - Reading XTS pixel traces.
//!
//! # File Format
//!
//! A trace is plain text holding one or more frames back to back:
//!
//! ```text
//! <width> <height> <depth>
//! <run-hex>,<pixel-hex>      repeat pixel run times
//! <pixel-hex>                a run of one
//! ... until width * height pixels ...
//! <next header, or end of file>
//! ```

mod decoder;
mod naming;

pub use decoder::*;
pub use naming::*;
