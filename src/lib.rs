//! xtstopng - Convert run-length-encoded XTS pixel traces into PNG images.
//!
//! Every distinct pixel value in a trace is interned in a [`ColorTable`] and
//! given a visually distinct color, then each frame is written as its own
//! RGB image.
//!
//! # Architecture
//!
//! - `palette`: the ordered color table and deterministic color assignment
//! - `trace`: decoding frames from trace files, output naming
//! - `render`: resolving frames to RGB and writing PNG files
//! - `schema`: configuration types
//! - `convert`: the batch driver tying the above together
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use xtstopng::{ColorTable, FrameDecoder, assign_colors, render_frame};
//!
//! let mut table = ColorTable::new();
//! let mut decoder = FrameDecoder::new(Cursor::new("2 1 8\n0003,00ff0000\n"), "inline");
//! let frame = decoder.next_frame(&mut table).unwrap().unwrap();
//!
//! assign_colors(&mut table);
//! let rgb = render_frame(&frame, &table).unwrap();
//! assert_eq!(rgb, vec![255; 6]);
//! ```

pub mod convert;
pub mod palette;
pub mod render;
pub mod schema;
pub mod trace;

// Re-export commonly used types
pub use convert::{ConversionReport, Converter};
pub use palette::{ColorEntry, ColorTable, Rgb, assign_colors};
pub use render::{ImageSink, PngSink, render_frame};
pub use schema::{ConvertConfig, TableScope};
pub use trace::{Frame, FrameDecoder, TraceError};
