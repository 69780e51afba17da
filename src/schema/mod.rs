//! Schema module - Configuration types for conversion runs.

mod config;

pub use config::*;
