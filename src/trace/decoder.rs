//! Frame decoder for the XTS text trace format.

use std::collections::TryReserveError;
use std::io::{self, BufRead};

use crate::palette::ColorTable;

/// One decoded frame: dimensions plus row-major pixel values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Zero-based position of this frame within its source file.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    /// Bit depth from the header. Advisory only.
    pub depth: i32,
    /// `width * height` pixel values, row-major.
    pub pixels: Vec<u32>,
}

impl Frame {
    /// Number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Errors raised while decoding a trace.
///
/// Every variant carries the source name and the 1-based line number of the
/// offending input. After any of these the rest of the file is unreadable.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("{file}:{line}: read failed: {source}")]
    Io {
        file: String,
        line: usize,
        source: io::Error,
    },
    #[error("{file}:{line}: bad frame header {content:?} (expected \"<width> <height> <depth>\")")]
    Header {
        file: String,
        line: usize,
        content: String,
    },
    #[error("{file}:{line}: frame has no pixels ({width}x{height})")]
    EmptyFrame {
        file: String,
        line: usize,
        width: u32,
        height: u32,
    },
    #[error("{file}:{line}: frame too large ({width}x{height})")]
    TooLarge {
        file: String,
        line: usize,
        width: u32,
        height: u32,
    },
    #[error("{file}:{line}: bad run {content:?}")]
    BadLine {
        file: String,
        line: usize,
        content: String,
    },
    #[error("{file}:{line}: input ended after {got} of {expected} pixels")]
    Truncated {
        file: String,
        line: usize,
        expected: usize,
        got: usize,
    },
}

/// Parse a hexadecimal field, with or without a `0x` prefix.
fn parse_hex(field: &str) -> Option<u32> {
    let field = field.trim();
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Parse a body line into `(run, pixel)`.
///
/// `run,pixel` repeats `pixel` `run` times; a bare `pixel` is a run of one.
pub fn parse_run(line: &str) -> Option<(u32, u32)> {
    match line.split_once(',') {
        Some((run, pixel)) => Some((parse_hex(run)?, parse_hex(pixel)?)),
        None => Some((1, parse_hex(line)?)),
    }
}

/// Parse a header line into `(width, height, depth)`.
///
/// Depth is advisory, so any signed value is accepted.
fn parse_header(line: &str) -> Option<(u32, u32, i32)> {
    let mut fields = line.split_whitespace();
    let width = fields.next()?.parse().ok()?;
    let height = fields.next()?.parse().ok()?;
    let depth = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((width, height, depth))
}

/// Upper bound on pixels reserved before any body line is read.
const INITIAL_RESERVE: usize = 1 << 16;

/// Bounded writer for a frame's pixel buffer.
///
/// Runs that would overflow the declared pixel count are cut short. The
/// buffer grows as runs arrive, so a header alone never commits memory for
/// the whole frame.
struct PixelCursor {
    pixels: Vec<u32>,
    capacity: usize,
}

impl PixelCursor {
    fn new(capacity: usize) -> Result<Self, TryReserveError> {
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(capacity.min(INITIAL_RESERVE))?;
        Ok(Self { pixels, capacity })
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.capacity - self.pixels.len()
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Write up to `run` copies of `pixel`, returning how many were written.
    fn push_run(&mut self, pixel: u32, run: u32) -> Result<usize, TryReserveError> {
        let n = (run as usize).min(self.remaining());
        self.pixels.try_reserve(n)?;
        self.pixels.extend(std::iter::repeat_n(pixel, n));
        Ok(n)
    }

    fn filled(&self) -> usize {
        self.pixels.len()
    }

    fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }
}

/// Reads frames one at a time from a trace.
///
/// Each frame's pixel values are registered with the caller's
/// [`ColorTable`] as they are decoded.
pub struct FrameDecoder<R> {
    reader: R,
    source: String,
    line: usize,
    buf: String,
    frames_read: usize,
}

impl<R: BufRead> FrameDecoder<R> {
    /// Create a decoder. `source` names the input in error messages.
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            reader,
            source: source.into(),
            line: 0,
            buf: String::new(),
            frames_read: 0,
        }
    }

    /// Name of the input being decoded.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of frames successfully decoded so far.
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// Decode the next frame, registering its pixels with `table`.
    ///
    /// Returns `Ok(None)` when the input ends cleanly before a header.
    pub fn next_frame(&mut self, table: &mut ColorTable) -> Result<Option<Frame>, TraceError> {
        let Some((width, height, depth)) = self.read_header()? else {
            return Ok(None);
        };
        let header_line = self.line;

        if width == 0 || height == 0 {
            return Err(TraceError::EmptyFrame {
                file: self.source.clone(),
                line: header_line,
                width,
                height,
            });
        }
        let count = (width as usize)
            .checked_mul(height as usize)
            .filter(|&n| n <= isize::MAX as usize / size_of::<u32>())
            .ok_or_else(|| self.too_large(header_line, width, height))?;

        let mut cursor =
            PixelCursor::new(count).map_err(|_| self.too_large(header_line, width, height))?;
        while !cursor.is_full() {
            if !self.read_line()? {
                return Err(TraceError::Truncated {
                    file: self.source.clone(),
                    line: self.line,
                    expected: count,
                    got: cursor.filled(),
                });
            }
            let (run, pixel) = parse_run(&self.buf).ok_or_else(|| TraceError::BadLine {
                file: self.source.clone(),
                line: self.line,
                content: self.buf.trim_end().to_string(),
            })?;

            table.find_or_insert(pixel);
            let written = cursor
                .push_run(pixel, run)
                .map_err(|_| self.too_large(header_line, width, height))?;
            if written < run as usize {
                log::debug!(
                    "{}:{}: run of {} truncated to {}",
                    self.source,
                    self.line,
                    run,
                    written
                );
            }
        }

        let frame = Frame {
            index: self.frames_read,
            width,
            height,
            depth,
            pixels: cursor.into_pixels(),
        };
        self.frames_read += 1;
        log::debug!(
            "{}: frame {} is {}x{} (depth {})",
            self.source,
            frame.index,
            width,
            height,
            depth
        );
        Ok(Some(frame))
    }

    fn too_large(&self, line: usize, width: u32, height: u32) -> TraceError {
        TraceError::TooLarge {
            file: self.source.clone(),
            line,
            width,
            height,
        }
    }

    /// Skip blank lines and parse a header, or return `None` at end of input.
    fn read_header(&mut self) -> Result<Option<(u32, u32, i32)>, TraceError> {
        loop {
            if !self.read_line()? {
                return Ok(None);
            }
            if self.buf.trim().is_empty() {
                continue;
            }
            return match parse_header(&self.buf) {
                Some(header) => Ok(Some(header)),
                None => Err(TraceError::Header {
                    file: self.source.clone(),
                    line: self.line,
                    content: self.buf.trim_end().to_string(),
                }),
            };
        }
    }

    /// Read the next line into `buf`. Returns `false` at end of input.
    fn read_line(&mut self) -> Result<bool, TraceError> {
        self.buf.clear();
        let n = self
            .reader
            .read_line(&mut self.buf)
            .map_err(|source| TraceError::Io {
                file: self.source.clone(),
                line: self.line + 1,
                source,
            })?;
        if n == 0 {
            return Ok(false);
        }
        self.line += 1;
        Ok(true)
    }
}
