//! PNG output for rendered frames.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::renderer::RGB_CHANNELS;

/// Errors from writing an image file.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("cannot create {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },
    #[error("cannot encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: png::EncodingError,
    },
    #[error("RGB buffer holds {got} bytes, expected {expected}")]
    BufferSize { expected: usize, got: usize },
}

/// Destination for rendered frames.
pub trait ImageSink {
    /// Write a row-major 8-bit RGB image to `path`.
    fn write_rgb(&self, path: &Path, width: u32, height: u32, rgb: &[u8])
    -> Result<(), EncodeError>;
}

/// Writes 8-bit RGB, non-interlaced PNG files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngSink;

impl PngSink {
    /// Encode an RGB image as PNG into `out`.
    pub fn encode<W: Write>(
        out: W,
        width: u32,
        height: u32,
        rgb: &[u8],
    ) -> Result<(), png::EncodingError> {
        let mut encoder = png::Encoder::new(out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgb)?;
        writer.finish()
    }

    /// Encode into `out`, which writes to the file at `path`.
    ///
    /// On failure the partial file at `path` is removed.
    fn encode_file<W: Write>(
        path: &Path,
        mut out: W,
        width: u32,
        height: u32,
        rgb: &[u8],
    ) -> Result<(), EncodeError> {
        let result = Self::encode(&mut out, width, height, rgb)
            .and_then(|()| out.flush().map_err(png::EncodingError::from));
        drop(out);

        result.map_err(|source| {
            if let Err(e) = fs::remove_file(path) {
                log::warn!("cannot remove partial {}: {}", path.display(), e);
            }
            EncodeError::Encode {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

impl ImageSink for PngSink {
    fn write_rgb(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        rgb: &[u8],
    ) -> Result<(), EncodeError> {
        let expected = width as usize * height as usize * RGB_CHANNELS;
        if rgb.len() != expected {
            return Err(EncodeError::BufferSize {
                expected,
                got: rgb.len(),
            });
        }

        let file = File::create(path).map_err(|source| EncodeError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Self::encode_file(path, BufWriter::new(file), width, height, rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_png(path: &Path) -> (png::OutputInfo, Vec<u8>) {
        let decoder = png::Decoder::new(File::open(path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn test_png_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame-0.png");
        let rgb = vec![255, 255, 255, 0, 0, 0, 127, 0, 0, 1, 2, 3];

        PngSink.write_rgb(&path, 2, 2, &rgb).unwrap();

        let (info, data) = read_png(&path);
        assert_eq!((info.width, info.height), (2, 2));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        assert_eq!(info.bit_depth, png::BitDepth::Eight);
        assert_eq!(data, rgb);
    }

    /// Writer that accepts `limit` bytes, then fails.
    struct ShortWriter {
        inner: File,
        limit: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.limit == 0 {
                return Err(io::Error::other("device full"));
            }
            let n = buf.len().min(self.limit);
            self.limit -= n;
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    #[test]
    fn test_failed_encode_removes_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.png");
        let out = ShortWriter {
            inner: File::create(&path).unwrap(),
            limit: 20,
        };

        let err = PngSink::encode_file(&path, out, 2, 2, &[0; 12]).unwrap_err();

        assert!(matches!(err, EncodeError::Encode { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let err = PngSink.write_rgb(&path, 2, 2, &[0; 5]).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::BufferSize {
                expected: 12,
                got: 5
            }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_create_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        let err = PngSink.write_rgb(&path, 1, 1, &[0, 0, 0]).unwrap_err();
        assert!(matches!(err, EncodeError::Create { .. }));
    }
}
