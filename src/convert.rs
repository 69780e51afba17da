//! Batch conversion of trace files into images.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::palette::{ColorTable, assign_colors};
use crate::render::{ImageSink, render_frame};
use crate::schema::{ConvertConfig, TableScope};
use crate::trace::{Frame, FrameDecoder, OutputNames};

/// Counters from a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Inputs opened successfully.
    pub files_read: usize,
    /// Inputs that could not be opened.
    pub files_failed: usize,
    /// Inputs whose decoding stopped on a malformed frame.
    pub parse_errors: usize,
    pub frames_decoded: usize,
    pub frames_written: usize,
    /// Frames that decoded but could not be rendered or written.
    pub frames_failed: usize,
    /// Distinct colors assigned, summed over every table used.
    pub colors: usize,
}

/// Converts trace files to images according to a [`ConvertConfig`].
pub struct Converter<S> {
    config: ConvertConfig,
    sink: S,
}

impl<S: ImageSink> Converter<S> {
    pub fn new(config: ConvertConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Convert every input. Per-file failures are logged and counted, never
    /// returned.
    pub fn run(&self, inputs: &[PathBuf]) -> ConversionReport {
        if let Err(e) = fs::create_dir_all(&self.config.output_dir) {
            log::error!("{}: {}", self.config.output_dir.display(), e);
        }

        match self.config.scope {
            TableScope::Frame => self.run_per_frame(inputs),
            TableScope::Global => self.run_global(inputs),
        }
    }

    /// Decode, color and write one frame at a time.
    fn run_per_frame(&self, inputs: &[PathBuf]) -> ConversionReport {
        let mut report = ConversionReport::default();
        let mut names = self.output_names();

        for input in inputs {
            let Some(mut decoder) = open_trace(input, &mut report) else {
                continue;
            };
            loop {
                let mut table = ColorTable::with_seed(self.config.level_seed);
                match decoder.next_frame(&mut table) {
                    Ok(Some(frame)) => {
                        report.frames_decoded += 1;
                        report.colors += assign_colors(&mut table);
                        self.emit(input, &frame, &table, &mut names, &mut report);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("{}", e);
                        report.parse_errors += 1;
                        break;
                    }
                }
            }
            log::info!("{}: {} frames", input.display(), decoder.frames_read());
        }

        report
    }

    /// Decode every input into one table, then color and write everything.
    fn run_global(&self, inputs: &[PathBuf]) -> ConversionReport {
        let mut report = ConversionReport::default();
        let mut table = ColorTable::with_seed(self.config.level_seed);
        let mut frames: Vec<(&Path, Frame)> = Vec::new();

        for input in inputs {
            let Some(mut decoder) = open_trace(input, &mut report) else {
                continue;
            };
            loop {
                match decoder.next_frame(&mut table) {
                    Ok(Some(frame)) => {
                        report.frames_decoded += 1;
                        frames.push((input.as_path(), frame));
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("{}", e);
                        report.parse_errors += 1;
                        break;
                    }
                }
            }
            log::info!("{}: {} frames", input.display(), decoder.frames_read());
        }

        report.colors = assign_colors(&mut table);
        log::info!("{} colors", report.colors);

        let mut names = self.output_names();
        for (input, frame) in &frames {
            self.emit(input, frame, &table, &mut names, &mut report);
        }

        report
    }

    fn output_names(&self) -> OutputNames {
        OutputNames::new(&self.config.output_dir, &self.config.extension)
    }

    /// Render `frame` through `table` and hand it to the sink.
    fn emit(
        &self,
        input: &Path,
        frame: &Frame,
        table: &ColorTable,
        names: &mut OutputNames,
        report: &mut ConversionReport,
    ) {
        let path = names.claim(input, frame.index);

        let rgb = match render_frame(frame, table) {
            Ok(rgb) => rgb,
            Err(e) => {
                log::error!("{}: frame {}: {}", input.display(), frame.index, e);
                report.frames_failed += 1;
                return;
            }
        };

        match self.sink.write_rgb(&path, frame.width, frame.height, &rgb) {
            Ok(()) => {
                report.frames_written += 1;
                log::info!("Wrote {}", path.display());
            }
            Err(e) => {
                log::error!("{}", e);
                report.frames_failed += 1;
            }
        }
    }
}

fn open_trace(
    input: &Path,
    report: &mut ConversionReport,
) -> Option<FrameDecoder<BufReader<File>>> {
    match File::open(input) {
        Ok(file) => {
            report.files_read += 1;
            Some(FrameDecoder::new(
                BufReader::new(file),
                input.display().to_string(),
            ))
        }
        Err(e) => {
            log::error!("{}: {}", input.display(), e);
            report.files_failed += 1;
            None
        }
    }
}
