//! xtstopng CLI - Convert XTS trace files into PNG images.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use xtstopng::{ConvertConfig, Converter, PngSink, TableScope};

/// Convert run-length-encoded XTS pixel traces into PNG images
#[derive(Parser)]
#[command(name = "xtstopng", version, about)]
struct CliArgs {
    /// Trace files to convert
    #[arg(required_unless_present = "print_config")]
    inputs: Vec<PathBuf>,

    /// Color table lifetime: "frame" (fresh colors per frame) or "global"
    /// (one palette for every input)
    #[arg(long)]
    scope: Option<TableScope>,

    /// Directory to write images into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl CliArgs {
    /// Build the effective configuration; command line flags win over the file.
    fn resolve_config(&self) -> Result<ConvertConfig, xtstopng::schema::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ConvertConfig::from_json_file(path)?,
            None => ConvertConfig::default(),
        };
        if let Some(scope) = self.scope {
            config.scope = scope;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args = CliArgs::parse();

    let config = args.resolve_config().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if args.print_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing config: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let start = Instant::now();
    let converter = Converter::new(config, PngSink);
    let report = converter.run(&args.inputs);
    let elapsed = start.elapsed();

    println!("Converted {} file(s) [{} scope]", report.files_read, converter.config().scope);
    println!("  Frames: {} written, {} decoded", report.frames_written, report.frames_decoded);
    println!("  Colors: {}", report.colors);
    if report.files_failed + report.parse_errors + report.frames_failed > 0 {
        println!(
            "  Failures: {} unreadable, {} malformed, {} unwritten",
            report.files_failed, report.parse_errors, report.frames_failed
        );
    }
    println!("  Time: {:.2}s", elapsed.as_secs_f32());
}
