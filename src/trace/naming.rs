//! Output file naming.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Input file name with its final extension removed.
fn stem(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) => name[..dot].to_string(),
        None => name.into_owned(),
    }
}

/// Output file name for frame `index` of `input`.
///
/// The input's directory and final extension are dropped:
/// `traces/run.xts` with index 3 becomes `run-3.png`.
pub fn output_name(input: &Path, index: usize, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}-{index}.{extension}", stem(input)))
}

/// Hands out output paths within one directory, never the same one twice.
///
/// Inputs from different directories can share a stem; the later one gets a
/// `-<n>` suffix (`run-0-1.png`) instead of overwriting the earlier image.
#[derive(Debug)]
pub struct OutputNames {
    dir: PathBuf,
    extension: String,
    used: HashSet<PathBuf>,
}

impl OutputNames {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            used: HashSet::new(),
        }
    }

    /// Reserve the path for frame `index` of `input`.
    pub fn claim(&mut self, input: &Path, index: usize) -> PathBuf {
        let path = self.dir.join(output_name(input, index, &self.extension));
        if self.used.insert(path.clone()) {
            return path;
        }

        let stem = stem(input);
        let mut n = 1;
        loop {
            let candidate = self
                .dir
                .join(format!("{stem}-{index}-{n}.{}", self.extension));
            if self.used.insert(candidate.clone()) {
                log::warn!(
                    "{} already written this run, using {}",
                    path.display(),
                    candidate.display()
                );
                return candidate;
            }
            n += 1;
        }
    }

    /// Number of paths handed out.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
