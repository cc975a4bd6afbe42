//! Core conversion pipeline

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ConversionRequest, OutputLayout};
use crate::error::{Result, ImageminError, ErrorContext};

pub mod codecs;
pub mod discovery;
pub mod formats;
pub mod resize;
pub mod validation;

pub use codecs::*;
pub use discovery::*;
pub use formats::*;
pub use resize::*;

/// Converts every qualifying file of a source tree, one at a time
pub struct BatchConverter {
    codecs: CodecRegistry,
    resizer: ImageResizer,
}

/// A decoded source image, alive for one pipeline pass
struct ImageRecord {
    source_path: PathBuf,
    image: image::DynamicImage,
    width: u32,
    height: u32,
}

impl BatchConverter {
    /// Create a converter around an initialised codec registry
    pub fn new(codecs: CodecRegistry) -> Self {
        Self {
            codecs,
            resizer: ImageResizer::new(),
        }
    }

    /// Run a batch and collect every per-file outcome
    pub fn convert(&self, request: &ConversionRequest) -> Result<BatchReport> {
        self.convert_with(request, |_| {})
    }

    /// Run a batch, calling `on_outcome` after each file finishes
    ///
    /// Returns `Err` only for precondition failures, before any file is
    /// read. Per-file failures are reported as [`FileOutcome::Failed`].
    pub fn convert_with<F>(&self, request: &ConversionRequest, mut on_outcome: F) -> Result<BatchReport>
    where
        F: FnMut(&FileOutcome),
    {
        validation::prepare(request)?;

        let start_time = Instant::now();
        let discovery = discover_files(&request.source_directory, request.target_format);
        info!(
            "Converting {} files from {:?} to {} (max {}px)",
            discovery.files.len(),
            request.source_directory,
            request.target_format,
            request.max_dimension
        );

        if !self.codecs.supports_heic() {
            ensure_heic_not_needed(&discovery.files)?;
        }

        let mut report = BatchReport {
            skipped: discovery.skipped,
            ..BatchReport::default()
        };
        let mut written: HashSet<PathBuf> = HashSet::new();

        for source in discovery.files {
            let outcome = match self.output_path(&source, request) {
                Ok(output) => {
                    let outcome = self.process_file(&source, &output, request);
                    if outcome.is_converted() && !written.insert(output.clone()) {
                        warn!("{:?} overwrote an earlier output {:?}", source, output);
                        report.collisions.push(output);
                    }
                    outcome
                }
                Err(e) => FileOutcome::failed(source, &e),
            };

            if let FileOutcome::Failed { source, reason } = &outcome {
                warn!("Failed to process {}: {}", source.display(), reason);
            }

            on_outcome(&outcome);
            report.outcomes.push(outcome);
        }

        report.duration_secs = start_time.elapsed().as_secs_f64();
        info!(
            "Batch finished: {} converted, {} failed, {} skipped in {:.2}s",
            report.converted(),
            report.failed(),
            report.skipped,
            report.duration_secs
        );

        Ok(report)
    }

    /// Convert one file, never failing the batch
    pub fn process_file(&self, source: &Path, output: &Path, request: &ConversionRequest) -> FileOutcome {
        match self.try_process_file(source, output, request) {
            Ok(outcome) => outcome,
            Err(e) => FileOutcome::failed(source.to_path_buf(), &e),
        }
    }

    fn try_process_file(&self, source: &Path, output: &Path, request: &ConversionRequest) -> Result<FileOutcome> {
        debug!("Processing file: {:?} -> {:?}", source, output);

        let record = self.load(source)?;
        let original = (record.width, record.height);
        let target = scaled_dimensions(record.width, record.height, request.max_dimension);

        let resized = self.resizer.resize_to(record.image, target);
        let bytes = self.codecs
            .encode(&resized, request.target_format, &request.settings)
            .with_file_context(record.source_path.clone())?;
        drop(resized);

        if let Some(parent) = output.parent() {
            validation::ensure_directory(parent)?;
        }
        fs::write(output, &bytes)
            .map_err(|e| ImageminError::encode(
                format!("Cannot write '{}': {}", output.display(), e),
                Some(record.source_path.clone()),
            ))?;

        debug!("Saved {:?} ({} bytes)", output, bytes.len());

        Ok(FileOutcome::Converted {
            source: record.source_path,
            output: output.to_path_buf(),
            original,
            scaled: target.as_tuple(),
            bytes_written: bytes.len() as u64,
        })
    }

    fn load(&self, source: &Path) -> Result<ImageRecord> {
        let image = self.codecs.decode(source).with_file_context(source.to_path_buf())?;
        debug!("Loaded image: {}x{}", image.width(), image.height());

        Ok(ImageRecord {
            source_path: source.to_path_buf(),
            width: image.width(),
            height: image.height(),
            image,
        })
    }

    /// Destination path for `source` under the request's layout
    pub fn output_path(&self, source: &Path, request: &ConversionRequest) -> Result<PathBuf> {
        let filename = output_filename(source, request.target_format)?;

        let directory = match request.layout {
            OutputLayout::Flat => request.destination_directory.clone(),
            OutputLayout::Mirror => {
                let relative_parent = source
                    .strip_prefix(&request.source_directory)
                    .ok()
                    .and_then(Path::parent)
                    .unwrap_or_else(|| Path::new(""));
                request.destination_directory.join(relative_parent)
            }
        };

        Ok(directory.join(filename))
    }
}

/// Refuse a batch that contains HEIC sources this build cannot decode
fn ensure_heic_not_needed(files: &[PathBuf]) -> Result<()> {
    let mut heic = files
        .iter()
        .filter(|path| matches!(detect_format_from_path(path), Ok(SourceFormat::Heic)));

    match heic.next() {
        Some(first) => Err(ImageminError::heic_unavailable(
            format!(
                "{} HEIC file(s) found, first '{}', but imagemin was built without the `heic` feature",
                1 + heic.count(),
                first.display()
            ),
            None,
        )),
        None => Ok(()),
    }
}

/// Result of converting one file
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Converted {
        source: PathBuf,
        output: PathBuf,
        original: (u32, u32),
        scaled: (u32, u32),
        bytes_written: u64,
    },
    Failed {
        source: PathBuf,
        reason: String,
    },
}

impl FileOutcome {
    /// Create a failed outcome from an error
    pub fn failed(source: PathBuf, error: &ImageminError) -> Self {
        Self::Failed {
            source,
            reason: error.user_message(),
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    /// One-line human readable status
    pub fn message(&self) -> String {
        match self {
            Self::Converted { source, output, .. } => format!(
                "File '{}' was successfully converted and saved to '{}'.",
                display_name(source),
                display_name(output)
            ),
            Self::Failed { source, reason } => {
                format!("Error while processing '{}': {}", display_name(source), reason)
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,

    /// Files in the tree that did not qualify for the target
    pub skipped: usize,

    /// Outputs written more than once in this run (flat layout only)
    pub collisions: Vec<PathBuf>,

    pub duration_secs: f64,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_converted()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.converted()
    }

    pub fn total_output_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                FileOutcome::Converted { bytes_written, .. } => *bytes_written,
                FileOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}
