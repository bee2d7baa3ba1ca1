//! Batch padding: enumerate a folder, pad each image, report as we go.
//!
//! ## Pipeline per job
//!
//! ```text
//! PadSettings ──▶ ComposeParams   (InvalidRatio, before any I/O)
//! input ──▶ backend.load          (UnreadableSource)
//!       ──▶ plan_sizes            (CanvasTooLarge)
//!       ──▶ compose               (never fails)
//!       ──▶ backend.save          (WriteFailure)
//! ```
//!
//! Metadata is filtered once, between load and save: the ICC profile always
//! survives, EXIF and DPI only with `preserve_extra_metadata`.
//!
//! ## Batch semantics
//!
//! Jobs run one after another. A failing job is reported and the batch moves
//! on. When an output already exists the [`ConflictResolver`] decides; only
//! its `AbortBatch` answer stops the batch early. Progress is delivered as
//! [`PadEvent`]s to a caller-supplied callback so the CLI can print while the
//! batch runs.
//!
//! ## Output Structure
//!
//! ```text
//! scans/                     padded/
//! ├── IMG_0001.jpg     ──▶   ├── IMG_0001_padded.jpg
//! ├── IMG_0002.TIF     ──▶   ├── IMG_0002_padded.TIF
//! ├── notes.txt              │   (ignored: not an image)
//! └── raw/                   │   (ignored: not recursive)
//! ```

use crate::config::{ConfigError, PadConfig};
use crate::conflict::{ConflictDecision, ConflictResolver};
use crate::imaging::{
    BackendError, ComposeParams, ImageBackend, ImageSize, MAX_CANVAS_PIXELS, MAX_CANVAS_SIDE,
    RatioError, RustBackend, compose, plan_sizes,
};
use crate::metadata::MetadataBundle;
use crate::naming::{is_supported_image, output_path_for};
use crate::types::{PadSettings, ProcessingJob};
use image::ColorType;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Why a single job failed. The batch continues after any of these.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Invalid ratio: {0}")]
    InvalidRatio(#[from] RatioError),
    #[error("Cannot read {}: {source}", path.display())]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error(
        "{} would need a {size} canvas (limit: {max_side}px per side, {max_pixels} pixels)",
        path.display(),
        max_side = MAX_CANVAS_SIDE,
        max_pixels = MAX_CANVAS_PIXELS
    )]
    CanvasTooLarge { path: PathBuf, size: ImageSize },
    #[error("Cannot write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// Errors that stop the batch as a whole.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Input is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// What happened to one successfully padded image.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub source_size: ImageSize,
    pub padded_size: ImageSize,
    pub final_size: ImageSize,
    /// Metadata actually written to the output.
    pub metadata: MetadataBundle,
    /// Pixel layout converted to RGB8 for padding, if any.
    pub coerced_from: Option<ColorType>,
}

/// Progress notifications emitted by [`process_batch`].
///
/// `index` is 1-based; `total` is the number of jobs in the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum PadEvent {
    Padded {
        index: usize,
        total: usize,
        input: PathBuf,
        output: PathBuf,
        report: JobReport,
    },
    Skipped {
        index: usize,
        total: usize,
        input: PathBuf,
        output: PathBuf,
    },
    Failed {
        index: usize,
        total: usize,
        input: PathBuf,
        error: String,
    },
    /// The resolver asked to stop; `remaining` jobs were not attempted.
    Aborted { remaining: usize },
}

/// Counts for the final summary line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    /// Input path and error message for each failed job.
    pub failed: Vec<(PathBuf, String)>,
    pub aborted: bool,
}

/// Planned sizes for a job, computed from the header alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePlan {
    pub source_size: ImageSize,
    pub padded_size: ImageSize,
    pub final_size: ImageSize,
}

/// List the supported images directly inside `input_dir`, sorted by file
/// name, each paired with its output path in `output_dir`.
///
/// Not recursive. Does not create `output_dir`.
pub fn enumerate_jobs(
    input_dir: &Path,
    output_dir: &Path,
    suffix: &str,
    settings: PadSettings,
) -> Result<Vec<ProcessingJob>, ProcessError> {
    if !input_dir.is_dir() {
        return Err(ProcessError::NotADirectory(input_dir.to_path_buf()));
    }

    let mut jobs = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_supported_image(entry.path()) {
            continue;
        }
        let Some(output) = output_path_for(entry.path(), output_dir, suffix) else {
            continue;
        };
        jobs.push(ProcessingJob {
            input: entry.into_path(),
            output,
            settings,
        });
    }
    debug!("found {} images in {}", jobs.len(), input_dir.display());
    Ok(jobs)
}

/// Padded and final sizes for `source_size`, refusing any canvas that could
/// not be allocated.
fn checked_plan(
    path: &Path,
    source_size: ImageSize,
    params: &ComposeParams,
) -> Result<(ImageSize, ImageSize), JobError> {
    let (padded_size, final_size) = plan_sizes(source_size, params);
    // a source that already exceeds the limits is saved as decoded
    if final_size != source_size && !final_size.fits_canvas_limits() {
        return Err(JobError::CanvasTooLarge {
            path: path.to_path_buf(),
            size: final_size,
        });
    }
    Ok((padded_size, final_size))
}

/// Pad a single image and write it out.
pub fn process_job(backend: &impl ImageBackend, job: &ProcessingJob) -> Result<JobReport, JobError> {
    let params = job.settings.compose_params()?;

    let source = backend
        .load(&job.input)
        .map_err(|source| JobError::UnreadableSource {
            path: job.input.clone(),
            source,
        })?;
    let metadata = source
        .metadata
        .for_save(job.settings.preserve_extra_metadata);
    debug!(
        "{}: captured {}, keeping {}",
        job.input.display(),
        source.metadata.describe(),
        metadata.describe()
    );

    checked_plan(
        &job.input,
        ImageSize::new(source.image.width(), source.image.height()),
        &params,
    )?;
    let composition = compose(source.image, &params);
    let report = JobReport {
        source_size: composition.source_size,
        padded_size: composition.padded_size,
        final_size: composition.final_size,
        metadata,
        coerced_from: composition.coerced_from,
    };

    backend
        .save(&composition.raster.into_image(), &report.metadata, &job.output)
        .map_err(|source| JobError::WriteFailure {
            path: job.output.clone(),
            source,
        })?;
    Ok(report)
}

/// Planned sizes for a job without decoding pixels.
pub fn plan_job(backend: &impl ImageBackend, job: &ProcessingJob) -> Result<SizePlan, JobError> {
    let params = job.settings.compose_params()?;
    let source_size = backend
        .identify(&job.input)
        .map_err(|source| JobError::UnreadableSource {
            path: job.input.clone(),
            source,
        })?;
    let (padded_size, final_size) = checked_plan(&job.input, source_size, &params)?;
    Ok(SizePlan {
        source_size,
        padded_size,
        final_size,
    })
}

/// Run every job in order, asking `resolver` about existing outputs.
///
/// Output directories are created as needed. Job failures are reported
/// through `on_event` and collected in the summary; only filesystem errors
/// outside a job, or a resolver I/O error, end the batch with `Err`.
pub fn process_batch(
    backend: &impl ImageBackend,
    jobs: &[ProcessingJob],
    resolver: &mut dyn ConflictResolver,
    on_event: &mut dyn FnMut(&PadEvent),
) -> Result<BatchSummary, ProcessError> {
    let total = jobs.len();
    let mut summary = BatchSummary::default();

    for (i, job) in jobs.iter().enumerate() {
        let index = i + 1;
        if let Some(parent) = job.output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if job.output.exists() {
            match resolver.resolve(&job.output)? {
                ConflictDecision::Overwrite => {
                    debug!("overwriting {}", job.output.display());
                }
                ConflictDecision::Skip => {
                    summary.skipped += 1;
                    on_event(&PadEvent::Skipped {
                        index,
                        total,
                        input: job.input.clone(),
                        output: job.output.clone(),
                    });
                    continue;
                }
                ConflictDecision::AbortBatch => {
                    summary.aborted = true;
                    on_event(&PadEvent::Aborted {
                        remaining: total - i,
                    });
                    break;
                }
            }
        }

        match process_job(backend, job) {
            Ok(report) => {
                summary.processed += 1;
                on_event(&PadEvent::Padded {
                    index,
                    total,
                    input: job.input.clone(),
                    output: job.output.clone(),
                    report,
                });
            }
            Err(e) => {
                warn!("{}: {e}", job.input.display());
                let error = e.to_string();
                summary.failed.push((job.input.clone(), error.clone()));
                on_event(&PadEvent::Failed {
                    index,
                    total,
                    input: job.input.clone(),
                    error,
                });
            }
        }
    }

    Ok(summary)
}

/// Pad every supported image in `input_dir` into `output_dir`.
pub fn pad_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: &PadConfig,
    resolver: &mut dyn ConflictResolver,
    on_event: &mut dyn FnMut(&PadEvent),
) -> Result<BatchSummary, ProcessError> {
    let backend = RustBackend::new();
    pad_directory_with_backend(&backend, input_dir, output_dir, config, resolver, on_event)
}

/// Pad a directory using a specific backend (allows testing with mock).
pub fn pad_directory_with_backend(
    backend: &impl ImageBackend,
    input_dir: &Path,
    output_dir: &Path,
    config: &PadConfig,
    resolver: &mut dyn ConflictResolver,
    on_event: &mut dyn FnMut(&PadEvent),
) -> Result<BatchSummary, ProcessError> {
    let settings = config.pad_settings()?;
    let jobs = enumerate_jobs(input_dir, output_dir, &config.output.suffix, settings)?;
    std::fs::create_dir_all(output_dir)?;
    process_batch(backend, &jobs, resolver, on_event)
}
