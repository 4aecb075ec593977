//! Running the pipeline over many images.
//!
//! Every image is processed independently with the same parameters; one
//! failing image is logged and reported in its outcome without stopping the
//! rest. Results keep the order of the input paths in both sequential and
//! parallel mode.


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::config::{ColorMode, Config};
use crate::detector::detect_particles;
use crate::error::{Error, Result};
use crate::region::Region;

/// Suffix appended to the file stem of every output image.
pub const OUTPUT_SUFFIX: &str = "_marked";

// ============================================================================
// Cancellation and progress
// ============================================================================

/// Cooperative cancellation flag shared between a batch and its controller.
///
/// Checked before each image starts; an image already in progress runs to
/// completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress information sent after each finished image.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Images finished so far, including this one.
    pub current: usize,
    pub total: usize,
    /// Source path of the image that just finished.
    pub path: PathBuf,
}

/// Callback type for progress reporting.
pub type ProgressCallback = Arc<dyn Fn(BatchProgress) + Send + Sync>;

// ============================================================================
// Outcomes
// ============================================================================

/// Summary of one successfully processed image.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub output_path: PathBuf,
    pub area_percentage: f64,
    pub particle_count: usize,
    pub cluster_count: Option<usize>,
}

/// Result for one input path.
#[derive(Debug)]
pub struct BatchOutcome {
    pub source: PathBuf,
    pub result: Result<BatchItem>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Output location for `source`: `{output_dir}/{stem}_marked.{ext}`.
pub fn output_path_for(source: &Path, output_dir: &Path) -> PathBuf {
    common::file_utils::suffixed_output_path(source, output_dir, OUTPUT_SUFFIX)
}

// ============================================================================
// Runner
// ============================================================================

/// Applies one parameter set to a list of images.
#[derive(Clone)]
pub struct BatchRunner {
    config: Config,
    output_dir: PathBuf,
    region: Option<Region>,
    mode: ColorMode,
    parallel: bool,
    cancel: CancelToken,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("config", &self.config)
            .field("output_dir", &self.output_dir)
            .field("region", &self.region)
            .field("mode", &self.mode)
            .field("parallel", &self.parallel)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl BatchRunner {
    pub fn new(config: Config, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            region: None,
            mode: ColorMode::default(),
            parallel: false,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Apply the same region to every image.
    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }

    pub fn with_mode(mut self, mode: ColorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Process images on the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Token that cancels this runner.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Process `paths` in order.
    ///
    /// Fails when the parameters are invalid or the output directory cannot
    /// be created; nothing is written in either case. Images not started
    /// before cancellation have no outcome.
    pub fn run(&self, paths: &[PathBuf]) -> Result<Vec<BatchOutcome>> {
        let config = self.config.validated()?;
        std::fs::create_dir_all(&self.output_dir).map_err(|source| Error::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        tracing::info!(
            "Processing {} images into {} ({})",
            paths.len(),
            self.output_dir.display(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let total = paths.len();
        let finished = AtomicUsize::new(0);
        let process = |path: &PathBuf| -> Option<BatchOutcome> {
            if self.cancel.is_cancelled() {
                return None;
            }
            let outcome = self.process_one(&config, path);
            let current = finished.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(callback) = &self.progress {
                callback(BatchProgress {
                    current,
                    total,
                    path: path.clone(),
                });
            }
            Some(outcome)
        };

        let outcomes: Vec<BatchOutcome> = if self.parallel {
            paths
                .par_iter()
                .map(process)
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            let mut outcomes = Vec::with_capacity(total);
            for path in paths {
                match process(path) {
                    Some(outcome) => outcomes.push(outcome),
                    None => break,
                }
            }
            outcomes
        };

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if self.cancel.is_cancelled() {
            tracing::info!("Batch cancelled after {} of {} images", outcomes.len(), total);
        }
        tracing::info!(
            "Batch finished: {} succeeded, {} failed",
            outcomes.len() - failed,
            failed
        );
        Ok(outcomes)
    }

    fn process_one(&self, config: &Config, path: &Path) -> BatchOutcome {
        let result = self.detect_and_save(config, path);
        if let Err(e) = &result {
            tracing::warn!("Skipping {}: {}", path.display(), e);
        }
        BatchOutcome {
            source: path.to_path_buf(),
            result,
        }
    }

    fn detect_and_save(&self, config: &Config, path: &Path) -> Result<BatchItem> {
        let result = detect_particles(path, config, self.region, self.mode)?;
        let output_path = output_path_for(path, &self.output_dir);
        result.save(&output_path)?;

        tracing::info!(
            "{} -> {}: {:.2}%, {} particles",
            path.display(),
            output_path.display(),
            result.area_percentage,
            result.particle_count
        );

        Ok(BatchItem {
            output_path,
            area_percentage: result.area_percentage,
            particle_count: result.particle_count,
            cluster_count: result.cluster_count,
        })
    }
}
