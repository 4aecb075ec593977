//! Speckle - adaptive detection of dark particles in photographs.
//!
//! Particles are pixels noticeably darker than their own neighborhood. The
//! pipeline estimates the local background brightness with a Gaussian blur,
//! thresholds each pixel against it, groups marked pixels into connected
//! components, filters them by size, and paints them into an annotated copy
//! of the input:
//! - Flat, gradient or per-cluster coloring
//! - DBSCAN clustering of particle centroids
//! - Optional rectangular region of interest
//! - Batch processing with cancellation and progress reporting
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use speckle::{ColorMode, Config, ParticleDetector};
//!
//! let result = ParticleDetector::from_config(Config::default())
//!     .with_mode(ColorMode::Gradient)
//!     .detect("sample.png")?;
//!
//! println!("{} particles, {:.2}% area", result.particle_count, result.area_percentage);
//! result.save(Path::new("sample_marked.png"))?;
//! ```

pub mod background;
pub mod batch;
pub mod cluster;
pub mod colorize;
pub mod compose;
mod config;
mod detector;
mod error;
pub mod filter;
pub mod ingest;
pub mod labeling;
mod region;
pub mod threshold;

#[cfg(test)]
pub mod testing;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::{ColorMode, Config, Connectivity};
pub use error::{Error, Result};

/// Alternate name for [`Config`].
pub type ProcessingParameters = Config;

// ============================================================================
// Pipeline
// ============================================================================

pub use detector::{Diagnostics, ParticleDetector, ProcessingResult, detect_particles};
pub use ingest::{ImageSource, PixelImage};
pub use region::{Region, crop_gray, crop_rgb, paste_rgb};

// ============================================================================
// Particles and clusters
// ============================================================================

pub use cluster::{Cluster, NOISE, Particle, cluster_color};

// ============================================================================
// Batch processing
// ============================================================================

pub use batch::{
    BatchItem, BatchOutcome, BatchProgress, BatchRunner, CancelToken, ProgressCallback,
};
