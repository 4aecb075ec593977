//! The detection pipeline.
//!
//! 1. Validate parameters
//! 2. Load and normalize the image
//! 3. Crop to the region of interest (optional)
//! 4. Estimate the background luminance
//! 5. Threshold against the background
//! 6. Label components, filter by size, clear the border frame
//! 7. Cluster particle centroids (clustered mode only)
//! 8. Colorize, paste back, annotate


use std::path::Path;

use image::RgbImage;

use crate::background::estimate_background;
use crate::cluster::{ClusterAssignment, Particle, dbscan, particles_from_labels};
use crate::colorize::{Palette, colorize};
use crate::compose::{area_percentage, compose, summary_lines};
use crate::config::{ColorMode, Config};
use crate::error::{Error, Result};
use crate::filter::{filter_by_size, mask_border};
use crate::ingest::ImageSource;
use crate::labeling::LabelMap;
use crate::region::{Region, crop_gray, crop_rgb};
use crate::threshold::ThresholdBand;

/// Counters collected along the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Components in the raw threshold mask.
    pub raw_components: usize,
    pub rejected_too_small: usize,
    pub rejected_too_large: usize,
    /// Components erased completely by the border frame.
    pub removed_by_border: usize,
    /// Particles assigned to no cluster (clustered mode only).
    pub noise_particles: usize,
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Full-size annotated image.
    pub image: RgbImage,
    /// Share of region pixels marked as particles, in [0, 100].
    pub area_percentage: f64,
    /// Components present in the final mask.
    pub particle_count: usize,
    /// Number of clusters; `Some` only in clustered mode.
    pub cluster_count: Option<usize>,
    /// Surviving particles in label order, centroids in image coordinates.
    pub particles: Vec<Particle>,
    pub diagnostics: Diagnostics,
}

impl ProcessingResult {
    /// Write the annotated image; the format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path).map_err(|source| Error::Encode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Dark-particle detector.
///
/// ```ignore
/// let result = ParticleDetector::from_config(config)
///     .with_region(Region::new(10, 10, 400, 300))
///     .with_mode(ColorMode::Clustered)
///     .detect("sample.png")?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParticleDetector {
    config: Config,
    region: Option<Region>,
    mode: ColorMode,
}

impl ParticleDetector {
    /// Create a detector with default parameters over the whole image.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Restrict processing to `region`.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_mode(mut self, mode: ColorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline on one image.
    pub fn detect(&self, source: impl Into<ImageSource>) -> Result<ProcessingResult> {
        detect_particles(source, &self.config, self.region, self.mode)
    }
}

/// Detect, measure and annotate dark particles.
///
/// Parameters are validated before the image is touched. A region is
/// clamped to the image; a region with no pixels inside it is an error.
pub fn detect_particles(
    source: impl Into<ImageSource>,
    config: &Config,
    region: Option<Region>,
    mode: ColorMode,
) -> Result<ProcessingResult> {
    let config = config.validated()?;
    let image = source.into().load()?;

    let region = region
        .map(|r| r.clamped(image.width(), image.height()))
        .transpose()?;

    let (mut patch, gray) = match &region {
        Some(r) => (crop_rgb(image.rgb(), r), crop_gray(image.gray(), r)),
        None => (image.rgb().clone(), image.gray().clone()),
    };

    let background = estimate_background(&gray, config.blur_radius);
    let band = ThresholdBand::from_background(&background, &config);
    let mut mask = band.mask(&gray, config.reject_below_band);

    let mut labels = LabelMap::from_mask(&mask, config.connectivity);
    let mut diagnostics = Diagnostics {
        raw_components: labels.num_labels(),
        ..Diagnostics::default()
    };

    let rejections = filter_by_size(&mut mask, &mut labels, &config);
    diagnostics.rejected_too_small = rejections.too_small;
    diagnostics.rejected_too_large = rejections.too_large;
    diagnostics.removed_by_border = mask_border(&mut mask, &mut labels, config.border_width);

    let particles = particles_from_labels(&labels);
    let particle_count = particles.len();

    let clusters: Option<ClusterAssignment> = match mode {
        ColorMode::Clustered => {
            if particles.is_empty() {
                tracing::info!("No particles detected, returning image unchanged");
                return Ok(ProcessingResult {
                    image: image.into_rgb(),
                    area_percentage: 0.0,
                    particle_count: 0,
                    cluster_count: Some(0),
                    particles,
                    diagnostics,
                });
            }
            Some(dbscan(&particles, config.cluster_eps, config.cluster_min_samples))
        }
        ColorMode::Flat | ColorMode::Gradient => None,
    };

    let palette = match (&clusters, mode) {
        (Some(assignment), _) => Palette::Clustered {
            labels: &labels,
            assignment,
        },
        (None, ColorMode::Gradient) => Palette::Gradient {
            band: &band,
            gray: &gray,
        },
        (None, _) => Palette::Flat,
    };
    colorize(&mut patch, &mask, palette);

    let area_percentage = area_percentage(mask.count_ones(), mask.len());
    let cluster_count = clusters.as_ref().map(|c| c.num_clusters);
    diagnostics.noise_particles = clusters.as_ref().map_or(0, |c| c.noise_count());

    let lines = summary_lines(area_percentage, particle_count, cluster_count);
    let mut output = image.into_rgb();
    compose(&mut output, patch, region.as_ref(), &lines);

    tracing::info!(
        "Detected {} particles covering {:.2}% (clusters: {:?})",
        particle_count,
        area_percentage,
        cluster_count
    );
    tracing::debug!("{:?}", diagnostics);

    let (offset_x, offset_y) = region.map_or((0.0, 0.0), |r| (r.left as f64, r.top as f64));
    let particles = particles
        .into_iter()
        .map(|p| Particle {
            centroid: (p.centroid.0 + offset_x, p.centroid.1 + offset_y),
            ..p
        })
        .collect();

    Ok(ProcessingResult {
        image: output,
        area_percentage,
        particle_count,
        cluster_count,
        particles,
        diagnostics,
    })
}
