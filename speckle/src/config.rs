//! Configuration types for particle detection.
//!
//! [`Config`] is a flat, serde-friendly parameter set grouped by pipeline
//! stage. It is validated once at pipeline entry; see [`Config::validated`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Enums
// ============================================================================

/// Pixel connectivity for connected component labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Only horizontal and vertical neighbors are connected.
    #[default]
    Four,
    /// Diagonal neighbors are connected as well.
    Eight,
}

/// How detected particles are painted into the output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Every particle pixel becomes pure red.
    #[default]
    Flat,
    /// Red whose depth follows how dark the pixel is within the threshold band.
    Gradient,
    /// One color per spatial cluster of particles, gray for unclustered ones.
    Clustered,
}

// ============================================================================
// Config
// ============================================================================

/// Parameters for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -- Thresholding --
    /// Sensitivity for the lower edge of the threshold band, in [0, 1].
    pub sensitivity_min: f32,
    /// Sensitivity for the upper edge of the threshold band, in [0, 1].
    /// Higher values admit pixels closer to the local background brightness.
    pub sensitivity_max: f32,
    /// Also reject pixels darker than the lower band edge.
    /// When false, every pixel below the upper edge is a particle pixel and
    /// the lower edge only normalizes gradient coloring.
    pub reject_below_band: bool,

    // -- Background --
    /// Gaussian sigma of the background luminance estimate, in pixels.
    /// Should exceed the radius of the largest particle to be detected.
    pub blur_radius: f32,

    // -- Filtering --
    /// Width of the frame around the processed region that is never marked.
    pub border_width: usize,
    /// Smallest accepted particle, in pixels. 0 disables the lower bound.
    pub min_particle_size: usize,
    /// Largest accepted particle, in pixels.
    pub max_particle_size: Option<usize>,
    pub connectivity: Connectivity,

    // -- Clustering --
    /// DBSCAN neighborhood radius between particle centroids, in pixels.
    pub cluster_eps: f64,
    /// Neighbors (including the particle itself) needed for a core particle.
    pub cluster_min_samples: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensitivity_min: 0.0,
            sensitivity_max: 0.2,
            reject_below_band: false,
            blur_radius: 15.0,
            border_width: 10,
            min_particle_size: 0,
            max_particle_size: None,
            connectivity: Connectivity::Four,
            cluster_eps: 50.0,
            cluster_min_samples: 1,
        }
    }
}

impl Config {
    /// Load a configuration from a YAML or JSON file. Missing keys take defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config: Config = common::file_format::load_from_file(path)?;
        Ok(config)
    }

    /// Check ranges and return a copy with the sensitivity pair in ascending order.
    ///
    /// A reversed `sensitivity_min`/`sensitivity_max` pair is swapped rather
    /// than rejected.
    pub fn validated(&self) -> Result<Config> {
        check_sensitivity("sensitivity_min", self.sensitivity_min)?;
        check_sensitivity("sensitivity_max", self.sensitivity_max)?;

        if !(self.blur_radius.is_finite() && self.blur_radius > 0.0) {
            return Err(Error::invalid_parameter(
                "blur_radius",
                format!("must be positive, got {}", self.blur_radius),
            ));
        }
        if !(self.cluster_eps.is_finite() && self.cluster_eps > 0.0) {
            return Err(Error::invalid_parameter(
                "cluster_eps",
                format!("must be positive, got {}", self.cluster_eps),
            ));
        }
        if self.cluster_min_samples == 0 {
            return Err(Error::invalid_parameter(
                "cluster_min_samples",
                "must be at least 1",
            ));
        }

        let mut config = self.clone();
        if config.sensitivity_min > config.sensitivity_max {
            tracing::debug!(
                "Swapping reversed sensitivities: min={} max={}",
                config.sensitivity_min,
                config.sensitivity_max
            );
            std::mem::swap(&mut config.sensitivity_min, &mut config.sensitivity_max);
        }
        Ok(config)
    }

    /// True when any size bound is active.
    pub fn has_size_bounds(&self) -> bool {
        self.min_particle_size > 0 || self.max_particle_size.is_some()
    }

    /// Whether a component of `pixel_count` pixels passes the size band.
    #[inline]
    pub fn accepts_size(&self, pixel_count: usize) -> bool {
        pixel_count >= self.min_particle_size
            && self.max_particle_size.is_none_or(|max| pixel_count <= max)
    }
}

fn check_sensitivity(name: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_parameter(
            name,
            format!("must be in [0, 1], got {value}"),
        ))
    }
}
