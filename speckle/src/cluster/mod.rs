//! Spatial grouping of particles.
//!
//! Each surviving component is reduced to its centroid, and centroids are
//! grouped with DBSCAN: a particle with at least `min_samples` centroids
//! (itself included) within `eps` is a core particle, clusters grow through
//! chains of core particles, and particles reachable from no core are noise.
//! Neighborhood queries go through a 2D k-d tree.

mod spatial;

use std::collections::VecDeque;

use image::Rgb;
use serde::{Deserialize, Serialize};

pub use spatial::KdTree;

use crate::labeling::LabelMap;

/// Cluster id of particles that belong to no cluster.
pub const NOISE: i32 = -1;

/// Color of noise particles in clustered output.
pub const NOISE_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

const UNVISITED: i32 = i32::MIN;

/// One detected particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Component label in the final label map.
    pub id: u32,
    pub pixel_count: usize,
    /// Mean (column, row) of the particle's pixels.
    pub centroid: (f64, f64),
}

/// A group of particles sharing one color.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Sequential id, or [`NOISE`].
    pub id: i32,
    /// Particle ids of the members, ascending.
    pub members: Vec<u32>,
    pub color: Rgb<u8>,
}

/// Particles of a label map, ordered by label.
pub fn particles_from_labels(labels: &LabelMap) -> Vec<Particle> {
    labels
        .component_stats()
        .iter()
        .enumerate()
        .filter(|(_, stats)| stats.pixel_count > 0)
        .map(|(i, stats)| Particle {
            id: i as u32 + 1,
            pixel_count: stats.pixel_count,
            centroid: stats.centroid(),
        })
        .collect()
}

/// Cluster id per particle, in particle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    pub labels: Vec<i32>,
    pub num_clusters: usize,
}

impl ClusterAssignment {
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// Group particles by cluster. Non-noise clusters come first in id order,
    /// followed by one noise group when any particle is noise.
    pub fn clusters(&self, particles: &[Particle]) -> Vec<Cluster> {
        assert_eq!(particles.len(), self.labels.len(), "particle count mismatch");

        let mut clusters: Vec<Cluster> = (0..self.num_clusters)
            .map(|id| Cluster {
                id: id as i32,
                members: Vec::new(),
                color: cluster_color(id, self.num_clusters),
            })
            .collect();
        let mut noise = Vec::new();

        for (particle, &label) in particles.iter().zip(&self.labels) {
            if label == NOISE {
                noise.push(particle.id);
            } else {
                clusters[label as usize].members.push(particle.id);
            }
        }

        if !noise.is_empty() {
            clusters.push(Cluster {
                id: NOISE,
                members: noise,
                color: NOISE_COLOR,
            });
        }
        clusters
    }

    /// Display color of particle `index`.
    pub fn color_of(&self, index: usize) -> Rgb<u8> {
        match self.labels[index] {
            NOISE => NOISE_COLOR,
            id => cluster_color(id as usize, self.num_clusters),
        }
    }
}

/// DBSCAN over particle centroids.
///
/// `eps` is an inclusive radius. Cluster ids are assigned in order of the
/// first core particle of each cluster, so results depend only on particle
/// order.
pub fn dbscan(particles: &[Particle], eps: f64, min_samples: usize) -> ClusterAssignment {
    let points: Vec<(f64, f64)> = particles.iter().map(|p| p.centroid).collect();
    let Some(tree) = KdTree::build(&points) else {
        return ClusterAssignment {
            labels: Vec::new(),
            num_clusters: 0,
        };
    };

    let mut labels = vec![UNVISITED; points.len()];
    let mut num_clusters = 0usize;
    let mut queue = VecDeque::new();

    for i in 0..points.len() {
        if labels[i] != UNVISITED {
            continue;
        }

        let neighbors = tree.radius_search(points[i], eps);
        if neighbors.len() < min_samples {
            labels[i] = NOISE;
            continue;
        }

        let cluster_id = num_clusters as i32;
        num_clusters += 1;
        labels[i] = cluster_id;

        queue.clear();
        queue.extend(neighbors);
        while let Some(j) = queue.pop_front() {
            if labels[j] == NOISE {
                // Border particle: reachable, but not a core.
                labels[j] = cluster_id;
                continue;
            }
            if labels[j] != UNVISITED {
                continue;
            }

            labels[j] = cluster_id;
            let expansion = tree.radius_search(points[j], eps);
            if expansion.len() >= min_samples {
                queue.extend(expansion);
            }
        }
    }

    tracing::debug!(
        "DBSCAN: {} particles, {} clusters (eps={}, min_samples={})",
        points.len(),
        num_clusters,
        eps,
        min_samples
    );

    ClusterAssignment {
        labels,
        num_clusters,
    }
}

/// Deterministic color for cluster `index` of `total`: hues evenly spaced
/// around the color wheel at full saturation and value.
pub fn cluster_color(index: usize, total: usize) -> Rgb<u8> {
    let hue = if total == 0 {
        0.0
    } else {
        (index % total) as f32 / total as f32
    };
    hsv_to_rgb(hue, 1.0, 1.0)
}

/// HSV (each in [0, 1]) to 8-bit RGB.
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h * 6.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb([
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ])
}
