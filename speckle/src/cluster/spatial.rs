//! 2D k-d tree over particle centroids for neighborhood queries.

/// A 2D k-d tree built once over a fixed point set.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// Split dimension (0 = x, 1 = y)
    split_dim: usize,
}

#[inline]
fn coord(point: (f64, f64), dim: usize) -> f64 {
    if dim == 0 { point.0 } else { point.1 }
}

impl KdTree {
    /// Build a balanced tree by median splits. `None` for an empty point set.
    pub fn build(points: &[(f64, f64)]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let points = points.to_vec();
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());

        Self::build_recursive(&points, &mut indices, 0, &mut nodes);

        Some(Self { nodes, points })
    }

    fn build_recursive(
        points: &[(f64, f64)],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let split_dim = depth % 2;
        indices.sort_by(|&a, &b| coord(points[a], split_dim).total_cmp(&coord(points[b], split_dim)));

        let median = indices.len() / 2;
        let point_idx = indices[median];

        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx,
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..]; // Skip the median

        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);

        nodes[node_idx].left = left;
        nodes[node_idx].right = right;

        Some(node_idx)
    }

    /// Indices of all points within `radius` of `query` (boundary inclusive),
    /// in ascending index order.
    pub fn radius_search(&self, query: (f64, f64), radius: f64) -> Vec<usize> {
        let mut results = Vec::new();
        if self.nodes.is_empty() {
            return results;
        }

        self.radius_search_recursive(0, query, radius * radius, &mut results);
        results.sort_unstable();
        results
    }

    fn radius_search_recursive(
        &self,
        node_idx: usize,
        query: (f64, f64),
        radius_sq: f64,
        results: &mut Vec<usize>,
    ) {
        let node = &self.nodes[node_idx];
        let point = self.points[node.point_idx];

        if distance_squared(query, point) <= radius_sq {
            results.push(node.point_idx);
        }

        let diff = coord(query, node.split_dim) - coord(point, node.split_dim);
        let diff_sq = diff * diff;

        if let Some(left_idx) = node.left
            && (diff <= 0.0 || diff_sq <= radius_sq)
        {
            self.radius_search_recursive(left_idx, query, radius_sq, results);
        }

        if let Some(right_idx) = node.right
            && (diff >= 0.0 || diff_sq <= radius_sq)
        {
            self.radius_search_recursive(right_idx, query, radius_sq, results);
        }
    }
}

#[inline]
fn distance_squared(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}
