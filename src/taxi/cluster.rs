//! Density-based clustering (DBSCAN) of event locations.
//!
//! Distances are Euclidean in raw decimal degrees, so `epsilon` is a small
//! angle (0.0016° is roughly 150 m at Xi'an's latitude), not kilometres.

use serde::Serialize;

use crate::geo::{GeoPoint, centroid};

/// DBSCAN parameters plus the minimum input size worth clustering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    pub epsilon_deg: f64,
    /// Points (including the point itself) required in a core neighbourhood.
    pub min_samples: usize,
    /// Inputs smaller than this are not clustered at all.
    pub min_points: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            epsilon_deg: 0.0016,
            min_samples: 5,
            min_points: 10,
        }
    }
}

/// Opaque cluster handle; only meaningful within one [`Clustering`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLabel {
    Member(ClusterId),
    Noise,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub centroid: GeoPoint,
    pub size: usize,
}

/// Result of clustering one point set.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// One label per input point, in input order.
    pub labels: Vec<PointLabel>,
    /// Clusters in discovery order.
    pub clusters: Vec<Cluster>,
}

impl Clustering {
    fn unclustered(n: usize) -> Self {
        Self {
            labels: vec![PointLabel::Noise; n],
            clusters: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn noise(&self) -> usize {
        self.labels
            .iter()
            .filter(|l| matches!(l, PointLabel::Noise))
            .count()
    }
}

/// Labels every point as a cluster member or noise.
///
/// A point is core when at least `min_samples` points (itself included) lie
/// within `epsilon` of it. Clusters grow from core points in input order;
/// a border point reachable from several clusters joins the first one.
pub fn dbscan(points: &[GeoPoint], epsilon: f64, min_samples: usize) -> Vec<PointLabel> {
    let neighbours: Vec<Vec<usize>> = points
        .iter()
        .map(|p| {
            points
                .iter()
                .enumerate()
                .filter(|(_, q)| (p.lon - q.lon).hypot(p.lat - q.lat) <= epsilon)
                .map(|(j, _)| j)
                .collect()
        })
        .collect();
    let is_core: Vec<bool> = neighbours.iter().map(|n| n.len() >= min_samples).collect();

    let mut labels = vec![PointLabel::Noise; points.len()];
    let mut next_id = 0;

    for seed in 0..points.len() {
        if !is_core[seed] || labels[seed] != PointLabel::Noise {
            continue;
        }

        let id = ClusterId(next_id);
        next_id += 1;
        labels[seed] = PointLabel::Member(id);

        let mut frontier = vec![seed];
        while let Some(p) = frontier.pop() {
            for &q in &neighbours[p] {
                if labels[q] != PointLabel::Noise {
                    continue;
                }
                labels[q] = PointLabel::Member(id);
                if is_core[q] {
                    frontier.push(q);
                }
            }
        }
    }

    labels
}

/// Clusters `points` and computes each cluster's centroid and size.
///
/// Returns no clusters when there are fewer than `params.min_points` points.
pub fn cluster_points(points: &[GeoPoint], params: &ClusterParams) -> Clustering {
    if points.len() < params.min_points {
        return Clustering::unclustered(points.len());
    }

    let labels = dbscan(points, params.epsilon_deg, params.min_samples);

    let mut members: Vec<Vec<GeoPoint>> = Vec::new();
    for (point, label) in points.iter().zip(&labels) {
        if let PointLabel::Member(ClusterId(id)) = *label {
            if members.len() <= id {
                members.resize_with(id + 1, Vec::new);
            }
            members[id].push(*point);
        }
    }

    let clusters = members
        .iter()
        .filter_map(|m| {
            centroid(m).map(|c| Cluster {
                centroid: c,
                size: m.len(),
            })
        })
        .collect();

    Clustering { labels, clusters }
}
