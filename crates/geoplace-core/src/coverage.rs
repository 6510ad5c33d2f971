//! The coverage matrix: a precomputed boolean "within latency radius"
//! relation between demand points and candidate sites.
//!
//! Building the matrix is the dominant O(D·S) cost of a run, so it is built
//! once per (catalog, radius) pair and never touched again inside the
//! selection loop.

use ndarray::Array2;
use rayon::prelude::*;

use crate::types::{CandidateSite, DemandPoint, PointId, SiteId};
use crate::units::Kilometers;

/// A boolean mapping from (demand point, site) pairs to "in range".
#[derive(Debug, Clone)]
pub struct CoverageMatrix {
    // Rows are demand points, columns are sites.
    mat: Array2<bool>,
    radius: Kilometers,
}

impl CoverageMatrix {
    /// Compute the relation for every (demand, site) pair. Deterministic and
    /// total; empty demand or site lists yield an empty relation.
    pub fn build(demand: &[DemandPoint], sites: &[CandidateSite], radius: Kilometers) -> Self {
        let rows = demand
            .par_iter()
            .map(|point| {
                sites
                    .iter()
                    .map(|site| point.location.in_range(site.location, radius))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let flat = rows.into_iter().flatten().collect::<Vec<_>>();
        // CORRECTNESS: the shape matches the flattened row-major data by
        // construction.
        let mat = Array2::from_shape_vec((demand.len(), sites.len()), flat)
            .expect("coverage matrix shape mismatch");
        Self { mat, radius }
    }

    /// Whether demand point `point` is within the latency radius of `site`.
    pub fn in_range(&self, point: PointId, site: SiteId) -> bool {
        self.mat[[point.inner(), site.inner()]]
    }

    /// IDs of the demand points in range of `site`.
    pub fn points_in_range(&self, site: SiteId) -> impl Iterator<Item = PointId> + '_ {
        self.mat
            .column(site.inner())
            .into_iter()
            .enumerate()
            .filter_map(|(i, &covered)| covered.then(|| PointId::new(i)))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// IDs of the sites in range of demand point `point`.
    pub fn sites_in_range(&self, point: PointId) -> impl Iterator<Item = SiteId> + '_ {
        self.mat
            .row(point.inner())
            .into_iter()
            .enumerate()
            .filter_map(|(j, &covered)| covered.then(|| SiteId::new(j)))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Number of demand points (rows).
    pub fn nr_points(&self) -> usize {
        self.mat.nrows()
    }

    /// Number of candidate sites (columns).
    pub fn nr_sites(&self) -> usize {
        self.mat.ncols()
    }

    /// The latency radius this relation was built with.
    pub fn radius(&self) -> Kilometers {
        self.radius
    }
}
