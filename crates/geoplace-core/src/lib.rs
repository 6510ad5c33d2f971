#![warn(unreachable_pub, missing_debug_implementations)]

//! The core geoplace library. This crate defines [the routine](run::optimize)
//! that turns a demand distribution and a candidate-site catalog into a
//! redundant coverage [`Selection`] with running metrics, plus the
//! capacity-constrained [allocator](allocate::allocate) and the
//! [sync-cluster finder](cluster::find_best_cluster).

#[macro_use]
mod ident;

pub mod allocate;
pub mod cluster;
pub mod coverage;
pub mod geo;
pub mod run;
pub mod select;
pub mod spec;
pub mod types;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

pub use allocate::{allocate, Allocation, ServiceDemand};
pub use cluster::{find_sync_clusters, SyncCluster};
pub use coverage::CoverageMatrix;
pub use geo::Location;
pub use run::{find_best_cluster, optimize, Error, Outcome};
pub use select::{
    KRedundancy, Policy, PointCoverage, RunMetrics, SelectOpts, Selection,
};
pub use spec::{Spec, SpecError};
pub use types::{CandidateSite, DemandPoint, PointId, SiteId};
pub use units::{Kilometers, Population, ServiceUnits, UsdPerHour};
