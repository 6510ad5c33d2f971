//! The top-level optimizer entry points: validate a spec, build the coverage
//! matrix once, and hand it to the greedy selector.

use std::collections::BTreeMap;

use crate::cluster;
use crate::coverage::CoverageMatrix;
use crate::select::{select, CoverageState, Policy, RunMetrics, SelectOpts, Selection};
use crate::spec::{Spec, SpecError, ValidSpec};
use crate::types::CandidateSite;
use crate::units::{Kilometers, UsdPerHour};

/// Run the redundant-coverage optimizer over a full catalog.
///
/// An unreachable coverage target is not an error: the selector terminates on
/// exhaustion and the outcome reports the best-achieved fraction with
/// `target_met` unset.
pub fn optimize<P>(
    spec: Spec,
    radius: Kilometers,
    policy: P,
    opts: SelectOpts,
) -> Result<Outcome, Error>
where
    P: Policy + Sync,
{
    let valid = spec.validate()?;
    let matrix = CoverageMatrix::build(valid.demand(), valid.sites(), radius);
    let candidates = valid.site_ids().collect::<Vec<_>>();
    let (selection, metrics, state) = select(&valid, &matrix, &candidates, &policy, &opts);
    let target_met = opts
        .target_fraction
        .map_or(false, |target| metrics.covered_fraction() >= target);
    Ok(Outcome {
        valid,
        selection,
        metrics,
        state,
        target_met,
    })
}

/// Find the sync cluster whose best `target_size`-site selection covers the
/// most population, and return its member sites.
pub fn find_best_cluster<P>(
    spec: Spec,
    radius: Kilometers,
    sync_radius: Kilometers,
    target_size: usize,
    policy: P,
) -> Result<Vec<CandidateSite>, Error>
where
    P: Policy + Sync,
{
    let valid = spec.validate()?;
    let matrix = CoverageMatrix::build(valid.demand(), valid.sites(), radius);
    let best = cluster::find_best_cluster(&valid, &matrix, sync_radius, target_size, &policy);
    Ok(best
        .map(|cluster| {
            cluster
                .members()
                .iter()
                .map(|id| valid.sites()[id.inner()].clone())
                .collect()
        })
        .unwrap_or_default())
}

/// The result of one optimizer run.
#[derive(Debug)]
pub struct Outcome {
    valid: ValidSpec,
    /// The chosen sites, in selection order.
    pub selection: Selection,
    /// Per-round running metrics.
    pub metrics: RunMetrics,
    /// Final per-point coverage counters and vendor sets.
    pub state: CoverageState,
    /// Whether the configured coverage target was reached.
    pub target_met: bool,
}

impl Outcome {
    /// Best-achieved covered-population fraction.
    pub fn covered_fraction(&self) -> f64 {
        self.metrics.covered_fraction()
    }

    /// Total hourly price of the selection.
    pub fn total_price(&self) -> UsdPerHour {
        self.metrics.total_price()
    }

    /// The validated site catalog the selection indexes into.
    pub fn sites(&self) -> &[CandidateSite] {
        self.valid.sites()
    }

    /// Picks per vendor, sorted by vendor name. Sites without a vendor are
    /// tallied under `"(unknown)"`.
    pub fn vendor_tally(&self) -> BTreeMap<String, usize> {
        let mut tally = BTreeMap::new();
        for id in self.selection.iter() {
            let vendor = self.valid.sites()[id.inner()]
                .vendor()
                .unwrap_or("(unknown)")
                .to_owned();
            *tally.entry(vendor).or_insert(0) += 1;
        }
        tally
    }
}

/// Top-level optimizer error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidSpec(#[from] SpecError),
}
