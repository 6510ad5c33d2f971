//! A multi-vendor diversity policy: redundancy counts only alongside a
//! minimum number of distinct vendors.

use geoplace_core::select::{Policy, PointCoverage};
use geoplace_core::types::{CandidateSite, DemandPoint};

/// k-redundancy with a vendor-diversity gate: a point is served only once at
/// least `k` selected sites are in range AND those sites span at least
/// `min_vendors` distinct vendors. Both gates must hold; neither substitutes
/// for the other.
///
/// Scoring puts a large bonus on candidates whose vendor is not yet
/// represented at a point, so diversification outranks raw count growth.
/// Sites with no vendor identity never enter vendor sets and never earn the
/// bonus.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct VendorDiversity {
    k: u32,
    min_vendors: usize,
    /// Population multiplier applied when a candidate introduces a new
    /// vendor to a point.
    #[new(value = "50.0")]
    bonus: f64,
}

impl Policy for VendorDiversity {
    fn is_covered(&self, cov: PointCoverage<'_>) -> bool {
        cov.count >= self.k && cov.vendors.len() >= self.min_vendors
    }

    fn gain(&self, site: &CandidateSite, point: &DemandPoint, cov: PointCoverage<'_>) -> f64 {
        if self.is_covered(cov) {
            return 0.0;
        }
        let pop = point.population.into_f64();
        let mut gain = pop;
        if let Some(vendor) = site.vendor() {
            if !cov.vendors.contains(vendor) {
                gain += pop * self.bonus;
            }
        }
        gain
    }
}
