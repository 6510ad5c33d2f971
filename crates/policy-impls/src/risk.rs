//! A risk-stratified selection policy that balances picks across vendor-risk
//! tiers.

use geoplace_core::select::{Policy, PointCoverage};
use geoplace_core::types::{CandidateSite, DemandPoint};

/// k-redundancy with candidates partitioned into a low-risk and a high-risk
/// tier by a risk-score threshold. Each round admits only the tier with fewer
/// selections so far (the low-risk tier wins ties), enforcing an
/// approximately even split; scoring within the admitted tier is the plain
/// population-weighted marginal gain.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct RiskSplit {
    k: u32,
    /// Sites with risk at or below this belong to the low-risk tier.
    threshold: f64,
    /// Risk assumed for sites with no risk score.
    #[new(value = "0.5")]
    default_risk: f64,
}

impl RiskSplit {
    fn is_low_risk(&self, site: &CandidateSite) -> bool {
        site.risk.unwrap_or(self.default_risk) <= self.threshold
    }
}

impl Policy for RiskSplit {
    fn is_covered(&self, cov: PointCoverage<'_>) -> bool {
        cov.count >= self.k
    }

    fn gain(&self, _site: &CandidateSite, point: &DemandPoint, cov: PointCoverage<'_>) -> f64 {
        if cov.count < self.k {
            f64::from(cov.count + 1) * point.population.into_f64()
        } else {
            0.0
        }
    }

    fn admits(&self, site: &CandidateSite, selected: &[&CandidateSite]) -> bool {
        let nr_low = selected.iter().filter(|s| self.is_low_risk(s)).count();
        let nr_high = selected.len() - nr_low;
        let want_low = nr_low <= nr_high;
        self.is_low_risk(site) == want_low
    }
}

#[cfg(test)]
mod tests {
    use geoplace_core::coverage::CoverageMatrix;
    use geoplace_core::geo::Location;
    use geoplace_core::select::{select, SelectOpts};
    use geoplace_core::spec::Spec;
    use geoplace_core::types::DemandPoint;
    use geoplace_core::units::{Kilometers, Population, UsdPerHour};

    use super::*;

    const RADIUS: Kilometers = Kilometers::new(1000.0);

    fn site(name: &str, price: f64, risk: Option<f64>) -> CandidateSite {
        let builder = CandidateSite::builder()
            .name(name)
            .location(Location::new(40.0, -75.0))
            .price(UsdPerHour::new(price));
        match risk {
            Some(risk) => builder.risk(risk).build(),
            None => builder.build(),
        }
    }

    fn one_point_spec(sites: Vec<CandidateSite>) -> Spec {
        Spec {
            demand: vec![DemandPoint::new(
                "philadelphia".to_owned(),
                Population::new(100),
                Location::new(39.95, -75.16),
            )],
            sites,
        }
    }

    #[test]
    fn picks_alternate_between_tiers() {
        let spec = one_point_spec(vec![
            site("cheap-a", 0.1, Some(0.6)),
            site("cheap-b", 0.1, Some(0.7)),
            site("solid-a", 2.0, Some(0.1)),
            site("solid-b", 2.0, Some(0.2)),
        ]);
        let valid = spec.validate().unwrap();
        let matrix = CoverageMatrix::build(valid.demand(), valid.sites(), RADIUS);
        let candidates = valid.site_ids().collect::<Vec<_>>();
        let policy = RiskSplit::new(4, 0.35);
        let opts = SelectOpts::builder().target_fraction(1.0).build();
        let (selection, metrics, _) = select(&valid, &matrix, &candidates, &policy, &opts);
        assert_eq!(selection.len(), 4);
        assert_eq!(metrics.covered_fraction(), 1.0);
        let tiers = selection
            .iter()
            .map(|id| policy.is_low_risk(&valid.sites()[id.inner()]))
            .collect::<Vec<_>>();
        // Low-risk tier goes first and the split stays even.
        assert_eq!(tiers, vec![true, false, true, false]);
    }

    #[test]
    fn exhausted_tier_yields_to_the_other() {
        // One low-risk site against three high-risk ones, k = 3. After one
        // pick from each tier the low tier is spent; the remaining high-risk
        // sites still close the redundancy gap.
        let spec = one_point_spec(vec![
            site("solid", 2.0, Some(0.1)),
            site("cheap-a", 0.1, Some(0.6)),
            site("cheap-b", 0.1, Some(0.6)),
            site("cheap-c", 0.1, Some(0.7)),
        ]);
        let valid = spec.validate().unwrap();
        let matrix = CoverageMatrix::build(valid.demand(), valid.sites(), RADIUS);
        let candidates = valid.site_ids().collect::<Vec<_>>();
        let policy = RiskSplit::new(3, 0.35);
        let opts = SelectOpts::builder().target_fraction(1.0).build();
        let (selection, metrics, _) = select(&valid, &matrix, &candidates, &policy, &opts);
        assert_eq!(selection.len(), 3);
        assert_eq!(metrics.covered_fraction(), 1.0);
        let tiers = selection
            .iter()
            .map(|id| policy.is_low_risk(&valid.sites()[id.inner()]))
            .collect::<Vec<_>>();
        assert_eq!(tiers, vec![true, false, false]);
    }

    #[test]
    fn unknown_risk_lands_in_the_high_tier() {
        let policy = RiskSplit::new(1, 0.35);
        assert!(!policy.is_low_risk(&site("mystery", 1.0, None)));
        assert!(policy.is_low_risk(&site("known", 1.0, Some(0.3))));
    }
}
