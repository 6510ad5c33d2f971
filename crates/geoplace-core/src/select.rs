//! The greedy redundant-coverage selector.
//!
//! Each round scores every admissible candidate by population-weighted
//! marginal gain per dollar and appends the best one to the selection,
//! until a coverage target is met, the site budget runs out, or no candidate
//! improves anything (exhaustion). Exhaustion is a reported outcome, not an
//! error.

use log::{debug, info};
use ordered_float::NotNan;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::coverage::CoverageMatrix;
use crate::spec::ValidSpec;
use crate::types::{CandidateSite, DemandPoint, PointId, SiteId};
use crate::units::{Population, UsdPerHour};

/// Floor applied to prices before division, so free sites score high instead
/// of dividing by zero.
pub const PRICE_FLOOR: f64 = 1e-4;

/// A read-only snapshot of one demand point's current coverage.
#[derive(Debug, Clone, Copy)]
pub struct PointCoverage<'a> {
    /// Number of selected sites in range, counting repeat picks.
    pub count: u32,
    /// Distinct vendor identities among selected sites in range.
    pub vendors: &'a FxHashSet<String>,
}

/// The pluggable redundancy/diversity policy driving the selector.
///
/// Implementations must be monotone: once `is_covered` holds for a point it
/// must keep holding as coverage grows, which is what makes the selector's
/// covered-population metric non-decreasing.
pub trait Policy {
    /// Whether a demand point with coverage `cov` counts as served.
    fn is_covered(&self, cov: PointCoverage<'_>) -> bool;

    /// The marginal value of covering `point` (currently at `cov`) with
    /// `site` once more. Must be zero for points already covered. Candidates
    /// whose summed gain is NaN are skipped by the selector.
    fn gain(&self, site: &CandidateSite, point: &DemandPoint, cov: PointCoverage<'_>) -> f64;

    /// Restrict the candidate pool for the next pick given what has been
    /// selected so far. The default admits everything. This is a preference,
    /// not a hard constraint: when it admits no unselected candidate, the
    /// selector falls back to the full unselected pool.
    fn admits(&self, _site: &CandidateSite, _selected: &[&CandidateSite]) -> bool {
        true
    }
}

impl<P: Policy> Policy for &P {
    fn is_covered(&self, cov: PointCoverage<'_>) -> bool {
        (*self).is_covered(cov)
    }

    fn gain(&self, site: &CandidateSite, point: &DemandPoint, cov: PointCoverage<'_>) -> f64 {
        (*self).gain(site, point, cov)
    }

    fn admits(&self, site: &CandidateSite, selected: &[&CandidateSite]) -> bool {
        (*self).admits(site, selected)
    }
}

/// Plain k-redundancy: a point is served once at least `k` selected sites are
/// in range. Marginal gain rewards points closer to crossing the threshold,
/// weighted by population.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct KRedundancy {
    k: u32,
}

impl KRedundancy {
    /// The redundancy target `k`.
    pub fn k(&self) -> u32 {
        self.k
    }
}

impl Policy for KRedundancy {
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
}

/// Per-point coverage counters and vendor sets, updated incrementally as
/// sites are selected. This is the bookkeeping that keeps the hot loop from
/// recomputing coverage from scratch every round.
#[derive(Debug, Clone)]
pub struct CoverageState {
    counts: Vec<u32>,
    vendors: Vec<FxHashSet<String>>,
}

impl CoverageState {
    pub(crate) fn new(nr_points: usize) -> Self {
        Self {
            counts: vec![0; nr_points],
            vendors: vec![FxHashSet::default(); nr_points],
        }
    }

    pub(crate) fn apply(&mut self, site_id: SiteId, site: &CandidateSite, matrix: &CoverageMatrix) {
        for point in matrix.points_in_range(site_id) {
            self.counts[point.inner()] += 1;
            if let Some(vendor) = site.vendor() {
                self.vendors[point.inner()].insert(vendor.to_owned());
            }
        }
    }

    /// Coverage snapshot for one demand point.
    pub fn point(&self, point: PointId) -> PointCoverage<'_> {
        PointCoverage {
            count: self.counts[point.inner()],
            vendors: &self.vendors[point.inner()],
        }
    }

    /// How many selected sites are in range of `point`, counting repeats.
    pub fn count(&self, point: PointId) -> u32 {
        self.counts[point.inner()]
    }
}

/// An ordered sequence of chosen sites. Repeat picks are permitted and stand
/// for added redundancy capacity at the same site.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Selection {
    picks: Vec<SiteId>,
}

impl Selection {
    /// A selection with the given picks, in order. The selector builds its
    /// own; this is for replaying a stored configuration through the
    /// allocator.
    pub fn from_picks(picks: Vec<SiteId>) -> Self {
        Self { picks }
    }

    fn push(&mut self, site: SiteId) {
        self.picks.push(site);
    }

    delegate::delegate! {
        to self.picks {
            /// Number of picks, counting repeats.
            #[call(len)]
            pub fn len(&self) -> usize;

            /// Whether nothing has been selected.
            #[call(is_empty)]
            pub fn is_empty(&self) -> bool;

            /// Whether `site` has been picked at least once.
            pub fn contains(&self, site: &SiteId) -> bool;

            /// The picks in selection order.
            #[call(iter)]
            pub fn iter(&self) -> impl Iterator<Item = &SiteId>;
        }
    }
}

/// One round's snapshot of the running metrics.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RoundMetrics {
    /// The site picked this round.
    pub site: SiteId,
    /// Cumulative population counted as served.
    pub covered: Population,
    /// `covered` as a fraction of total population.
    pub fraction: f64,
    /// Cumulative hourly price of the selection.
    pub cumulative_price: UsdPerHour,
}

/// Per-round metrics for a whole run. Covered population and cumulative price
/// are monotonically non-decreasing across rounds.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunMetrics {
    rounds: Vec<RoundMetrics>,
    total_population: Population,
}

impl RunMetrics {
    fn new(total_population: Population) -> Self {
        Self {
            rounds: Vec::new(),
            total_population,
        }
    }

    fn push(&mut self, round: RoundMetrics) {
        self.rounds.push(round);
    }

    /// The per-round snapshots, in selection order.
    pub fn rounds(&self) -> &[RoundMetrics] {
        &self.rounds
    }

    /// Population counted as served after the final round.
    pub fn covered(&self) -> Population {
        self.rounds.last().map(|r| r.covered).unwrap_or(Population::ZERO)
    }

    /// Best-achieved covered fraction (zero before any pick).
    pub fn covered_fraction(&self) -> f64 {
        self.rounds.last().map(|r| r.fraction).unwrap_or(0.0)
    }

    /// Total hourly price of the selection.
    pub fn total_price(&self) -> UsdPerHour {
        self.rounds
            .last()
            .map(|r| r.cumulative_price)
            .unwrap_or(UsdPerHour::ZERO)
    }

    /// Total price per 30-day month, the figure comparison reports quote.
    pub fn monthly_price(&self) -> f64 {
        self.total_price().per_month()
    }

    /// Total population of the demand set.
    pub fn total_population(&self) -> Population {
        self.total_population
    }
}

/// Stopping rule and knobs for one selector run.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct SelectOpts {
    /// Stop once this covered-population fraction is reached.
    #[builder(default, setter(strip_option))]
    pub target_fraction: Option<f64>,
    /// Hard bound on the number of picks.
    #[builder(default = 100)]
    pub max_sites: usize,
    /// When no unselected site has positive gain but a coverage target is
    /// still unmet, fall back to re-picking the globally cheapest site.
    #[builder(default = false)]
    pub allow_repeats: bool,
}

impl Default for SelectOpts {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Run the greedy selector over the given candidate pool.
///
/// `candidates` fixes the enumeration order, which is also the tie-breaking
/// order; passing the same pool twice yields the same selection. Candidate
/// scoring is parallel, but the argmax is taken sequentially in pool order so
/// ties stay deterministic.
pub fn select<P>(
    valid: &ValidSpec,
    matrix: &CoverageMatrix,
    candidates: &[SiteId],
    policy: &P,
    opts: &SelectOpts,
) -> (Selection, RunMetrics, CoverageState)
where
    P: Policy + Sync,
{
    let demand = valid.demand();
    let sites = valid.sites();
    let total_population = valid.total_population();
    let mut state = CoverageState::new(demand.len());
    let mut selection = Selection::default();
    let mut metrics = RunMetrics::new(total_population);
    let mut cumulative_price = UsdPerHour::ZERO;

    while selection.len() < opts.max_sites {
        let selected_sites = selection
            .iter()
            .map(|id| &sites[id.inner()])
            .collect::<Vec<_>>();
        let unselected = candidates
            .iter()
            .copied()
            .filter(|id| !selection.contains(id))
            .collect::<Vec<_>>();
        let mut pool = unselected
            .iter()
            .copied()
            .filter(|id| policy.admits(&sites[id.inner()], &selected_sites))
            .collect::<Vec<_>>();
        if pool.is_empty() {
            // An admissibility preference can run out of unselected sites on
            // its side while positive gain remains on the other. Yield to the
            // rest of the pool instead of stopping short of the floor.
            pool = unselected;
        }
        let scored = pool
            .par_iter()
            .map(|&id| {
                let site = &sites[id.inner()];
                let gain = demand
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| matrix.in_range(PointId::new(i), id))
                    .map(|(i, point)| policy.gain(site, point, state.point(PointId::new(i))))
                    .sum::<f64>();
                let price = site.price.into_f64().max(PRICE_FLOOR);
                // NaN-gaining candidates carry no score and are never picked.
                let score = NotNan::new(gain / price).ok();
                (id, gain, score)
            })
            .collect::<Vec<_>>();
        // First-encountered wins ties: `scored` preserves pool order, and a
        // later candidate replaces the best only on a strictly higher score.
        let mut best: Option<(SiteId, NotNan<f64>)> = None;
        for &(id, gain, score) in &scored {
            if gain <= 0.0 {
                continue;
            }
            let score = match score {
                Some(score) => score,
                None => continue,
            };
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((id, score));
            }
        }
        let best = best.map(|(id, _)| id);

        let pick = match best {
            Some(id) => id,
            None => match repeat_fallback(&metrics, candidates, sites, opts) {
                Some(id) => {
                    debug!("no positive gain left; repeating cheapest site {id}");
                    id
                }
                // Exhaustion: report the best-achieved fraction.
                None => break,
            },
        };

        let site = &sites[pick.inner()];
        state.apply(pick, site, matrix);
        selection.push(pick);
        cumulative_price += site.price;
        let covered = covered_population(demand, policy, &state);
        let fraction = if total_population == Population::ZERO {
            0.0
        } else {
            covered.into_f64() / total_population.into_f64()
        };
        metrics.push(RoundMetrics {
            site: pick,
            covered,
            fraction,
            cumulative_price,
        });
        debug!(
            "round {}: picked {} ({}), covered {:.2}%",
            selection.len(),
            site.name,
            site.price,
            fraction * 100.0
        );

        if let Some(target) = opts.target_fraction {
            if fraction >= target {
                info!(
                    "coverage target {:.1}% reached with {} sites",
                    target * 100.0,
                    selection.len()
                );
                break;
            }
        }
    }
    (selection, metrics, state)
}

// The repeat-pick fallback only applies while an explicit coverage target is
// unmet; without a target, running out of positive gains is plain exhaustion.
fn repeat_fallback(
    metrics: &RunMetrics,
    candidates: &[SiteId],
    sites: &[CandidateSite],
    opts: &SelectOpts,
) -> Option<SiteId> {
    if !opts.allow_repeats {
        return None;
    }
    let target = opts.target_fraction?;
    if metrics.covered_fraction() >= target {
        return None;
    }
    candidates.iter().copied().min_by_key(|id| {
        let price = sites[id.inner()].price.into_f64();
        // CORRECTNESS: prices are validated finite.
        (NotNan::new(price).expect("site price is NaN"), id.inner())
    })
}

pub(crate) fn covered_population<P: Policy>(
    demand: &[DemandPoint],
    policy: &P,
    state: &CoverageState,
) -> Population {
    demand
        .iter()
        .enumerate()
        .filter(|&(i, _)| policy.is_covered(state.point(PointId::new(i))))
        .map(|(_, point)| point.population)
        .sum()
}

#[cfg(test)]
mod tests {
    use crate::testing;
    use crate::units::Population;

    use super::*;

    fn run<P: Policy + Sync>(
        spec: crate::spec::Spec,
        policy: &P,
        opts: &SelectOpts,
    ) -> (Selection, RunMetrics) {
        let valid = spec.validate().unwrap();
        let matrix =
            crate::coverage::CoverageMatrix::build(valid.demand(), valid.sites(), testing::RADIUS);
        let candidates = valid.site_ids().collect::<Vec<_>>();
        let (selection, metrics, _) = select(&valid, &matrix, &candidates, policy, opts);
        (selection, metrics)
    }

    #[test]
    fn two_redundant_sites_cover_everything() {
        // Three symmetric sites at equal prices, k = 2: exactly two picks
        // reach 100% (160/160).
        let opts = SelectOpts::builder().target_fraction(1.0).build();
        let (selection, metrics) = run(testing::triangle_spec(), &KRedundancy::new(2), &opts);
        assert_eq!(selection.len(), 2);
        assert_eq!(metrics.covered(), Population::new(160));
        assert_eq!(metrics.covered_fraction(), 1.0);
    }

    #[test]
    fn redundancy_floor_is_hard() {
        // k = 3 with only two in-range sites anywhere: nothing ever counts.
        let opts = SelectOpts::builder().target_fraction(1.0).max_sites(10).build();
        let (selection, metrics) = run(testing::coastal_spec(), &KRedundancy::new(3), &opts);
        assert!(selection.len() <= 10);
        assert_eq!(metrics.covered(), Population::ZERO);
    }

    #[test]
    fn no_candidates_terminates_immediately() {
        let mut spec = testing::triangle_spec();
        spec.sites.clear();
        let opts = SelectOpts::builder().target_fraction(1.0).build();
        let (selection, metrics) = run(spec, &KRedundancy::new(1), &opts);
        assert!(selection.is_empty());
        assert_eq!(metrics.covered_fraction(), 0.0);
    }

    #[test]
    fn coverage_is_monotone_across_rounds() {
        let opts = SelectOpts::builder().max_sites(6).build();
        let (_, metrics) = run(testing::coastal_spec(), &KRedundancy::new(2), &opts);
        let rounds = metrics.rounds();
        assert!(!rounds.is_empty());
        for pair in rounds.windows(2) {
            assert!(pair[1].covered >= pair[0].covered);
            assert!(pair[1].cumulative_price >= pair[0].cumulative_price);
        }
    }

    #[test]
    fn smaller_budget_is_a_prefix_of_larger() {
        let small = SelectOpts::builder().max_sites(2).build();
        let large = SelectOpts::builder().max_sites(4).build();
        let policy = KRedundancy::new(2);
        let (sel_small, _) = run(testing::coastal_spec(), &policy, &small);
        let (sel_large, _) = run(testing::coastal_spec(), &policy, &large);
        let small_picks = sel_small.iter().collect::<Vec<_>>();
        let large_picks = sel_large.iter().collect::<Vec<_>>();
        assert_eq!(&large_picks[..small_picks.len()], &small_picks[..]);
    }

    #[test]
    fn cheaper_site_wins_equal_gain() {
        let mut spec = testing::triangle_spec();
        spec.sites[1].price = crate::units::UsdPerHour::new(0.5);
        let opts = SelectOpts::builder().max_sites(1).build();
        let (selection, _) = run(spec, &KRedundancy::new(1), &opts);
        assert_eq!(selection.iter().next(), Some(&crate::types::SiteId::new(1)));
    }

    #[test]
    fn zero_price_site_scores_without_crashing() {
        let mut spec = testing::triangle_spec();
        spec.sites[0].price = crate::units::UsdPerHour::ZERO;
        let opts = SelectOpts::builder().max_sites(1).build();
        let (selection, _) = run(spec, &KRedundancy::new(1), &opts);
        // The free site has the best gain-per-dollar under the epsilon floor.
        assert_eq!(selection.iter().next(), Some(&crate::types::SiteId::new(0)));
    }

    #[test]
    fn repeat_fallback_reaches_redundancy_via_duplicates() {
        // A single site and k = 2: only repeat picks can satisfy the floor.
        let spec = testing::lone_site_spec();
        let opts = SelectOpts::builder()
            .target_fraction(1.0)
            .allow_repeats(true)
            .max_sites(5)
            .build();
        let (selection, metrics) = run(spec, &KRedundancy::new(2), &opts);
        assert_eq!(selection.len(), 2);
        assert_eq!(metrics.covered_fraction(), 1.0);
    }

    // k-redundancy that prefers one named site for every pick.
    struct PreferOne {
        name: &'static str,
        base: KRedundancy,
    }

    impl Policy for PreferOne {
        fn is_covered(&self, cov: PointCoverage<'_>) -> bool {
            self.base.is_covered(cov)
        }

        fn gain(&self, site: &CandidateSite, point: &DemandPoint, cov: PointCoverage<'_>) -> f64 {
            self.base.gain(site, point, cov)
        }

        fn admits(&self, site: &CandidateSite, _selected: &[&CandidateSite]) -> bool {
            site.name == self.name
        }
    }

    #[test]
    fn emptied_preference_pool_yields_to_remaining_candidates() {
        // Once the preferred site is taken, the preference admits nothing;
        // the other sites still carry positive gain and must stay reachable.
        let policy = PreferOne {
            name: "newark",
            base: KRedundancy::new(2),
        };
        let opts = SelectOpts::builder().target_fraction(1.0).build();
        let (selection, metrics) = run(testing::triangle_spec(), &policy, &opts);
        assert_eq!(selection.len(), 2);
        assert_eq!(metrics.covered_fraction(), 1.0);
    }

    // Returns NaN for one named site and plain 1-redundancy gain elsewhere.
    struct NanAt(&'static str);

    impl Policy for NanAt {
        fn is_covered(&self, cov: PointCoverage<'_>) -> bool {
            cov.count >= 1
        }

        fn gain(&self, site: &CandidateSite, point: &DemandPoint, cov: PointCoverage<'_>) -> f64 {
            if site.name == self.0 {
                f64::NAN
            } else if cov.count < 1 {
                point.population.into_f64()
            } else {
                0.0
            }
        }
    }

    #[test]
    fn nan_scored_candidate_is_skipped() {
        let opts = SelectOpts::builder().max_sites(1).build();
        let (selection, metrics) = run(testing::triangle_spec(), &NanAt("newark"), &opts);
        assert_eq!(selection.iter().next(), Some(&crate::types::SiteId::new(1)));
        assert_eq!(metrics.covered_fraction(), 1.0);
    }

    #[test]
    fn without_repeats_single_site_exhausts_below_k() {
        let spec = testing::lone_site_spec();
        let opts = SelectOpts::builder().target_fraction(1.0).build();
        let (selection, metrics) = run(spec, &KRedundancy::new(2), &opts);
        assert_eq!(selection.len(), 1);
        assert_eq!(metrics.covered(), Population::ZERO);
    }
}
