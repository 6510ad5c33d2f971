use clap::Parser;
use geoplace::{
    core::{
        allocate::{allocate, ServiceDemand},
        geo::Location,
        run::{optimize, Outcome},
        select::{KRedundancy, Policy, SelectOpts},
        spec::Spec,
        types::{CandidateSite, DemandPoint},
        units::{Kilometers, Population, ServiceUnits, UsdPerHour},
    },
    policy::{RiskSplit, VendorDiversity},
};
use rand::prelude::*;
use rand_distr::LogNormal;

// Budget vendors carry one throughput unit per node; premium nodes carry
// twenty, at roughly the price ratio the public price tables show.
const BUDGET_PRICE: f64 = 0.25;
const BUDGET_CAPACITY: f64 = 1.0;
const PREMIUM_PRICE: f64 = 12.0;
const PREMIUM_CAPACITY: f64 = 20.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of demand points
    #[arg(short = 'p', long, default_value_t = 40)]
    nr_points: usize,

    /// Number of candidate sites
    #[arg(short = 's', long, default_value_t = 30)]
    nr_sites: usize,

    /// Latency radius in kilometers
    #[arg(short, long, default_value_t = 1000.0)]
    radius_km: f64,

    /// Redundancy target
    #[arg(short, long, default_value_t = 3)]
    k: u32,

    /// Covered-population target fraction
    #[arg(short, long, default_value_t = 0.9)]
    target: f64,

    /// Total user base for capacity allocation
    #[arg(short, long, default_value_t = 10_000)]
    users: u64,

    /// Hours of service per user per day
    #[arg(long, default_value_t = 1.0)]
    usage: f64,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(
        0.0 < args.target && args.target <= 1.0,
        "target must be in (0.0, 1.0]"
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let demand = gen_demand(args.nr_points, &mut rng);
    let sites = gen_sites(args.nr_sites, &mut rng);
    let radius = Kilometers::new(args.radius_km);
    let opts = SelectOpts::builder()
        .target_fraction(args.target)
        .build();
    let service = ServiceDemand::new(args.users, args.usage);

    let total_pop: Population = demand.iter().map(|p| p.population).sum();
    println!(
        "Scenario: {} points ({} people), {} sites, {:.0}km radius, k={}, target {:.0}%",
        args.nr_points,
        total_pop,
        args.nr_sites,
        args.radius_km,
        args.k,
        args.target * 100.0
    );
    println!(
        "{:<22} | {:>3} | {:>10} | {:>12} | {:>12} | {}",
        "Strategy", "N", "Coverage", "Monthly", "Served", "Target"
    );
    println!("{}", "-".repeat(80));

    report(
        "k-redundancy",
        run(&demand, &sites, radius, KRedundancy::new(args.k), &opts)?,
        &service,
    );
    report(
        "risk-split 50/50",
        run(&demand, &sites, radius, RiskSplit::new(args.k, 0.35), &opts)?,
        &service,
    );
    report(
        "multi-vendor (v=2)",
        run(&demand, &sites, radius, VendorDiversity::new(args.k, 2), &opts)?,
        &service,
    );
    Ok(())
}

fn run<P: Policy + Sync>(
    demand: &[DemandPoint],
    sites: &[CandidateSite],
    radius: Kilometers,
    policy: P,
    opts: &SelectOpts,
) -> anyhow::Result<Outcome> {
    let spec = Spec::builder()
        .demand(demand.to_vec())
        .sites(sites.to_vec())
        .build();
    Ok(optimize(spec, radius, policy, opts.clone())?)
}

fn report(label: &str, outcome: Outcome, service: &ServiceDemand) {
    let alloc = allocate(
        &outcome.selection,
        outcome.sites(),
        outcome.covered_fraction(),
        service,
    );
    println!(
        "{:<22} | {:>3} | {:>9.2}% | ${:>11.2} | {:>12} | {}",
        label,
        outcome.selection.len(),
        outcome.covered_fraction() * 100.0,
        outcome.metrics.monthly_price(),
        alloc.served,
        if outcome.target_met { "met" } else { "missed" }
    );
    for (vendor, count) in outcome.vendor_tally() {
        println!("{:<22} |     - {vendor}: {count} nodes", "");
    }
}

/// Demand points scattered over the continental US with log-normally
/// distributed populations.
fn gen_demand(nr_points: usize, rng: &mut StdRng) -> Vec<DemandPoint> {
    let populations = LogNormal::new(11.0, 1.0).expect("valid log-normal parameters");
    (0..nr_points)
        .map(|i| {
            DemandPoint::new(
                format!("city-{i}"),
                Population::new(populations.sample(rng) as u64),
                random_location(rng),
            )
        })
        .collect()
}

/// A half-budget, half-premium site catalog at random locations.
fn gen_sites(nr_sites: usize, rng: &mut StdRng) -> Vec<CandidateSite> {
    (0..nr_sites)
        .map(|i| {
            let budget = i % 2 == 0;
            let (vendor, price, capacity, risk) = if budget {
                ("budgetbox", BUDGET_PRICE, BUDGET_CAPACITY, 0.6)
            } else {
                ("primecloud", PREMIUM_PRICE, PREMIUM_CAPACITY, 0.15)
            };
            CandidateSite::builder()
                .name(format!("site-{i}"))
                .location(random_location(rng))
                .price(UsdPerHour::new(price * rng.gen_range(0.8..1.2)))
                .vendor(vendor)
                .risk(risk)
                .capacity(ServiceUnits::new(capacity))
                .build()
        })
        .collect()
}

fn random_location(rng: &mut StdRng) -> Location {
    Location::new(rng.gen_range(30.0..48.0), rng.gen_range(-122.0..-71.0))
}
