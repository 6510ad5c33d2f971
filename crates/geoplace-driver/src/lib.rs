//! Thin I/O glue around the optimizer core: loads a JSON scenario (demand,
//! site catalog, policy, options), applies the catalog preprocessing the
//! price tables need (per-vendor overheads, cheapest-offer dedup), and runs
//! the optimizer. No file format is part of the core contract; it all lives
//! here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use geoplace_core::select::SelectOpts;
use geoplace_core::types::{CandidateSite, DemandPoint};
use geoplace_core::units::Kilometers;
pub use geoplace_core::Outcome;
use policy_impls::{RiskSplit, VendorDiversity};

pub fn run_from_file(scenario: impl AsRef<Path>) -> Result<Outcome, Error> {
    let path = scenario.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let scenario: Scenario = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents)?,
        _ => return Err(Error::UnknownFileType(path.into())),
    };
    run(scenario)
}

pub fn run(scenario: Scenario) -> Result<Outcome, Error> {
    let sites = prepare_sites(scenario.sites, &scenario.overheads, scenario.dedup_cheapest);
    let spec = geoplace_core::Spec::builder()
        .demand(scenario.demand)
        .sites(sites)
        .build();
    let radius = Kilometers::new(scenario.radius_km);
    let opts = scenario.opts.to_select_opts();
    let outcome = match scenario.policy {
        PolicyKind::KRedundancy { k } => {
            geoplace_core::optimize(spec, radius, geoplace_core::KRedundancy::new(k), opts)?
        }
        PolicyKind::RiskSplit { k, threshold } => {
            geoplace_core::optimize(spec, radius, RiskSplit::new(k, threshold), opts)?
        }
        PolicyKind::VendorDiversity { k, min_vendors } => geoplace_core::optimize(
            spec,
            radius,
            VendorDiversity::new(k, min_vendors),
            opts,
        )?,
    };
    Ok(outcome)
}

/// Apply per-vendor price overheads, then optionally collapse the catalog to
/// the cheapest offer per (vendor, site name). Price tables routinely list
/// many instance types per region; only the cheapest per location matters to
/// the optimizer.
fn prepare_sites(
    sites: Vec<CandidateSite>,
    overheads: &HashMap<String, f64>,
    dedup_cheapest: bool,
) -> Vec<CandidateSite> {
    let mut sites = sites;
    for site in &mut sites {
        if let Some(&factor) = site.vendor().and_then(|v| overheads.get(v)) {
            site.price = site.price.scale_by(factor);
        }
    }
    if !dedup_cheapest {
        return sites;
    }
    let mut cheapest: Vec<CandidateSite> = Vec::new();
    let mut index: HashMap<(Option<String>, String), usize> = HashMap::new();
    for site in sites {
        let key = (site.vendor.clone(), site.name.clone());
        match index.get(&key) {
            Some(&i) if cheapest[i].price <= site.price => {}
            Some(&i) => cheapest[i] = site,
            None => {
                index.insert(key, cheapest.len());
                cheapest.push(site);
            }
        }
    }
    cheapest
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown file type: {0}")]
    UnknownFileType(PathBuf),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("failed to run the optimizer")]
    Core(#[from] geoplace_core::Error),
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Scenario {
    pub demand: Vec<DemandPoint>,
    pub sites: Vec<CandidateSite>,
    pub radius_km: f64,
    pub policy: PolicyKind,
    #[serde(default)]
    pub opts: Opts,
    /// Per-vendor price multipliers applied before optimization.
    #[serde(default)]
    pub overheads: HashMap<String, f64>,
    /// Keep only the cheapest offer per (vendor, site name).
    #[serde(default)]
    pub dedup_cheapest: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub enum PolicyKind {
    KRedundancy { k: u32 },
    RiskSplit { k: u32, threshold: f64 },
    VendorDiversity { k: u32, min_vendors: usize },
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Opts {
    #[serde(default)]
    pub target_fraction: Option<f64>,
    #[serde(default = "default_max_sites")]
    pub max_sites: usize,
    #[serde(default)]
    pub allow_repeats: bool,
}

fn default_max_sites() -> usize {
    100
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            target_fraction: None,
            max_sites: default_max_sites(),
            allow_repeats: false,
        }
    }
}

impl Opts {
    fn to_select_opts(&self) -> SelectOpts {
        SelectOpts {
            target_fraction: self.target_fraction,
            max_sites: self.max_sites,
            allow_repeats: self.allow_repeats,
        }
    }
}
