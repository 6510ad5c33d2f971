//! The sync-cluster constraint finder: maximal sets of mutually-adjacent
//! sites under an inter-site synchronization-distance bound, used to scope
//! selection to one tightly co-located group.
//!
//! This is a greedy heuristic, not an exact maximum-clique search: it grows
//! one maximal clique per starting site and removes duplicates. Results
//! depend on start order, so callers (and tests) should rely on "a valid
//! maximal clique", never "the unique maximum clique".

use itertools::Itertools;
use log::info;
use petgraph::graph::{NodeIndex, UnGraph};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::coverage::CoverageMatrix;
use crate::select::{select, Policy, SelectOpts};
use crate::spec::ValidSpec;
use crate::types::{CandidateSite, SiteId};
use crate::units::{Kilometers, Population};

/// A set of sites pairwise within the synchronization-distance bound.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SyncCluster {
    // Sorted by site ID so equal clusters compare equal.
    members: Vec<SiteId>,
}

impl SyncCluster {
    /// The member IDs, sorted.
    pub fn members(&self) -> &[SiteId] {
        &self.members
    }

    delegate::delegate! {
        to self.members {
            /// Number of member sites.
            #[call(len)]
            pub fn len(&self) -> usize;

            /// Whether the cluster has no members.
            #[call(is_empty)]
            pub fn is_empty(&self) -> bool;

            /// Whether `site` belongs to the cluster.
            pub fn contains(&self, site: &SiteId) -> bool;
        }
    }
}

/// Enumerate maximal sync clusters by greedy expansion from every site.
///
/// A candidate joins a growing clique only if it is adjacent to every current
/// member. One maximal clique is produced per starting site; duplicates are
/// dropped.
pub fn find_sync_clusters(sites: &[CandidateSite], sync_radius: Kilometers) -> Vec<SyncCluster> {
    let mut graph = UnGraph::<SiteId, Kilometers>::default();
    let nodes = (0..sites.len())
        .map(|i| graph.add_node(SiteId::new(i)))
        .collect::<Vec<_>>();
    for i in 0..sites.len() {
        for j in (i + 1)..sites.len() {
            let d = sites[i].location.distance_to(sites[j].location);
            if d <= sync_radius {
                graph.add_edge(nodes[i], nodes[j], d);
            }
        }
    }

    let mut seen: FxHashSet<Vec<SiteId>> = FxHashSet::default();
    let mut clusters = Vec::new();
    for &start in &nodes {
        let mut members: Vec<NodeIndex> = vec![start];
        for &candidate in &nodes {
            if candidate == start {
                continue;
            }
            if members.iter().all(|&m| graph.contains_edge(m, candidate)) {
                members.push(candidate);
            }
        }
        let ids = members.iter().map(|&n| graph[n]).sorted().collect::<Vec<_>>();
        if seen.insert(ids.clone()) {
            clusters.push(SyncCluster { members: ids });
        }
    }
    clusters
}

/// Find the sync cluster whose best `target_size`-site selection covers the
/// most population.
///
/// Each cluster is evaluated by running the greedy selector restricted to its
/// members. Evaluation is parallel across clusters; ties go to the
/// first-enumerated cluster. Returns `None` for an empty catalog.
pub fn find_best_cluster<P>(
    valid: &ValidSpec,
    matrix: &CoverageMatrix,
    sync_radius: Kilometers,
    target_size: usize,
    policy: &P,
) -> Option<SyncCluster>
where
    P: Policy + Sync,
{
    let clusters = find_sync_clusters(valid.sites(), sync_radius);
    if clusters.is_empty() {
        return None;
    }
    info!(
        "evaluating {} sync clusters at target size {}",
        clusters.len(),
        target_size
    );
    let opts = SelectOpts::builder().max_sites(target_size).build();
    let (s, r) = crossbeam_channel::unbounded();
    // Evaluate all clusters in parallel.
    clusters
        .par_iter()
        .enumerate()
        .for_each_with(s, |s, (i, cluster)| {
            let (_, metrics, _) = select(valid, matrix, cluster.members(), policy, &opts);
            s.send((i, metrics.covered())).unwrap(); // the channel never disconnects
        });
    let mut results: Vec<(usize, Population)> = r.iter().collect();
    results.sort_by_key(|&(i, _)| i);
    let mut best: Option<(usize, Population)> = None;
    for (i, covered) in results {
        if best.map_or(true, |(_, top)| covered > top) {
            best = Some((i, covered));
        }
    }
    best.map(|(i, _)| clusters[i].clone())
}
