//! The capacity-constrained allocator: turns "population geographically
//! reachable" into "users actually served" given finite per-site throughput.
//!
//! Geographic reach and raw throughput are independent bottlenecks; a
//! configuration can be geographically sufficient but throughput-starved, or
//! the other way around. The served count is the closed-form min of the two.

use crate::select::Selection;
use crate::types::CandidateSite;
use crate::units::ServiceUnits;

/// The service load to allocate capacity against.
#[derive(Debug, Clone, Copy, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct ServiceDemand {
    /// Total user base.
    pub total_users: u64,
    /// Hours of service consumed per user per day.
    pub hours_per_user_day: f64,
}

/// The served-vs-unserved split for one selected configuration.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Allocation {
    /// Users within geographic reach of the selection.
    pub geo_users: f64,
    /// Users the selection's total throughput could sustain.
    pub capacity_users: f64,
    /// Users actually served: `floor(min(geo_users, capacity_users))`.
    pub served: u64,
}

/// Allocate `demand` across a selection.
///
/// `geo_fraction` is the covered-population fraction reported by the
/// selector. Sites with no declared capacity contribute zero throughput.
/// Repeat picks contribute their capacity once per pick.
pub fn allocate(
    selection: &Selection,
    sites: &[CandidateSite],
    geo_fraction: f64,
    demand: &ServiceDemand,
) -> Allocation {
    let total_capacity = selection
        .iter()
        .map(|id| sites[id.inner()].capacity.unwrap_or(ServiceUnits::ZERO))
        .sum::<ServiceUnits>();
    let geo_users = geo_fraction * demand.total_users as f64;
    // Daily service-hours available vs. hours demanded per user.
    let capacity_users = if demand.hours_per_user_day > 0.0 {
        total_capacity.into_f64() * 24.0 / demand.hours_per_user_day
    } else {
        f64::INFINITY
    };
    let served = geo_users.min(capacity_users).floor() as u64;
    Allocation {
        geo_users,
        capacity_users,
        served,
    }
}
