//! The optimizer's working data: demand points and candidate hosting sites.

use crate::geo::Location;
use crate::units::{Population, ServiceUnits, UsdPerHour};

identifier!(PointId, usize);
identifier!(SiteId, usize);

/// A population center to be served. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct DemandPoint {
    /// Display name, e.g. a city.
    pub name: String,
    /// Population weight.
    pub population: Population,
    /// Coordinates in degrees.
    pub location: Location,
}

/// A candidate hosting site drawn from a supply catalog. Immutable once
/// loaded.
///
/// Vendor identity, risk score, and throughput capacity are optional because
/// not every catalog carries them; policies and the allocator document how
/// they treat the missing cases.
#[derive(
    Debug, Clone, PartialEq, typed_builder::TypedBuilder, serde::Serialize, serde::Deserialize,
)]
pub struct CandidateSite {
    /// Display name, e.g. a region code.
    #[builder(setter(into))]
    pub name: String,
    /// Coordinates in degrees.
    pub location: Location,
    /// Unit price, currency per hour.
    pub price: UsdPerHour,
    /// Vendor identity, if known.
    #[builder(default, setter(strip_option, into))]
    pub vendor: Option<String>,
    /// Vendor-risk score in [0, 1]; higher means less reliable.
    #[builder(default, setter(strip_option))]
    pub risk: Option<f64>,
    /// Throughput units servable per unit time, if known.
    #[builder(default, setter(strip_option))]
    pub capacity: Option<ServiceUnits>,
}

impl CandidateSite {
    /// The site's vendor, if it has one.
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }
}
