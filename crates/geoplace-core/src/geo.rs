//! The geodesic distance model: locations in degrees and great-circle
//! distances via the haversine formula.

use crate::units::Kilometers;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS: Kilometers = Kilometers::new(6371.0);

/// A point on the Earth's surface, in degrees.
///
/// Latitude must be in [-90, 90] and longitude in [-180, 180] for distances
/// to be meaningful; range checks happen at spec validation, not here.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, derive_new::new, serde::Serialize, serde::Deserialize,
)]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Location {
    /// Great-circle distance to `other`.
    ///
    /// Symmetric, non-negative, and zero for coincident locations. Antipodal
    /// degeneracies are not handled specially.
    pub fn distance_to(self, other: Location) -> Kilometers {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let dphi = (other.lat - self.lat).to_radians();
        let dlambda = (other.lon - self.lon).to_radians();
        let a = (dphi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS.scale_by(c)
    }

    /// Whether `other` is within `radius` of `self`.
    pub fn in_range(self, other: Location, radius: Kilometers) -> bool {
        self.distance_to(other) <= radius
    }
}
