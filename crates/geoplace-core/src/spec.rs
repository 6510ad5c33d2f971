//! This module defines optimization specifications ([`Spec`]), which consist
//! of demand points and candidate sites. Validation rejects malformed records
//! before any matrix construction; it never silently coerces them.

use crate::types::{CandidateSite, DemandPoint, PointId, SiteId};
use crate::units::Population;

/// An optimization specification.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct Spec {
    /// Demand points.
    pub demand: Vec<DemandPoint>,
    /// Candidate sites.
    pub sites: Vec<CandidateSite>,
}

impl Spec {
    /// Validate a specification, producing a `ValidSpec`.
    ///
    /// Correctness properties:
    ///
    /// - Every coordinate is a real latitude/longitude
    /// - Every price is finite and non-negative
    /// - Every risk score, when present, is in [0, 1]
    ///
    /// Population weights are unsigned by construction.
    pub fn validate(self) -> Result<ValidSpec, SpecError> {
        for point in &self.demand {
            check_location(&point.name, point.location.lat, point.location.lon)?;
        }
        for site in &self.sites {
            check_location(&site.name, site.location.lat, site.location.lon)?;
            let price = site.price.into_f64();
            if !price.is_finite() || price < 0.0 {
                return Err(SpecError::InvalidPrice {
                    site: site.name.clone(),
                    price,
                });
            }
            if let Some(risk) = site.risk {
                if !(0.0..=1.0).contains(&risk) {
                    return Err(SpecError::InvalidRisk {
                        site: site.name.clone(),
                        risk,
                    });
                }
            }
        }
        Ok(ValidSpec {
            demand: self.demand,
            sites: self.sites,
        })
    }
}

fn check_location(name: &str, lat: f64, lon: f64) -> Result<(), SpecError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(SpecError::InvalidLatitude {
            name: name.to_owned(),
            degrees: lat,
        });
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(SpecError::InvalidLongitude {
            name: name.to_owned(),
            degrees: lon,
        });
    }
    Ok(())
}

/// A `ValidSpec` is a `Spec` that has been validated. Demand points and sites
/// are addressed by their positional [`PointId`]/[`SiteId`] from here on.
#[derive(Debug, Clone)]
pub struct ValidSpec {
    pub(crate) demand: Vec<DemandPoint>,
    pub(crate) sites: Vec<CandidateSite>,
}

impl ValidSpec {
    /// The demand points, indexed by [`PointId`].
    pub fn demand(&self) -> &[DemandPoint] {
        &self.demand
    }

    /// The candidate sites, indexed by [`SiteId`].
    pub fn sites(&self) -> &[CandidateSite] {
        &self.sites
    }

    /// IDs of all candidate sites, in catalog order.
    pub fn site_ids(&self) -> impl Iterator<Item = SiteId> {
        (0..self.sites.len()).map(SiteId::new)
    }

    /// IDs of all demand points, in load order.
    pub fn point_ids(&self) -> impl Iterator<Item = PointId> {
        (0..self.demand.len()).map(PointId::new)
    }

    /// Total population across all demand points.
    pub fn total_population(&self) -> Population {
        self.demand.iter().map(|p| p.population).sum()
    }
}

/// Optimization specification error.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// A record has an out-of-range latitude.
    #[error("{name} has an invalid latitude ({degrees})")]
    InvalidLatitude {
        /// The offending record's name.
        name: String,
        /// The invalid latitude.
        degrees: f64,
    },

    /// A record has an out-of-range longitude.
    #[error("{name} has an invalid longitude ({degrees})")]
    InvalidLongitude {
        /// The offending record's name.
        name: String,
        /// The invalid longitude.
        degrees: f64,
    },

    /// A site has a negative or non-finite price.
    #[error("site {site} has an invalid price ({price})")]
    InvalidPrice {
        /// The offending site's name.
        site: String,
        /// The invalid price.
        price: f64,
    },

    /// A site's risk score is outside [0, 1].
    #[error("site {site} has an invalid risk score ({risk})")]
    InvalidRisk {
        /// The offending site's name.
        site: String,
        /// The invalid risk score.
        risk: f64,
    },
}

#[cfg(test)]
mod tests {
    use crate::geo::Location;
    use crate::testing;
    use crate::types::CandidateSite;
    use crate::units::UsdPerHour;

    use super::*;

    #[test]
    fn valid_spec_succeeds() {
        let spec = testing::triangle_spec();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn negative_price_fails() {
        let mut spec = testing::triangle_spec();
        spec.sites.push(
            CandidateSite::builder()
                .name("bad-price")
                .location(Location::new(40.0, -75.0))
                .price(UsdPerHour::new(-1.0))
                .build(),
        );
        assert!(matches!(
            spec.validate(),
            Err(SpecError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn out_of_range_latitude_fails() {
        let mut spec = testing::triangle_spec();
        spec.sites.push(
            CandidateSite::builder()
                .name("bad-lat")
                .location(Location::new(91.0, 0.0))
                .price(UsdPerHour::new(1.0))
                .build(),
        );
        assert!(matches!(
            spec.validate(),
            Err(SpecError::InvalidLatitude { .. })
        ));
    }

    #[test]
    fn out_of_range_risk_fails() {
        let mut spec = testing::triangle_spec();
        spec.sites.push(
            CandidateSite::builder()
                .name("bad-risk")
                .location(Location::new(40.0, -75.0))
                .price(UsdPerHour::new(1.0))
                .risk(1.5)
                .build(),
        );
        assert!(matches!(spec.validate(), Err(SpecError::InvalidRisk { .. })));
    }

    #[test]
    fn total_population_sums_points() {
        let valid = testing::triangle_spec().validate().unwrap();
        assert_eq!(valid.total_population(), Population::new(160));
    }
}
