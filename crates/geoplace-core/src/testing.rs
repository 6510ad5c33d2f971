use crate::geo::Location;
use crate::spec::Spec;
use crate::types::{CandidateSite, DemandPoint};
use crate::units::{Kilometers, Population, UsdPerHour};

pub(crate) const RADIUS: Kilometers = Kilometers::new(1000.0);

fn point(name: &str, population: u64, lat: f64, lon: f64) -> DemandPoint {
    DemandPoint::new(
        name.to_owned(),
        Population::new(population),
        Location::new(lat, lon),
    )
}

fn site(name: &str, price: f64, lat: f64, lon: f64) -> CandidateSite {
    CandidateSite::builder()
        .name(name)
        .location(Location::new(lat, lon))
        .price(UsdPerHour::new(price))
        .build()
}

/// Three mid-Atlantic demand points and three sites, all mutually within the
/// 1000 km test radius. Total population is 160.
pub(crate) fn triangle_spec() -> Spec {
    Spec {
        demand: vec![
            point("new-york", 100, 40.71, -74.00),
            point("philadelphia", 50, 39.95, -75.16),
            point("washington", 10, 38.90, -77.04),
        ],
        sites: vec![
            site("newark", 1.0, 40.70, -74.20),
            site("harrisburg", 1.0, 40.27, -76.88),
            site("richmond", 1.0, 37.54, -77.43),
        ],
    }
}

/// Two east-coast demand points served by two east-coast sites, plus one
/// west-coast point served by a single site. No point sees more than two
/// sites.
pub(crate) fn coastal_spec() -> Spec {
    Spec {
        demand: vec![
            point("new-york", 100, 40.71, -74.00),
            point("philadelphia", 50, 39.95, -75.16),
            point("los-angeles", 10, 34.05, -118.24),
        ],
        sites: vec![
            site("newark", 1.0, 40.70, -74.20),
            site("ashburn", 2.0, 39.04, -77.48),
            site("los-angeles", 1.5, 34.05, -118.24),
        ],
    }
}

/// One demand point with exactly one site in range.
pub(crate) fn lone_site_spec() -> Spec {
    Spec {
        demand: vec![point("new-york", 100, 40.71, -74.00)],
        sites: vec![site("newark", 1.0, 40.70, -74.20)],
    }
}
