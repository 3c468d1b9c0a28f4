use serde::{Deserialize, Serialize};
use uom::si::{f64::Length, length::kilometer};

/// Mean Earth radius used by the haversine formula, in km
pub const EARTH_RADIUS_KM: f64 = 6371.;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

impl GeoPosition {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` on a sphere of radius [`EARTH_RADIUS_KM`].
    pub fn distance_to(&self, other: &GeoPosition) -> Length {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.).sin() * (d_lat / 2.).sin()
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_lng / 2.).sin()
                * (d_lng / 2.).sin();
        let c = 2. * a.sqrt().atan2((1. - a).sqrt());

        Length::new::<kilometer>(EARTH_RADIUS_KM * c)
    }
}

/// Haversine distance in km between two latitude/longitude pairs.
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    GeoPosition::new(lat1, lon1)
        .distance_to(&GeoPosition::new(lat2, lon2))
        .get::<kilometer>()
}
