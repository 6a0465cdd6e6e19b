//! Nearby healthcare provider search.
//!
//! Providers come from an OpenStreetMap Nominatim search bounded to a box
//! around a center point, then are filtered by great-circle distance and
//! sorted nearest first.

mod client;

pub use client::NominatimClient;

use serde::{Deserialize, Serialize};

/// Mean earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average road speed for travel estimates.
const AVERAGE_SPEED_KMH: f64 = 30.0;

/// Approximate kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Default search radius around a named place.
pub const DEFAULT_CITY_RADIUS_KM: f64 = 20.0;

/// Default search radius around explicit coordinates.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 100.0;

/// Location used when the caller provides none (Pune).
pub const FALLBACK_LOCATION: Coordinates = Coordinates {
    lat: 18.5204,
    lon: 73.8567,
};

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A hospital or clinic found near the search center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    /// First segment of the display name.
    pub name: String,
    pub address: String,
    pub location: Coordinates,
    /// Distance from the search center in kilometres.
    pub distance_km: f64,
}

impl Provider {
    /// Estimated driving time from the search center.
    pub fn travel_minutes(&self) -> u32 {
        estimate_travel_minutes(self.distance_km)
    }
}

/// Great-circle distance in kilometres (haversine).
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Whole minutes to cover `distance_km` at the average road speed.
pub fn estimate_travel_minutes(distance_km: f64) -> u32 {
    if distance_km <= 0.0 || !distance_km.is_finite() {
        return 0;
    }
    ((distance_km / AVERAGE_SPEED_KMH) * 60.0).ceil().max(1.0) as u32
}

/// OpenStreetMap driving directions between two points.
pub fn route_url(origin: Coordinates, destination: Coordinates) -> String {
    format!(
        "https://www.openstreetmap.org/directions?engine=fossgis_osrm_car&route={},{};{},{}",
        origin.lat, origin.lon, destination.lat, destination.lon
    )
}

/// Search box of `radius_km` around `center` as `left,top,right,bottom`
/// (the Nominatim `viewbox` order: min lon, min lat, max lon, max lat).
pub fn viewbox(center: Coordinates, radius_km: f64) -> String {
    let delta = radius_km / KM_PER_DEGREE;
    format!(
        "{},{},{},{}",
        center.lon - delta,
        center.lat - delta,
        center.lon + delta,
        center.lat + delta
    )
}

/// Drop providers beyond `radius_km` and sort the rest nearest first.
pub fn within_radius(mut providers: Vec<Provider>, radius_km: f64) -> Vec<Provider> {
    providers.retain(|p| p.distance_km <= radius_km);
    providers.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    providers
}
