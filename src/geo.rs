//! Great-circle geometry on WGS-84 latitude/longitude pairs.

use serde::{Deserialize, Serialize};

use crate::error::MsaeError;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point only if both components are finite and in range
    /// (lat in [-90, 90], lon in [-180, 180]).
    pub fn checked(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }

    fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Great-circle distance between two points in kilometers (haversine).
///
/// Fails with [`MsaeError::InvalidCoordinate`] if any component is NaN or
/// infinite. `distance_km(p, p)` is exactly zero.
pub fn distance_km(a: LatLon, b: LatLon) -> Result<f64, MsaeError> {
    for p in [a, b] {
        if !p.is_finite() {
            return Err(MsaeError::InvalidCoordinate {
                lat: p.lat,
                lon: p.lon,
            });
        }
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h marginally above 1 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    Ok(EARTH_RADIUS_KM * c)
}

/// Parse the `"lat, lon"` text form used by the backend for ports and events.
///
/// Splits on the first comma, trims both halves, and requires finite values in
/// range. Anything else yields `None`.
pub fn parse_lat_lon(text: &str) -> Option<LatLon> {
    let (lat, lon) = text.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    LatLon::checked(lat, lon)
}
