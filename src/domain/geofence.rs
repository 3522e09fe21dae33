use crate::error::{ReconcileError, Result};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Radius applied to locations registered without one.
pub const DEFAULT_RADIUS_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let point = Self { lat, lon };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(ReconcileError::validation(format!(
                "latitude {} out of range",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(ReconcileError::validation(format!(
                "longitude {} out of range",
                self.lon
            )));
        }
        Ok(())
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

/// A registered, geofenced site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_m: Option<f64>,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lon: self.lon,
        }
    }

    pub fn effective_radius(&self, default_radius_m: f64) -> f64 {
        self.radius_m.unwrap_or(default_radius_m)
    }
}

/// Which locations a claimed position is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Candidates<'a> {
    /// The employee has a site assignment for the date.
    Assigned(&'a Location),
    /// No assignment: any registered location may admit, in list order.
    Any(&'a [Location]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCandidate {
    pub location_id: String,
    pub site_name: String,
    pub distance_meters: f64,
}

/// Outcome of a geofence evaluation.
///
/// On admission `distance_meters` is the distance to the matched site; on
/// denial it is the distance to the nearest candidate. It is `None` only when
/// there was nothing to check against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDecision {
    pub admitted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_site_name: Option<String>,
    pub distance_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_candidate: Option<NearestCandidate>,
}

impl PositionDecision {
    fn admitted(location: &Location, distance: f64) -> Self {
        Self {
            admitted: true,
            matched_site_name: Some(location.name.clone()),
            distance_meters: Some(distance),
            nearest_candidate: None,
        }
    }

    fn denied(nearest: Option<(&Location, f64)>) -> Self {
        Self {
            admitted: false,
            matched_site_name: None,
            distance_meters: nearest.map(|(_, d)| d),
            nearest_candidate: nearest.map(|(location, distance)| NearestCandidate {
                location_id: location.id.clone(),
                site_name: location.name.clone(),
                distance_meters: distance,
            }),
        }
    }
}

/// Decides whether `claim` may be used for an attendance write.
///
/// Unassigned evaluation admits on the first location in list order whose
/// fence contains the claim, not the nearest one.
pub fn evaluate(
    claim: GeoPoint,
    candidates: Candidates<'_>,
    default_radius_m: f64,
) -> PositionDecision {
    let locations: &[Location] = match candidates {
        Candidates::Assigned(location) => std::slice::from_ref(location),
        Candidates::Any(locations) => locations,
    };

    let mut nearest: Option<(&Location, f64)> = None;
    for location in locations {
        let distance = claim.distance_to(&location.point());
        if distance <= location.effective_radius(default_radius_m) {
            return PositionDecision::admitted(location, distance);
        }
        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((location, distance));
        }
    }

    PositionDecision::denied(nearest)
}
