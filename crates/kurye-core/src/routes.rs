use serde::{Deserialize, Serialize};

use crate::packages::{DeliveryType, PackageStatus};

/// Default centre of the route map when there are no stops.
pub const DEFAULT_REGION: MapRegion = MapRegion {
    latitude: 41.0082,
    longitude: 28.9784,
    latitude_delta: 0.0922,
    longitude_delta: 0.0421,
};

/// Padding applied to the stop bounding box so edge markers stay visible.
const REGION_PADDING: f64 = 1.3;

/// One waypoint in the backend-computed delivery sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub kargo_id: String,
    #[serde(default)]
    pub package_id: Option<i64>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub delivery_type: Option<DeliveryType>,
    #[serde(default)]
    pub status: Option<PackageStatus>,
    pub sequence: u32,
    #[serde(default)]
    pub distance_from_previous: Option<f64>,
    #[serde(default)]
    pub time_window_start: Option<String>,
    #[serde(default)]
    pub time_window_end: Option<String>,
    #[serde(default)]
    pub estimated_arrival: Option<String>,
}

/// Response of `GET /api/routes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    #[serde(default)]
    pub stops: Vec<RouteStop>,
    /// Kilometres.
    #[serde(default)]
    pub total_distance: f64,
    /// Minutes.
    #[serde(default)]
    pub estimated_duration: i64,
    #[serde(default)]
    pub route_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl OptimizedRoute {
    #[must_use]
    pub fn region(&self) -> MapRegion {
        MapRegion::fitting(&self.stops)
    }
}

/// A previously computed route from `GET /api/routes/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub courier_id: Option<i64>,
    #[serde(default)]
    pub route_data: serde_json::Value,
    pub total_distance: f64,
    pub estimated_duration: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub route_date: Option<String>,
}

/// Origin to recompute the route from instead of the backend's default depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

/// Visible map area: centre plus span in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Smallest padded region that contains every stop.
    ///
    /// Returns [`DEFAULT_REGION`] for an empty slice.
    #[must_use]
    pub fn fitting(stops: &[RouteStop]) -> Self {
        let Some(first) = stops.first() else {
            return DEFAULT_REGION;
        };
        let init = (first.latitude, first.latitude, first.longitude, first.longitude);
        let (min_lat, max_lat, min_lng, max_lng) =
            stops
                .iter()
                .fold(init, |(min_lat, max_lat, min_lng, max_lng), s| {
                    (
                        min_lat.min(s.latitude),
                        max_lat.max(s.latitude),
                        min_lng.min(s.longitude),
                        max_lng.max(s.longitude),
                    )
                });
        Self {
            latitude: (min_lat + max_lat) / 2.0,
            longitude: (min_lng + max_lng) / 2.0,
            latitude_delta: (max_lat - min_lat) * REGION_PADDING,
            longitude_delta: (max_lng - min_lng) * REGION_PADDING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(seq: u32, lat: f64, lng: f64) -> RouteStop {
        RouteStop {
            kargo_id: format!("KRG-{seq}"),
            package_id: Some(i64::from(seq)),
            recipient_name: None,
            address: "somewhere".to_owned(),
            latitude: lat,
            longitude: lng,
            delivery_type: None,
            status: None,
            sequence: seq,
            distance_from_previous: None,
            time_window_start: None,
            time_window_end: None,
            estimated_arrival: None,
        }
    }

    #[test]
    fn empty_route_uses_default_region() {
        assert_eq!(MapRegion::fitting(&[]), DEFAULT_REGION);
    }

    #[test]
    fn region_centres_on_bounding_box_with_padding() {
        let stops = [stop(1, 41.0, 29.0), stop(2, 41.2, 28.8), stop(3, 41.1, 29.1)];
        let region = MapRegion::fitting(&stops);
        assert!((region.latitude - 41.1).abs() < 1e-9);
        assert!((region.longitude - 28.95).abs() < 1e-9);
        assert!((region.latitude_delta - 0.2 * 1.3).abs() < 1e-9);
        assert!((region.longitude_delta - 0.3 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn optimized_route_tolerates_missing_optional_fields() {
        let route: OptimizedRoute = serde_json::from_value(serde_json::json!({
            "stops": [{
                "kargo_id": "DEPOT",
                "address": "Istanbul Merkez Depo",
                "latitude": 41.0082,
                "longitude": 28.9784,
                "sequence": 0
            }],
            "total_distance": 12.5,
            "estimated_duration": 48
        }))
        .unwrap();
        assert_eq!(route.stops.len(), 1);
        assert!(route.stops[0].package_id.is_none());
        assert_eq!(route.estimated_duration, 48);
    }
}
