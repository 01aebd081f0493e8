//! Priority route estimator
//!
//! Pure route computation for priority/emergency trips: a straight-line
//! interpolated path, great-circle length, and a congestion-aware travel-time
//! estimate with a refresh policy for live re-evaluation. The real
//! road-network routing provider is an external collaborator; this module
//! supplies the fallback estimate and the refresh bookkeeping.

use crate::config::RoutingConfig;
use crate::types::{GeoPoint, InputError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Congestion on one waypoint of a planned route, as supplied by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct SegmentCongestion {
    pub congestion_index: f64,
    pub delay_minutes: f64,
}

/// Congestion recorded along a planned route, per waypoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteCongestionPoint {
    /// Index into the route's waypoint path
    pub waypoint: usize,
    pub congestion_index: f64,
    pub delay_minutes: f64,
}

/// A live-estimated priority route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    /// Interpolated waypoints, origin first
    pub path: Vec<GeoPoint>,
    /// Great-circle length of the path (km, 0.1 resolution)
    pub distance_km: f64,
    /// Travel-time estimate including congestion delays (minutes, 0.1 resolution)
    pub estimated_minutes: f64,
    pub last_update: DateTime<Utc>,
    /// Seconds after which the estimate should be refreshed
    pub update_interval_seconds: i64,
    pub congestion_along_route: Vec<RouteCongestionPoint>,
}

/// Plan a priority route between two points.
///
/// `congestion` maps waypoint indexes to the congestion the caller knows
/// about along the corridor; unknown waypoints count as free-flowing.
pub fn plan(
    origin: GeoPoint,
    destination: GeoPoint,
    congestion: &BTreeMap<usize, SegmentCongestion>,
    now: DateTime<Utc>,
    cfg: &RoutingConfig,
) -> Result<PlannedRoute, InputError> {
    for point in [origin, destination] {
        if !point.is_finite() {
            return Err(InputError::NonFiniteCoordinate { lat: point.lat, lng: point.lng });
        }
    }

    let path = interpolate(origin, destination, cfg.interpolation_steps);
    let distance = path_distance_km(&path);
    let estimated = estimate_minutes(distance, &path, congestion, cfg);

    let congestion_along_route = (0..path.len())
        .map(|i| {
            let c = congestion.get(&i).copied().unwrap_or_default();
            RouteCongestionPoint {
                waypoint: i,
                congestion_index: c.congestion_index,
                delay_minutes: c.delay_minutes,
            }
        })
        .collect();

    Ok(PlannedRoute {
        origin,
        destination,
        path,
        distance_km: round1(distance),
        estimated_minutes: round1(estimated),
        last_update: now,
        update_interval_seconds: cfg.update_interval_seconds,
        congestion_along_route,
    })
}

/// Re-estimate a live route against fresh congestion data.
pub fn refresh(
    route: &PlannedRoute,
    congestion: &BTreeMap<usize, SegmentCongestion>,
    now: DateTime<Utc>,
    cfg: &RoutingConfig,
) -> Result<PlannedRoute, InputError> {
    plan(route.origin, route.destination, congestion, now, cfg)
}

/// Whether the route's estimate has outlived its update interval.
pub fn needs_refresh(route: &PlannedRoute, now: DateTime<Utc>) -> bool {
    (now - route.last_update).num_seconds() >= route.update_interval_seconds
}

/// Straight-line interpolation with `steps` segments (steps + 1 waypoints).
fn interpolate(origin: GeoPoint, destination: GeoPoint, steps: usize) -> Vec<GeoPoint> {
    (0..=steps)
        .map(|i| {
            let ratio = i as f64 / steps as f64;
            GeoPoint {
                lat: origin.lat + (destination.lat - origin.lat) * ratio,
                lng: origin.lng + (destination.lng - origin.lng) * ratio,
            }
        })
        .collect()
}

/// Sum of great-circle hops along the path (km).
fn path_distance_km(path: &[GeoPoint]) -> f64 {
    path.windows(2).map(|pair| haversine_km(pair[0], pair[1])).sum()
}

/// Great-circle distance between two coordinates (km).
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Base travel time at the configured speed plus known per-waypoint delays.
fn estimate_minutes(
    distance_km: f64,
    path: &[GeoPoint],
    congestion: &BTreeMap<usize, SegmentCongestion>,
    cfg: &RoutingConfig,
) -> f64 {
    let base = distance_km / cfg.base_speed_kmh * 60.0;
    let delays: f64 = (0..path.len())
        .filter_map(|i| congestion.get(&i).map(|c| c.delay_minutes))
        .sum();
    base + delays
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn riyadh() -> GeoPoint {
        GeoPoint::new(24.7136, 46.6753)
    }

    fn airport() -> GeoPoint {
        GeoPoint::new(24.9576, 46.6988)
    }

    #[test]
    fn test_haversine_zero_for_identical_points() {
        assert_eq!(haversine_km(riyadh(), riyadh()), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Riyadh center to the airport is roughly 27 km
        let distance = haversine_km(riyadh(), airport());
        assert!((25.0..30.0).contains(&distance), "got {distance}");
    }

    #[test]
    fn test_plan_produces_interpolated_path() {
        let cfg = RoutingConfig::default();
        let route = plan(riyadh(), airport(), &BTreeMap::new(), DateTime::<Utc>::UNIX_EPOCH, &cfg)
            .unwrap_or_else(|e| panic!("finite coordinates must plan: {e}"));

        assert_eq!(route.path.len(), cfg.interpolation_steps + 1);
        assert_eq!(route.path[0], riyadh());
        assert_eq!(route.path[cfg.interpolation_steps], airport());
        assert!(route.distance_km > 0.0);
        // Base time only: distance / 50 km/h
        let expected = (route.distance_km / 50.0 * 60.0 * 10.0).round() / 10.0;
        assert!((route.estimated_minutes - expected).abs() <= 0.1);
    }

    #[test]
    fn test_congestion_delays_add_linearly() {
        let cfg = RoutingConfig::default();
        let free = plan(riyadh(), airport(), &BTreeMap::new(), DateTime::<Utc>::UNIX_EPOCH, &cfg)
            .unwrap_or_else(|e| panic!("{e}"));

        let mut congestion = BTreeMap::new();
        congestion.insert(2, SegmentCongestion { congestion_index: 80.0, delay_minutes: 4.0 });
        congestion.insert(5, SegmentCongestion { congestion_index: 60.0, delay_minutes: 2.5 });

        let jammed = plan(riyadh(), airport(), &congestion, DateTime::<Utc>::UNIX_EPOCH, &cfg)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!((jammed.estimated_minutes - (free.estimated_minutes + 6.5)).abs() <= 0.1);
        assert_eq!(jammed.congestion_along_route[2].congestion_index, 80.0);
        assert_eq!(jammed.congestion_along_route[0].congestion_index, 0.0);
    }

    #[test]
    fn test_refresh_policy() {
        let cfg = RoutingConfig::default();
        let start = DateTime::<Utc>::UNIX_EPOCH;
        let route = plan(riyadh(), airport(), &BTreeMap::new(), start, &cfg)
            .unwrap_or_else(|e| panic!("{e}"));

        // Fresh route needs no refresh
        assert!(!needs_refresh(&route, start));
        assert!(!needs_refresh(&route, start + Duration::seconds(29)));
        // After the update interval it does
        assert!(needs_refresh(&route, start + Duration::seconds(30)));

        let later = start + Duration::seconds(45);
        let refreshed = refresh(&route, &BTreeMap::new(), later, &cfg)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(refreshed.last_update, later);
        assert!(!needs_refresh(&refreshed, later));
    }

    #[test]
    fn test_non_finite_coordinates_fail_fast() {
        let cfg = RoutingConfig::default();
        let bad = GeoPoint::new(f64::NAN, 46.0);
        assert!(plan(bad, airport(), &BTreeMap::new(), DateTime::<Utc>::UNIX_EPOCH, &cfg).is_err());
        let inf = GeoPoint::new(24.0, f64::INFINITY);
        assert!(plan(riyadh(), inf, &BTreeMap::new(), DateTime::<Utc>::UNIX_EPOCH, &cfg).is_err());
    }
}
