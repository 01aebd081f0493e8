//! Bottleneck Origin Detector
//!
//! Locates the first sharp speed drop on a segment by comparing the current
//! analysis against the previous one for the same segment. Without a prior
//! analysis there is nothing to compare — that is the expected first-sample
//! case, not a failure.
//!
//! A detected bottleneck carries a heuristic backward extent (how far
//! upstream its effect propagates) and can absorb congested neighbors within
//! that extent into its affected-segment set.

use crate::config::BottleneckConfig;
use crate::congestion::{round1, TrafficAnalysis};
use crate::types::{GeoPoint, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A detected congestion origin point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bottleneck {
    pub segment_id: String,
    /// Location of the origin segment (from segment reference data)
    pub origin: GeoPoint,
    pub detected_at: DateTime<Utc>,
    pub severity: Severity,
    /// Relative speed drop versus the previous analysis (0-1, 2-decimal)
    pub speed_drop_ratio: f64,
    /// Estimated upstream propagation distance (km, 0.1 resolution)
    pub backward_extent_km: f64,
    /// Segments inside the backward extent, origin included
    pub affected_segments: BTreeSet<String>,
}

/// A neighboring segment candidate for backward-extent linking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacentSegment {
    pub segment_id: String,
    /// Neighbor's own congestion index
    pub congestion_index: f64,
    /// Upstream distance from the bottleneck origin (km)
    pub distance_km: f64,
}

/// Detect a bottleneck origin on a segment.
///
/// Returns `None` when there is no previous analysis, when the previous speed
/// carries no information (≤ 0), or when the speed drop stays below the
/// detection floor.
pub fn detect(
    current: &TrafficAnalysis,
    previous: Option<&TrafficAnalysis>,
    origin: GeoPoint,
    cfg: &BottleneckConfig,
) -> Option<Bottleneck> {
    let previous = previous?;

    if previous.avg_speed_kmh <= 0.0 {
        return None;
    }

    let speed_drop = (previous.avg_speed_kmh - current.avg_speed_kmh) / previous.avg_speed_kmh;
    if speed_drop < cfg.speed_drop_floor {
        return None;
    }

    let severity = if speed_drop >= cfg.critical_drop {
        Severity::Critical
    } else if speed_drop >= cfg.high_drop {
        Severity::High
    } else if speed_drop >= cfg.medium_drop {
        Severity::Medium
    } else {
        Severity::Low
    };

    let backward_extent = estimate_backward_extent(
        current.congestion_index,
        current.density_per_km,
        cfg,
    );

    let mut affected = BTreeSet::new();
    affected.insert(current.segment_id.clone());

    Some(Bottleneck {
        segment_id: current.segment_id.clone(),
        origin,
        detected_at: current.timestamp,
        severity,
        speed_drop_ratio: round2(speed_drop),
        backward_extent_km: backward_extent,
        affected_segments: affected,
    })
}

/// Estimate how far upstream the bottleneck's effect reaches.
///
/// Higher congestion and higher density both push the extent out:
/// `extent = congestion_factor × extent_congestion_km
///         + min(density/50, 1) × extent_density_km`
fn estimate_backward_extent(congestion_index: f64, density_per_km: f64, cfg: &BottleneckConfig) -> f64 {
    let congestion_factor = congestion_index / 100.0;
    let density_factor = (density_per_km / 50.0).min(1.0);

    round1(congestion_factor * cfg.extent_congestion_km + density_factor * cfg.extent_density_km)
}

/// Absorb congested neighbors within the backward extent.
///
/// A neighbor joins the affected set when it lies inside the extent AND its
/// own congestion index exceeds the linking floor.
pub fn link_backward_extent(
    mut bottleneck: Bottleneck,
    adjacent: &[AdjacentSegment],
    cfg: &BottleneckConfig,
) -> Bottleneck {
    for segment in adjacent {
        if segment.distance_km <= bottleneck.backward_extent_km
            && segment.congestion_index > cfg.link_congestion_floor
        {
            bottleneck.affected_segments.insert(segment.segment_id.clone());
        }
    }
    bottleneck
}

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
