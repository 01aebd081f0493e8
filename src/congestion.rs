//! Traffic Intelligence Analyzer
//!
//! Turns an anonymized segment reading into a `TrafficAnalysis`:
//!
//! - congestion index (0-100): speed deficit weighted 60 points, density
//!   saturation 40 points, density capped at the saturation value to bound
//!   outlier influence
//! - delay estimate (minutes) against a nominal free-flow traversal
//!
//! The advanced variant bumps the index when it deviates sharply from the
//! segment's historical average, flagging anomalies for operators.

use crate::anonymization::AnonymizedSegmentReading;
use crate::config::CongestionConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-segment congestion analysis for one evaluation tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficAnalysis {
    pub segment_id: String,
    pub timestamp: DateTime<Utc>,
    /// Devices per km
    pub density_per_km: f64,
    /// Mean traffic speed (km/h)
    pub avg_speed_kmh: f64,
    /// Congestion index (0-100, whole number)
    pub congestion_index: f64,
    /// Estimated delay over the nominal traversal (minutes, 0.1 resolution)
    pub delay_minutes: f64,
    /// Mean movement direction (degrees)
    pub movement_direction_deg: f64,
    /// Reference free-flow speed (km/h)
    pub free_flow_speed_kmh: f64,
}

/// Composite congestion index (0-100) from density and relative speed.
///
/// `index = clamp(round((1 − speed/free_flow) × speed_weight
///                      + min(density/saturation, 1) × density_weight), 0, 100)`
pub fn congestion_index(
    density_per_km: f64,
    avg_speed_kmh: f64,
    free_flow_kmh: f64,
    cfg: &CongestionConfig,
) -> f64 {
    let speed_ratio = avg_speed_kmh / free_flow_kmh;
    let density_factor = (density_per_km / cfg.density_saturation_per_km).min(1.0);

    let index =
        ((1.0 - speed_ratio) * cfg.speed_deficit_weight + density_factor * cfg.density_weight)
            .round();

    index.clamp(0.0, 100.0)
}

/// Congestion index with a historical-anomaly bump.
///
/// When the base index deviates from the segment's historical average by more
/// than the configured threshold, the index is raised by the anomaly bump
/// (capped at 100) so operators see the excursion.
pub fn advanced_congestion_index(
    density_per_km: f64,
    avg_speed_kmh: f64,
    free_flow_kmh: f64,
    historical_avg: Option<f64>,
    cfg: &CongestionConfig,
) -> f64 {
    let base = congestion_index(density_per_km, avg_speed_kmh, free_flow_kmh, cfg);

    if let Some(avg) = historical_avg {
        if (base - avg).abs() > cfg.anomaly_deviation_threshold {
            return (base + cfg.anomaly_index_bump).min(100.0);
        }
    }

    base
}

/// Analyze an anonymized reading against the segment's free-flow speed.
///
/// Segments without a reference free-flow value fall back to the configured
/// default.
pub fn analyze(
    reading: &AnonymizedSegmentReading,
    free_flow_kmh: Option<f64>,
    cfg: &CongestionConfig,
) -> TrafficAnalysis {
    let free_flow_kmh = free_flow_kmh.unwrap_or(cfg.default_free_flow_kmh);
    let density = reading.density_per_km;
    let avg_speed = reading.avg_speed_kmh;

    let index = congestion_index(density, avg_speed, free_flow_kmh, cfg);

    // Delay against the nominal free-flow traversal. The divisor speed is
    // floored at 1 km/h so a stationary segment yields a large bounded delay
    // rather than an infinite one.
    let speed_ratio = avg_speed / free_flow_kmh;
    let delay_factor = 1.0 - speed_ratio;
    let estimated_traversal_minutes =
        (free_flow_kmh / avg_speed.max(1.0)) * cfg.nominal_traversal_minutes;
    let delay_minutes = (delay_factor * estimated_traversal_minutes).max(0.0);

    TrafficAnalysis {
        segment_id: reading.segment_id.clone(),
        timestamp: reading.timestamp,
        density_per_km: density,
        avg_speed_kmh: avg_speed,
        congestion_index: index,
        delay_minutes: round1(delay_minutes),
        movement_direction_deg: reading.movement_direction_deg,
        free_flow_speed_kmh: free_flow_kmh,
    }
}

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
