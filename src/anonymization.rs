//! Anonymization & Aggregation Gate
//!
//! The only component that ever sees per-device samples. It either produces
//! an aggregate reading that satisfies both privacy floors, or nothing at all:
//!
//! - k-anonymity: fewer than `k_anonymity_floor` devices → no reading
//! - statistical floor: density below `min_density_per_km` → no reading
//!
//! A rejected batch is not an error and not retryable — retrying immediately
//! cannot add devices. The gate keeps only averaged speed/direction and
//! counts; nothing downstream can be mapped back to a device.

use crate::config::PrivacyConfig;
use crate::types::{DeviceSample, InputError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate traffic reading for one segment, above both privacy floors.
///
/// Invariant: this type only exists for batches with
/// `device_count >= k_anonymity_floor` and `density >= min_density_per_km`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizedSegmentReading {
    pub segment_id: String,
    pub timestamp: DateTime<Utc>,
    /// Number of devices aggregated into this reading
    pub device_count: usize,
    /// Mean device speed (km/h)
    pub avg_speed_kmh: f64,
    /// Devices per km of segment
    pub density_per_km: f64,
    /// Mean coarse bearing of the aggregated devices (degrees)
    pub movement_direction_deg: f64,
    /// k value this aggregate guarantees (equals `device_count`)
    pub k_anonymity: usize,
}

impl AnonymizedSegmentReading {
    /// Re-check the privacy floors on an already-built reading.
    pub fn is_compliant(&self, cfg: &PrivacyConfig) -> bool {
        self.k_anonymity >= cfg.k_anonymity_floor && self.density_per_km >= cfg.min_density_per_km
    }
}

/// Aggregate a raw device batch into an anonymized segment reading.
///
/// Returns `Ok(None)` — never a partial record — when the batch fails either
/// privacy floor. Fails fast only on a structurally invalid segment length.
pub fn anonymize(
    segment_id: &str,
    devices: &[DeviceSample],
    segment_length_km: f64,
    observed_at: DateTime<Utc>,
    cfg: &PrivacyConfig,
) -> Result<Option<AnonymizedSegmentReading>, InputError> {
    if segment_length_km <= 0.0 || !segment_length_km.is_finite() {
        return Err(InputError::NonPositiveSegmentLength(segment_length_km));
    }

    // 1. k-anonymity floor
    if devices.len() < cfg.k_anonymity_floor {
        tracing::warn!(
            segment = %segment_id,
            devices = devices.len(),
            floor = cfg.k_anonymity_floor,
            "Rejected batch: insufficient devices for k-anonymity"
        );
        return Ok(None);
    }

    // 2. Density floor
    let density = devices.len() as f64 / segment_length_km;
    if density < cfg.min_density_per_km {
        tracing::warn!(
            segment = %segment_id,
            density,
            floor = cfg.min_density_per_km,
            "Rejected batch: density below statistical floor"
        );
        return Ok(None);
    }

    // 3. Aggregates only — no identifier survives this point
    let count = devices.len() as f64;
    let avg_speed = devices.iter().map(|d| d.speed_kmh).sum::<f64>() / count;
    let avg_direction = devices
        .iter()
        .map(|d| d.lat.atan2(d.lng).to_degrees())
        .sum::<f64>()
        / count;

    Ok(Some(AnonymizedSegmentReading {
        segment_id: segment_id.to_string(),
        timestamp: observed_at,
        device_count: devices.len(),
        avg_speed_kmh: avg_speed,
        density_per_km: density,
        movement_direction_deg: avg_direction,
        k_anonymity: devices.len(),
    }))
}
