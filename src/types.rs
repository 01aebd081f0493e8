//! Shared data contracts for the traffic intelligence pipelines
//!
//! This module defines the types both pipelines consume and produce:
//! - Raw mobility input (`DeviceSample`) visible only to the anonymization gate
//! - Context snapshots supplied by the host (`WeatherSnapshot`, `TrafficSnapshot`,
//!   `VehicleSnapshot`, `RouteInfo`, `Incident`)
//! - Severity/priority ladders shared across engines
//! - Structural validation errors (`InputError`)
//!
//! Everything here is a plain serde-serializable value type; the host service
//! owns transport, persistence, and presentation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Severity & Priority Ladders
// ============================================================================

/// Four-step severity ladder used by bottlenecks, hazards, incidents, and alerts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Operator-facing priority for decisions and recommendations.
///
/// Ordered so escalation logic can take `max` over contributing causes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "LOW"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::High => write!(f, "HIGH"),
            Priority::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

// ============================================================================
// Raw Mobility Input (pre-anonymization)
// ============================================================================

/// A single per-device position/speed sample from a mobility provider batch.
///
/// Carries no device identifier of any kind. Only the anonymization gate may
/// see these; every downstream component works on aggregates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeviceSample {
    pub lat: f64,
    pub lng: f64,
    /// Instantaneous speed (km/h)
    pub speed_kmh: f64,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Weather Context
// ============================================================================

/// Coarse weather condition label from the weather provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    HeavyRain,
    Snow,
    Fog,
    Storm,
    Dust,
    Sandstorm,
}

impl WeatherCondition {
    /// Base risk contribution of the condition label (0-100 scale points).
    ///
    /// Labels without a documented entry contribute 20 points.
    pub fn base_risk_points(&self) -> f64 {
        match self {
            WeatherCondition::Clear => 0.0,
            WeatherCondition::PartlyCloudy => 5.0,
            WeatherCondition::Cloudy => 10.0,
            WeatherCondition::Rain => 30.0,
            WeatherCondition::HeavyRain => 50.0,
            WeatherCondition::Snow => 40.0,
            WeatherCondition::Fog => 60.0,
            WeatherCondition::Storm => 70.0,
            WeatherCondition::Dust | WeatherCondition::Sandstorm => 20.0,
        }
    }

    /// Airborne dust/sand event (reduced-visibility hazard class).
    pub fn is_dust_event(&self) -> bool {
        matches!(self, WeatherCondition::Dust | WeatherCondition::Sandstorm)
    }

    /// Convective storm label.
    pub fn is_storm(&self) -> bool {
        matches!(self, WeatherCondition::Storm)
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::PartlyCloudy => "partly cloudy",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Rain => "rain",
            WeatherCondition::HeavyRain => "heavy rain",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Storm => "storm",
            WeatherCondition::Dust => "dust",
            WeatherCondition::Sandstorm => "sandstorm",
        };
        write!(f, "{label}")
    }
}

/// Current-conditions snapshot from the weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature (°C)
    pub temperature_c: f64,
    /// Relative humidity (%)
    pub humidity_percent: f64,
    /// Sustained wind speed (km/h)
    pub wind_speed_kmh: f64,
    /// Wind direction (degrees from north)
    pub wind_direction_deg: f64,
    /// Horizontal visibility (meters)
    pub visibility_m: f64,
    /// Barometric pressure (hPa)
    pub pressure_hpa: f64,
    /// Accumulated precipitation (mm)
    pub precipitation_mm: f64,
    /// Current rain rate (mm/h)
    pub rain_rate_mm_hr: f64,
    /// Cloud cover (%)
    pub cloud_cover_percent: f64,
    pub condition: WeatherCondition,
    pub observed_at: DateTime<Utc>,
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self {
            temperature_c: 25.0,
            humidity_percent: 40.0,
            wind_speed_kmh: 10.0,
            wind_direction_deg: 0.0,
            visibility_m: 10_000.0,
            pressure_hpa: 1013.0,
            precipitation_mm: 0.0,
            rain_rate_mm_hr: 0.0,
            cloud_cover_percent: 10.0,
            condition: WeatherCondition::Clear,
            observed_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Severity scale used by weather-provider warnings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl From<AlertSeverity> for Severity {
    fn from(value: AlertSeverity) -> Self {
        match value {
            AlertSeverity::Minor => Severity::Low,
            AlertSeverity::Moderate => Severity::Medium,
            AlertSeverity::Severe => Severity::High,
            AlertSeverity::Extreme => Severity::Critical,
        }
    }
}

/// An official warning issued by the weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// ============================================================================
// Traffic / Vehicle / Route Context
// ============================================================================

/// Segment-level traffic state as consumed by the driver pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    /// Congestion index (0-100)
    pub congestion_index: f64,
    /// Average traffic speed (km/h)
    pub avg_speed_kmh: f64,
    /// Device density (devices/km)
    pub density_per_km: f64,
}

impl Default for TrafficSnapshot {
    fn default() -> Self {
        Self {
            congestion_index: 0.0,
            avg_speed_kmh: 60.0,
            density_per_km: 0.0,
        }
    }
}

/// Functional road class of the segment the vehicle is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoadType {
    Highway,
    Urban,
    Rural,
}

/// Navigating-vehicle telemetry. Optional everywhere it appears: the driver
/// pipeline degrades to documented fallbacks when no vehicle is present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    /// Vehicle speed (km/h)
    pub speed_kmh: f64,
    /// Heading (degrees from north)
    pub heading_deg: f64,
    pub road_type: Option<RoadType>,
}

/// Route summary from the route provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteInfo {
    /// Route length (km)
    pub distance_km: f64,
    /// Expected travel time (minutes)
    pub duration_minutes: f64,
}

impl RouteInfo {
    /// Reject structurally invalid route data (negative lengths/durations).
    pub fn validate(&self) -> Result<(), InputError> {
        if self.distance_km < 0.0 || !self.distance_km.is_finite() {
            return Err(InputError::NegativeRouteDistance(self.distance_km));
        }
        if self.duration_minutes < 0.0 || !self.duration_minutes.is_finite() {
            return Err(InputError::NegativeRouteDuration(self.duration_minutes));
        }
        Ok(())
    }
}

// ============================================================================
// Incident Feed
// ============================================================================

/// Category of a reported road incident.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IncidentKind {
    Accident,
    Construction,
    Event,
    Weather,
}

impl std::fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentKind::Accident => write!(f, "accident"),
            IncidentKind::Construction => write!(f, "construction"),
            IncidentKind::Event => write!(f, "event"),
            IncidentKind::Weather => write!(f, "weather"),
        }
    }
}

/// A single entry from the incident feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub kind: IncidentKind,
    pub severity: Severity,
    pub location: GeoPoint,
}

// ============================================================================
// Congestion Banding
// ============================================================================

/// Operator-facing congestion band derived from the congestion index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CongestionLevel {
    /// index < 30
    Smooth,
    /// 30 ≤ index < 50
    Moderate,
    /// 50 ≤ index < 70
    Busy,
    /// 70 ≤ index < 90
    VeryBusy,
    /// index ≥ 90
    Gridlock,
}

impl CongestionLevel {
    /// Band a congestion index (0-100) into its display level.
    pub fn from_index(index: f64) -> Self {
        if index < 30.0 {
            CongestionLevel::Smooth
        } else if index < 50.0 {
            CongestionLevel::Moderate
        } else if index < 70.0 {
            CongestionLevel::Busy
        } else if index < 90.0 {
            CongestionLevel::VeryBusy
        } else {
            CongestionLevel::Gridlock
        }
    }
}

impl std::fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CongestionLevel::Smooth => write!(f, "smooth"),
            CongestionLevel::Moderate => write!(f, "moderate"),
            CongestionLevel::Busy => write!(f, "busy"),
            CongestionLevel::VeryBusy => write!(f, "very busy"),
            CongestionLevel::Gridlock => write!(f, "gridlock"),
        }
    }
}

// ============================================================================
// Structural Validation Errors
// ============================================================================

/// Structurally invalid input. Raised synchronously; "low-quality but
/// present" data (zero speeds, empty batches, missing optionals) never
/// produces one of these — only data that cannot describe a physical road.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("segment length must be positive, got {0} km")]
    NonPositiveSegmentLength(f64),
    #[error("route distance must be a non-negative finite number, got {0} km")]
    NegativeRouteDistance(f64),
    #[error("route duration must be a non-negative finite number, got {0} minutes")]
    NegativeRouteDuration(f64),
    #[error("coordinate is not finite: ({lat}, {lng})")]
    NonFiniteCoordinate { lat: f64, lng: f64 },
}

// ============================================================================
// Tests
// ============================================================================
