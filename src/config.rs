//! Pipeline Configuration - All tuning constants as operator-tunable TOML values
//!
//! Every documented threshold, weight, and band in the two pipelines is a
//! field in this module. Each struct implements `Default` with the documented
//! production values, so behavior is unchanged when no config file is present.
//!
//! ## Loading Order
//!
//! 1. `VIAFLOW_CONFIG` environment variable (path to TOML file)
//! 2. `viaflow.toml` in the current working directory
//! 3. Built-in defaults
//!
//! There is no process-global config cell: the host constructs a
//! `PipelineConfig` once and hands sections (or engines built from them) to
//! each evaluation. That keeps every component a pure function of its inputs
//! and safe to run concurrently.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for both pipelines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Anonymization gate floors
    #[serde(default)]
    pub privacy: PrivacyConfig,

    /// Congestion index / delay model
    #[serde(default)]
    pub congestion: CongestionConfig,

    /// Bottleneck detection bands
    #[serde(default)]
    pub bottleneck: BottleneckConfig,

    /// Multi-horizon prediction models
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Traffic decision rules
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Adaptive signal timing
    #[serde(default)]
    pub signal: SignalConfig,

    /// Trip risk scoring
    #[serde(default)]
    pub risk: RiskConfig,

    /// Hazard forecasting
    #[serde(default)]
    pub hazard: HazardConfig,

    /// Driving decision cascade
    #[serde(default)]
    pub driving: DrivingConfig,

    /// Contextual rerouting
    #[serde(default)]
    pub rerouting: ReroutingConfig,

    /// Priority route estimation
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl PipelineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$VIAFLOW_CONFIG` environment variable
    /// 2. `./viaflow.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("VIAFLOW_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded pipeline config from VIAFLOW_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from VIAFLOW_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "VIAFLOW_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("viaflow.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded pipeline config from ./viaflow.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./viaflow.toml, using defaults");
                }
            }
        }

        info!("No viaflow.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file (for host-managed tuning workflows).
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Pipeline config saved");
        Ok(())
    }

    /// Validate all sections for internal consistency.
    ///
    /// Rules:
    /// - Floors and divisors must be positive
    /// - Band thresholds must escalate (medium ≤ high ≤ critical)
    /// - Weight groups must sum to approximately their documented total
    /// - Signal timing bounds must satisfy min < max
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        // Privacy floors
        if self.privacy.k_anonymity_floor == 0 {
            errors.push("privacy.k_anonymity_floor must be > 0".to_string());
        }
        if self.privacy.min_density_per_km <= 0.0 {
            errors.push("privacy.min_density_per_km must be > 0".to_string());
        }

        // Congestion model
        let c = &self.congestion;
        let weight_sum = c.speed_deficit_weight + c.density_weight;
        if !(95.0..=105.0).contains(&weight_sum) {
            errors.push(format!(
                "congestion weights must sum to ~100, got {weight_sum:.1}"
            ));
        }
        if c.density_saturation_per_km <= 0.0 {
            errors.push("congestion.density_saturation_per_km must be > 0".to_string());
        }
        if c.nominal_traversal_minutes <= 0.0 {
            errors.push("congestion.nominal_traversal_minutes must be > 0".to_string());
        }
        if c.default_free_flow_kmh <= 0.0 {
            errors.push("congestion.default_free_flow_kmh must be > 0".to_string());
        }

        // Bottleneck bands
        let b = &self.bottleneck;
        Self::check_escalation(b.speed_drop_floor, b.medium_drop, "bottleneck.medium_drop", &mut errors);
        Self::check_escalation(b.medium_drop, b.high_drop, "bottleneck.high_drop", &mut errors);
        Self::check_escalation(b.high_drop, b.critical_drop, "bottleneck.critical_drop", &mut errors);
        if !(0.0..1.0).contains(&b.speed_drop_floor) {
            errors.push("bottleneck.speed_drop_floor must be within [0, 1)".to_string());
        }

        // Prediction models
        let p = &self.prediction;
        let ml_sum =
            p.ml_congestion_weight + p.ml_density_weight + p.ml_speed_weight + p.ml_history_weight;
        if !(0.95..=1.05).contains(&ml_sum) {
            errors.push(format!("prediction ml feature weights must sum to ~1.0, got {ml_sum:.2}"));
        }
        for (name, v) in [
            ("prediction.confidence_floor", p.confidence_floor),
            ("prediction.ml_confidence", p.ml_confidence),
            ("prediction.seasonal_confidence", p.seasonal_confidence),
        ] {
            if !(0.0..=1.0).contains(&v) {
                errors.push(format!("{name} must be within [0, 1], got {v}"));
            }
        }
        if p.trend_window < 2 {
            errors.push("prediction.trend_window must be >= 2".to_string());
        }

        // Decision rules
        let d = &self.decision;
        Self::check_escalation(d.low_severity_multiplier, d.medium_severity_multiplier, "decision.medium_severity_multiplier", &mut errors);
        Self::check_escalation(d.medium_severity_multiplier, d.high_severity_multiplier, "decision.high_severity_multiplier", &mut errors);
        Self::check_escalation(d.high_severity_multiplier, d.critical_severity_multiplier, "decision.critical_severity_multiplier", &mut errors);
        if !(0.0..=1.0).contains(&d.prediction_confidence_floor) {
            errors.push("decision.prediction_confidence_floor must be within [0, 1]".to_string());
        }

        // Signal timing
        let s = &self.signal;
        if s.min_green_seconds <= 0.0 {
            errors.push("signal.min_green_seconds must be > 0".to_string());
        }
        if s.max_green_seconds <= s.min_green_seconds {
            errors.push(format!(
                "signal.max_green_seconds ({:.0}) must be > min_green_seconds ({:.0})",
                s.max_green_seconds, s.min_green_seconds
            ));
        }
        if s.intergreen_seconds < 0.0 {
            errors.push("signal.intergreen_seconds must be >= 0".to_string());
        }
        Self::check_escalation(s.high_index, s.emergency_index, "signal.emergency_index", &mut errors);

        // Risk weights
        let r = &self.risk;
        let risk_sum = r.weather_weight + r.traffic_weight + r.visibility_weight + r.speed_weight;
        if !(0.95..=1.05).contains(&risk_sum) {
            errors.push(format!("risk factor weights must sum to ~1.0, got {risk_sum:.2}"));
        }
        Self::check_escalation(r.medium_score, r.high_score, "risk.high_score", &mut errors);
        Self::check_escalation(r.high_score, r.critical_score, "risk.critical_score", &mut errors);
        if !(0.0..=1.0).contains(&r.confidence_floor) || r.confidence_floor == 0.0 {
            errors.push("risk.confidence_floor must be within (0, 1]".to_string());
        }

        // Hazard forecasting
        let h = &self.hazard;
        for (name, v) in [
            ("hazard.default_inclusion", h.default_inclusion),
            ("hazard.congestion_inclusion", h.congestion_inclusion),
            ("hazard.speed_inclusion", h.speed_inclusion),
        ] {
            if !(0.0..=1.0).contains(&v) {
                errors.push(format!("{name} must be within [0, 1], got {v}"));
            }
        }
        Self::check_escalation(h.low_severity_weight, h.medium_severity_weight, "hazard.medium_severity_weight", &mut errors);
        Self::check_escalation(h.medium_severity_weight, h.high_severity_weight, "hazard.high_severity_weight", &mut errors);
        Self::check_escalation(h.high_severity_weight, h.critical_severity_weight, "hazard.critical_severity_weight", &mut errors);
        if h.min_safe_speed_kmh >= h.base_safe_speed_kmh {
            errors.push(format!(
                "hazard.min_safe_speed_kmh ({:.0}) must be < base_safe_speed_kmh ({:.0})",
                h.min_safe_speed_kmh, h.base_safe_speed_kmh
            ));
        }

        // Driving cascade
        let dr = &self.driving;
        if dr.slowdown_tolerance < 1.0 {
            errors.push("driving.slowdown_tolerance must be >= 1.0".to_string());
        }
        for (name, v) in [
            ("driving.stop_hazard_probability", dr.stop_hazard_probability),
            ("driving.reroute_hazard_probability", dr.reroute_hazard_probability),
            ("driving.delay_hazard_probability", dr.delay_hazard_probability),
        ] {
            if !(0.0..=1.0).contains(&v) {
                errors.push(format!("{name} must be within [0, 1], got {v}"));
            }
        }

        // Rerouting bands: tighter visibility bands must be lower
        let rr = &self.rerouting;
        Self::check_escalation(rr.critical_visibility_m, rr.low_visibility_m, "rerouting.low_visibility_m", &mut errors);
        Self::check_escalation(rr.low_visibility_m, rr.medium_visibility_m, "rerouting.medium_visibility_m", &mut errors);
        Self::check_escalation(rr.medium_rain_rate, rr.heavy_rain_rate, "rerouting.heavy_rain_rate", &mut errors);
        Self::check_escalation(rr.heavy_rain_rate, rr.critical_rain_rate, "rerouting.critical_rain_rate", &mut errors);
        Self::check_escalation(rr.strong_wind_kmh, rr.critical_wind_kmh, "rerouting.critical_wind_kmh", &mut errors);

        // Routing
        if self.routing.base_speed_kmh <= 0.0 {
            errors.push("routing.base_speed_kmh must be > 0".to_string());
        }
        if self.routing.interpolation_steps == 0 {
            errors.push("routing.interpolation_steps must be > 0".to_string());
        }

        // Reject NaN/Inf anywhere (sweep all f64 fields via serialization)
        if let Ok(s) = toml::to_string(self) {
            if s.contains("nan") || s.contains("inf") {
                errors.push(
                    "Config contains NaN or Inf values — all thresholds must be finite numbers"
                        .to_string(),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_escalation(lower: f64, upper: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass — catch them explicitly
        if !lower.is_finite() || !upper.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got lower={lower}, upper={upper})"
            ));
            return;
        }
        if upper < lower {
            errors.push(format!("{name}: {upper:.3} must be >= {lower:.3}"));
        }
    }
}

// ============================================================================
// Section Configs
// ============================================================================

/// Anonymization gate floors. Readings below either floor do not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Minimum devices per aggregate (k-anonymity)
    pub k_anonymity_floor: usize,
    /// Minimum device density (devices/km)
    pub min_density_per_km: f64,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            k_anonymity_floor: 30,
            min_density_per_km: 5.0,
        }
    }
}

/// Congestion index blend and delay model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CongestionConfig {
    /// Index points contributed by the speed deficit at full deficit
    pub speed_deficit_weight: f64,
    /// Index points contributed by density at full saturation
    pub density_weight: f64,
    /// Density (devices/km) treated as full saturation
    pub density_saturation_per_km: f64,
    /// Free-flow traversal time the delay estimate is scaled against (minutes)
    pub nominal_traversal_minutes: f64,
    /// Deviation from historical average that flags an anomaly (index points)
    pub anomaly_deviation_threshold: f64,
    /// Index bump applied when an anomaly is flagged
    pub anomaly_index_bump: f64,
    /// Free-flow speed assumed when the segment has no reference value (km/h)
    pub default_free_flow_kmh: f64,
}

impl Default for CongestionConfig {
    fn default() -> Self {
        Self {
            speed_deficit_weight: 60.0,
            density_weight: 40.0,
            density_saturation_per_km: 50.0,
            nominal_traversal_minutes: 5.0,
            anomaly_deviation_threshold: 20.0,
            anomaly_index_bump: 10.0,
            default_free_flow_kmh: 60.0,
        }
    }
}

/// Bottleneck detection bands and backward-extent model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BottleneckConfig {
    /// Minimum speed-drop ratio for a bottleneck to exist
    pub speed_drop_floor: f64,
    /// Speed-drop ratio for MEDIUM severity
    pub medium_drop: f64,
    /// Speed-drop ratio for HIGH severity
    pub high_drop: f64,
    /// Speed-drop ratio for CRITICAL severity
    pub critical_drop: f64,
    /// Backward extent contributed at full congestion (km)
    pub extent_congestion_km: f64,
    /// Backward extent contributed at full density saturation (km)
    pub extent_density_km: f64,
    /// Congestion index a neighbor must exceed to be absorbed
    pub link_congestion_floor: f64,
}

impl Default for BottleneckConfig {
    fn default() -> Self {
        Self {
            speed_drop_floor: 0.30,
            medium_drop: 0.35,
            high_drop: 0.40,
            critical_drop: 0.50,
            extent_congestion_km: 2.0,
            extent_density_km: 1.5,
            link_congestion_floor: 50.0,
        }
    }
}

/// Multi-horizon prediction model tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Index change over the trend window that counts as rising/falling
    pub trend_delta: f64,
    /// Number of trailing history points used for the trend
    pub trend_window: usize,
    /// Temporal-model base confidence before the horizon discount
    pub temporal_base_confidence: f64,
    /// Lower clamp for all confidences
    pub confidence_floor: f64,
    /// Fixed confidence of the ml model
    pub ml_confidence: f64,
    /// Fixed confidence of the seasonal model
    pub seasonal_confidence: f64,
    /// Seasonal index multiplier during rush hours
    pub rush_hour_factor: f64,
    /// Time-of-day factor reported during rush hours
    pub time_of_day_factor: f64,
    /// Day-of-week factor reported on weekends
    pub weekend_factor: f64,
    /// Delay reference duration for the temporal model (minutes)
    pub temporal_reference_minutes: f64,
    /// Delay reference duration for the ml model (minutes)
    pub ml_reference_minutes: f64,
    /// Delay reference duration for the seasonal model (minutes)
    pub seasonal_reference_minutes: f64,
    /// ml feature weight: current congestion index
    pub ml_congestion_weight: f64,
    /// ml feature weight: density
    pub ml_density_weight: f64,
    /// ml feature weight: average speed
    pub ml_speed_weight: f64,
    /// ml feature weight: last historical index
    pub ml_history_weight: f64,
    /// Historical index assumed when no history is supplied
    pub default_historical_index: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            trend_delta: 5.0,
            trend_window: 5,
            temporal_base_confidence: 0.85,
            confidence_floor: 0.5,
            ml_confidence: 0.75,
            seasonal_confidence: 0.65,
            rush_hour_factor: 1.2,
            time_of_day_factor: 1.3,
            weekend_factor: 0.8,
            temporal_reference_minutes: 10.0,
            ml_reference_minutes: 15.0,
            seasonal_reference_minutes: 20.0,
            ml_congestion_weight: 0.4,
            ml_density_weight: 0.3,
            ml_speed_weight: 0.2,
            ml_history_weight: 0.1,
            default_historical_index: 50.0,
        }
    }
}

/// Traffic decision rule thresholds and benefit scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Congestion index that triggers the critical rule
    pub critical_index: f64,
    /// Benefit score of a diversion decision
    pub diversion_benefit: f64,
    /// Benefit score of a signal adjustment decision
    pub signal_benefit: f64,
    /// Benefit score of a preventive intervention decision
    pub intervention_benefit: f64,
    /// Fraction of current delay a diversion removes
    pub diversion_reduction_factor: f64,
    /// Fraction of delay a signal adjustment removes in mid congestion
    pub signal_mid_reduction: f64,
    /// Fraction of delay a signal adjustment removes otherwise
    pub signal_low_reduction: f64,
    /// Lower bound of the mid-congestion band
    pub signal_mid_floor: f64,
    /// Predicted index that triggers an intervention
    pub prediction_index_floor: f64,
    /// Prediction confidence required for an intervention
    pub prediction_confidence_floor: f64,
    /// Fraction of predicted delay an intervention removes
    pub intervention_reduction_factor: f64,
    pub low_severity_multiplier: f64,
    pub medium_severity_multiplier: f64,
    pub high_severity_multiplier: f64,
    pub critical_severity_multiplier: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            critical_index: 80.0,
            diversion_benefit: 85.0,
            signal_benefit: 70.0,
            intervention_benefit: 75.0,
            diversion_reduction_factor: 0.4,
            signal_mid_reduction: 0.3,
            signal_low_reduction: 0.15,
            signal_mid_floor: 50.0,
            prediction_index_floor: 70.0,
            prediction_confidence_floor: 0.7,
            intervention_reduction_factor: 0.5,
            low_severity_multiplier: 1.0,
            medium_severity_multiplier: 1.1,
            high_severity_multiplier: 1.3,
            critical_severity_multiplier: 1.5,
        }
    }
}

/// Adaptive signal timing bounds and gains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Physical minimum green time (seconds)
    pub min_green_seconds: f64,
    /// Physical maximum green time (seconds)
    pub max_green_seconds: f64,
    /// Baseline green time the gains extend (seconds)
    pub default_green_seconds: f64,
    /// Fixed clearance added on top of 2× green to form the cycle (seconds)
    pub intergreen_seconds: f64,
    /// Congestion index that triggers a reactive recommendation
    pub reactive_index_floor: f64,
    /// Congestion index for EMERGENCY priority
    pub emergency_index: f64,
    /// Congestion index for HIGH priority
    pub high_index: f64,
    /// Predicted index that triggers a predictive recommendation
    pub predictive_index_floor: f64,
    /// Lead time under which a predictive recommendation is HIGH priority (minutes)
    pub predictive_lead_minutes: i64,
    /// Green seconds added at full predicted index
    pub predictive_green_gain: f64,
    /// Green seconds added at full density saturation
    pub density_green_gain: f64,
    /// Green seconds added at full congestion
    pub congestion_green_gain: f64,
    /// Cap on the estimated throughput increase (%)
    pub throughput_cap_percent: f64,
    /// Cap on the estimated queue-length reduction (%)
    pub queue_cap_percent: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_green_seconds: 15.0,
            max_green_seconds: 60.0,
            default_green_seconds: 30.0,
            intergreen_seconds: 20.0,
            reactive_index_floor: 50.0,
            emergency_index: 80.0,
            high_index: 60.0,
            predictive_index_floor: 70.0,
            predictive_lead_minutes: 10,
            predictive_green_gain: 20.0,
            density_green_gain: 20.0,
            congestion_green_gain: 10.0,
            throughput_cap_percent: 30.0,
            queue_cap_percent: 40.0,
        }
    }
}

/// Trip risk scoring weights and bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub weather_weight: f64,
    pub traffic_weight: f64,
    /// Visibility carries the highest weight of the four factors
    pub visibility_weight: f64,
    pub speed_weight: f64,
    /// Sub-score above which a factor counts toward compounding
    pub compound_floor: f64,
    /// Number of elevated factors that triggers the compound penalty
    pub compound_count: usize,
    /// Multiplier applied when hazards compound
    pub compound_multiplier: f64,
    /// Combined score for CRITICAL level
    pub critical_score: f64,
    /// Combined score for HIGH level
    pub high_score: f64,
    /// Combined score for MEDIUM level
    pub medium_score: f64,
    /// Score above which a critical assessment recommends stopping
    pub stop_score: f64,
    /// Score above which a low assessment still recommends caution
    pub caution_score: f64,
    /// Confidence deducted when no vehicle telemetry is present
    pub missing_vehicle_penalty: f64,
    /// Confidence deducted when visibility is missing or zero
    pub missing_visibility_penalty: f64,
    /// Lower clamp for confidence
    pub confidence_floor: f64,
    /// Sub-score above which a non-dominant factor is reported as secondary
    pub secondary_floor: f64,
    /// Sub-score above which mitigation guidance is emitted
    pub mitigation_floor: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weather_weight: 0.25,
            traffic_weight: 0.20,
            visibility_weight: 0.35,
            speed_weight: 0.20,
            compound_floor: 50.0,
            compound_count: 2,
            compound_multiplier: 1.2,
            critical_score: 80.0,
            high_score: 60.0,
            medium_score: 30.0,
            stop_score: 90.0,
            caution_score: 20.0,
            missing_vehicle_penalty: 0.2,
            missing_visibility_penalty: 0.1,
            confidence_floor: 0.5,
            secondary_floor: 30.0,
            mitigation_floor: 50.0,
        }
    }
}

/// Hazard forecasting inclusion thresholds and severity weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Probability a hazard must reach to be surfaced
    pub default_inclusion: f64,
    /// Inclusion threshold for sudden congestion
    pub congestion_inclusion: f64,
    /// Inclusion threshold for unsafe speed
    pub speed_inclusion: f64,
    pub low_severity_weight: f64,
    pub medium_severity_weight: f64,
    pub high_severity_weight: f64,
    pub critical_severity_weight: f64,
    /// Safe-speed starting point before condition deductions (km/h)
    pub base_safe_speed_kmh: f64,
    /// Safe-speed floor (km/h)
    pub min_safe_speed_kmh: f64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            default_inclusion: 0.3,
            congestion_inclusion: 0.4,
            speed_inclusion: 0.5,
            low_severity_weight: 0.2,
            medium_severity_weight: 0.4,
            high_severity_weight: 0.7,
            critical_severity_weight: 1.0,
            base_safe_speed_kmh: 100.0,
            min_safe_speed_kmh: 30.0,
        }
    }
}

/// Driving decision cascade thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivingConfig {
    /// Visibility below which driving must stop (meters)
    pub stop_visibility_m: f64,
    /// Risk score above which a critical assessment forces a stop
    pub stop_risk_score: f64,
    /// Probability a critical hazard must reach to force a stop
    pub stop_hazard_probability: f64,
    /// Rain rate that forces a stop (mm/h)
    pub stop_rain_rate: f64,
    /// Wind speed that forces a stop (km/h)
    pub stop_wind_kmh: f64,
    /// Congestion index that triggers a reroute
    pub reroute_congestion_index: f64,
    /// Probability an elevated hazard must reach to count toward rerouting
    pub reroute_hazard_probability: f64,
    /// Elevated hazards required to trigger a reroute
    pub reroute_hazard_count: usize,
    /// Probability a hazard must reach to justify delaying departure
    pub delay_hazard_probability: f64,
    /// Hazard timeframe window considered for delays (minutes)
    pub delay_window_minutes: u32,
    /// Buffer added to the worst hazard timeframe (minutes)
    pub delay_buffer_minutes: u32,
    /// Delay when no hazard pins the timeframe (minutes)
    pub default_delay_minutes: u32,
    /// Multiple of the safe speed above which slowing down is advised
    pub slowdown_tolerance: f64,
}

impl Default for DrivingConfig {
    fn default() -> Self {
        Self {
            stop_visibility_m: 50.0,
            stop_risk_score: 90.0,
            stop_hazard_probability: 0.8,
            stop_rain_rate: 30.0,
            stop_wind_kmh: 60.0,
            reroute_congestion_index: 85.0,
            reroute_hazard_probability: 0.6,
            reroute_hazard_count: 2,
            delay_hazard_probability: 0.5,
            delay_window_minutes: 60,
            delay_buffer_minutes: 15,
            default_delay_minutes: 30,
            slowdown_tolerance: 1.1,
        }
    }
}

/// Contextual rerouting triggers and priority bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReroutingConfig {
    /// Rain rate that counts as heavy rain (mm/h)
    pub heavy_rain_rate: f64,
    /// Visibility that counts as low (meters)
    pub low_visibility_m: f64,
    /// Wind that counts as strong (km/h)
    pub strong_wind_kmh: f64,
    /// Temperature above which heat is extreme (°C)
    pub heat_limit_c: f64,
    /// Temperature below which frost is a factor (°C)
    pub frost_limit_c: f64,
    /// Congestion index that triggers a reroute
    pub congestion_floor: f64,
    /// Congestion index that raises priority to HIGH
    pub congestion_high: f64,
    /// Visibility for CRITICAL weather priority (meters)
    pub critical_visibility_m: f64,
    /// Rain rate for CRITICAL weather priority (mm/h)
    pub critical_rain_rate: f64,
    /// Wind for CRITICAL weather priority (km/h)
    pub critical_wind_kmh: f64,
    /// Visibility for MEDIUM weather priority (meters)
    pub medium_visibility_m: f64,
    /// Rain rate for MEDIUM weather priority (mm/h)
    pub medium_rain_rate: f64,
}

impl Default for ReroutingConfig {
    fn default() -> Self {
        Self {
            heavy_rain_rate: 10.0,
            low_visibility_m: 200.0,
            strong_wind_kmh: 40.0,
            heat_limit_c: 45.0,
            frost_limit_c: 0.0,
            congestion_floor: 80.0,
            congestion_high: 90.0,
            critical_visibility_m: 100.0,
            critical_rain_rate: 20.0,
            critical_wind_kmh: 50.0,
            medium_visibility_m: 500.0,
            medium_rain_rate: 5.0,
        }
    }
}

/// Priority route estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Assumed uncongested travel speed (km/h)
    pub base_speed_kmh: f64,
    /// Seconds after which a live route should be re-estimated
    pub update_interval_seconds: i64,
    /// Interpolation steps of the straight-line path
    pub interpolation_steps: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_speed_kmh: 50.0,
            update_interval_seconds: 30,
            interpolation_steps: 10,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),
    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Tests
// ============================================================================
