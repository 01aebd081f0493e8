//! Hazard Prediction Engine
//!
//! Evaluates six named hazards independently over the same context the risk
//! engine sees, each with its own probability model, inclusion threshold, and
//! forecast timeframe:
//!
//! | Hazard | Horizon | Included above |
//! |---|---|---|
//! | hydroplaning | 5 min | 0.3 |
//! | fog | 15 min | 0.3 |
//! | sudden congestion | 10 min | 0.4 |
//! | temperature drop | 30 min | 0.3 |
//! | unsafe speed | immediate | 0.5 |
//! | wind hazard | 15 min | 0.3 |
//!
//! The shared safe-speed formula lives here ([`safe_speed`]) and is also the
//! one the driving decision cascade compares against.

use crate::config::HazardConfig;
use crate::risk::RiskLevel;
use crate::types::{RoadType, Severity, TrafficSnapshot, VehicleSnapshot, WeatherSnapshot};
use serde::{Deserialize, Serialize};

/// The six forecast hazard classes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Hydroplaning,
    Fog,
    SuddenCongestion,
    TemperatureDrop,
    UnsafeSpeed,
    WindHazard,
}

impl std::fmt::Display for HazardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HazardKind::Hydroplaning => write!(f, "hydroplaning"),
            HazardKind::Fog => write!(f, "fog"),
            HazardKind::SuddenCongestion => write!(f, "sudden_congestion"),
            HazardKind::TemperatureDrop => write!(f, "temperature_drop"),
            HazardKind::UnsafeSpeed => write!(f, "unsafe_speed"),
            HazardKind::WindHazard => write!(f, "wind_hazard"),
        }
    }
}

/// A single surfaced hazard forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardPrediction {
    pub kind: HazardKind,
    /// Probability the hazard materializes (0-1)
    pub probability: f64,
    pub severity: Severity,
    /// Forecast horizon (minutes; 0 = immediate)
    pub timeframe_minutes: u32,
    pub message: String,
    pub recommendation: String,
}

/// All surfaced hazards plus the aggregated risk view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardForecast {
    /// Surfaced hazards, sorted descending by probability
    pub hazards: Vec<HazardPrediction>,
    /// Severity-weighted mean probability (0-100)
    pub overall_risk: f64,
    pub risk_level: RiskLevel,
}

/// Independent per-hazard forecaster.
#[derive(Debug, Clone, Default)]
pub struct HazardEngine {
    cfg: HazardConfig,
}

impl HazardEngine {
    pub fn new(cfg: HazardConfig) -> Self {
        Self { cfg }
    }

    /// Evaluate all six hazards and aggregate the surfaced ones.
    ///
    /// `recent_incidents` is the count from the incident feed for this area;
    /// pass 0 when the feed is unavailable.
    pub fn forecast(
        &self,
        weather: &WeatherSnapshot,
        traffic: &TrafficSnapshot,
        vehicle: Option<&VehicleSnapshot>,
        recent_incidents: u32,
    ) -> HazardForecast {
        let mut hazards: Vec<HazardPrediction> = [
            self.hydroplaning(weather, vehicle),
            self.fog(weather),
            self.sudden_congestion(traffic, recent_incidents),
            self.temperature_drop(weather),
            self.unsafe_speed(weather, traffic, vehicle),
            self.wind_hazard(weather),
        ]
        .into_iter()
        .flatten()
        .collect();

        hazards.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let overall_risk = self.overall_risk(&hazards);
        let risk_level = level_for(overall_risk);

        HazardForecast {
            hazards,
            overall_risk,
            risk_level,
        }
    }

    /// Hydroplaning: rain rate plus speed above 60 km/h, with a highway bonus.
    fn hydroplaning(
        &self,
        weather: &WeatherSnapshot,
        vehicle: Option<&VehicleSnapshot>,
    ) -> Option<HazardPrediction> {
        let mut probability = 0.0;

        if weather.rain_rate_mm_hr > 0.0 {
            probability += (weather.rain_rate_mm_hr / 20.0).min(0.6);
        }
        let speeding = vehicle.is_some_and(|v| v.speed_kmh > 60.0);
        if let Some(v) = vehicle {
            if v.speed_kmh > 60.0 {
                probability += ((v.speed_kmh - 60.0) / 100.0).min(0.4);
            }
            if v.road_type == Some(RoadType::Highway) {
                probability += 0.1;
            }
        }
        let probability = probability.min(1.0);

        if probability <= self.cfg.default_inclusion {
            return None;
        }

        let severity = if probability > 0.7 {
            Severity::Critical
        } else if probability > 0.5 {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(HazardPrediction {
            kind: HazardKind::Hydroplaning,
            probability,
            severity,
            timeframe_minutes: 5,
            message: format!("Hydroplaning risk: {:.0}%", probability * 100.0),
            recommendation: if speeding {
                "Reduce speed below 60 km/h".to_string()
            } else {
                "Watch for standing water".to_string()
            },
        })
    }

    /// Fog: visibility deficit plus humidity and temperature contributions.
    fn fog(&self, weather: &WeatherSnapshot) -> Option<HazardPrediction> {
        let mut probability = 0.0;

        if weather.visibility_m < 1000.0 {
            probability = 1.0 - weather.visibility_m / 1000.0;
        }
        if weather.humidity_percent > 80.0 {
            probability += 0.2;
        }
        if weather.temperature_c > 0.0 && weather.temperature_c < 15.0 {
            probability += 0.1;
        }
        let probability = probability.min(1.0);

        if probability <= self.cfg.default_inclusion {
            return None;
        }

        let severity = if weather.visibility_m < 100.0 {
            Severity::Critical
        } else if weather.visibility_m < 200.0 {
            Severity::High
        } else if weather.visibility_m < 500.0 {
            Severity::Medium
        } else {
            Severity::Low
        };

        Some(HazardPrediction {
            kind: HazardKind::Fog,
            probability,
            severity,
            timeframe_minutes: 15,
            message: format!(
                "Fog risk: {:.0}% — visibility {:.0} m",
                probability * 100.0,
                weather.visibility_m
            ),
            recommendation: if weather.visibility_m < 200.0 {
                "Reduce speed and switch on headlights".to_string()
            } else {
                "Watch for dropping visibility".to_string()
            },
        })
    }

    /// Sudden congestion: established congestion, low speed, and incident history.
    fn sudden_congestion(
        &self,
        traffic: &TrafficSnapshot,
        recent_incidents: u32,
    ) -> Option<HazardPrediction> {
        let mut probability = 0.0;

        if traffic.congestion_index > 70.0 {
            probability += 0.4;
        }
        if traffic.avg_speed_kmh < 30.0 {
            probability += 0.3;
        }
        if recent_incidents > 0 {
            probability += (f64::from(recent_incidents) / 10.0).min(0.3);
        }
        let probability = probability.min(1.0);

        if probability <= self.cfg.congestion_inclusion {
            return None;
        }

        let severity = if traffic.congestion_index > 85.0 {
            Severity::Critical
        } else if traffic.congestion_index > 70.0 {
            Severity::High
        } else if traffic.congestion_index > 50.0 {
            Severity::Medium
        } else {
            Severity::Low
        };

        Some(HazardPrediction {
            kind: HazardKind::SuddenCongestion,
            probability,
            severity,
            timeframe_minutes: 10,
            message: format!("Sudden congestion risk: {:.0}%", probability * 100.0),
            recommendation: "Consider an alternative route".to_string(),
        })
    }

    /// Temperature drop: cold bands, forced critical for freezing rain.
    fn temperature_drop(&self, weather: &WeatherSnapshot) -> Option<HazardPrediction> {
        let mut probability: f64 = if weather.temperature_c < 5.0 {
            0.6
        } else if weather.temperature_c < 10.0 {
            0.3
        } else {
            0.0
        };

        let mut severity = Severity::Low;
        let icing = weather.precipitation_mm > 0.0 && weather.temperature_c < 3.0;
        if icing {
            probability += 0.3;
            severity = Severity::Critical;
        }
        let probability = probability.min(1.0);

        if probability <= self.cfg.default_inclusion {
            return None;
        }

        Some(HazardPrediction {
            kind: HazardKind::TemperatureDrop,
            probability,
            severity,
            timeframe_minutes: 30,
            message: format!(
                "Temperature drop expected — currently {:.1} °C",
                weather.temperature_c
            ),
            recommendation: if weather.temperature_c < 3.0 {
                "Watch for road ice — winter tires advised".to_string()
            } else {
                "Watch for falling temperatures".to_string()
            },
        })
    }

    /// Unsafe speed: vehicle speed against the shared safe-speed formula.
    /// Vehicle-only; without telemetry there is nothing to evaluate.
    fn unsafe_speed(
        &self,
        weather: &WeatherSnapshot,
        traffic: &TrafficSnapshot,
        vehicle: Option<&VehicleSnapshot>,
    ) -> Option<HazardPrediction> {
        let vehicle = vehicle?;

        let safe = safe_speed(weather, traffic, &self.cfg);
        let probability = if vehicle.speed_kmh > safe {
            ((vehicle.speed_kmh - safe) / safe).min(1.0)
        } else {
            0.0
        };

        if probability <= self.cfg.speed_inclusion {
            return None;
        }

        let speed_diff = vehicle.speed_kmh - safe;
        let severity = if speed_diff > 30.0 {
            Severity::Critical
        } else if speed_diff > 20.0 {
            Severity::High
        } else if speed_diff > 10.0 {
            Severity::Medium
        } else {
            Severity::Low
        };

        Some(HazardPrediction {
            kind: HazardKind::UnsafeSpeed,
            probability,
            severity,
            timeframe_minutes: 0,
            message: format!(
                "Speed unsafe for conditions — current {:.0} km/h, advised {:.0} km/h",
                vehicle.speed_kmh, safe
            ),
            recommendation: format!("Reduce speed to {safe:.0} km/h"),
        })
    }

    /// Wind hazard: sustained wind bands.
    fn wind_hazard(&self, weather: &WeatherSnapshot) -> Option<HazardPrediction> {
        let (probability, severity) = if weather.wind_speed_kmh > 50.0 {
            (0.8, Severity::Critical)
        } else if weather.wind_speed_kmh > 40.0 {
            (0.6, Severity::High)
        } else if weather.wind_speed_kmh > 30.0 {
            (0.4, Severity::Medium)
        } else {
            (0.0, Severity::Low)
        };

        if probability <= self.cfg.default_inclusion {
            return None;
        }

        Some(HazardPrediction {
            kind: HazardKind::WindHazard,
            probability,
            severity,
            timeframe_minutes: 15,
            message: format!("Strong wind: {:.0} km/h", weather.wind_speed_kmh),
            recommendation: if weather.wind_speed_kmh > 40.0 {
                "Reduce speed — high-sided vehicles especially".to_string()
            } else {
                "Watch for gusts affecting steering".to_string()
            },
        })
    }

    /// Severity-weighted mean probability over the surfaced hazards, 0-100.
    fn overall_risk(&self, hazards: &[HazardPrediction]) -> f64 {
        if hazards.is_empty() {
            return 0.0;
        }

        let weighted_sum: f64 = hazards
            .iter()
            .map(|h| {
                let weight = match h.severity {
                    Severity::Critical => self.cfg.critical_severity_weight,
                    Severity::High => self.cfg.high_severity_weight,
                    Severity::Medium => self.cfg.medium_severity_weight,
                    Severity::Low => self.cfg.low_severity_weight,
                };
                h.probability * weight * 100.0
            })
            .sum();

        (weighted_sum / hazards.len() as f64).min(100.0)
    }
}

/// Safe speed for the current weather and traffic (km/h).
///
/// Starts at the configured base, deducts for rain and wind, caps by
/// visibility band, caps at `avg_speed + 10` in heavy congestion, and never
/// drops below the configured floor. This single formula backs both the
/// unsafe-speed hazard and the driving cascade's slow-down rule.
pub fn safe_speed(weather: &WeatherSnapshot, traffic: &TrafficSnapshot, cfg: &HazardConfig) -> f64 {
    let mut safe = cfg.base_safe_speed_kmh;

    if weather.rain_rate_mm_hr > 10.0 {
        safe -= 30.0;
    } else if weather.rain_rate_mm_hr > 5.0 {
        safe -= 20.0;
    }

    if weather.visibility_m < 100.0 {
        safe = 30.0;
    } else if weather.visibility_m < 200.0 {
        safe = safe.min(50.0);
    } else if weather.visibility_m < 500.0 {
        safe = safe.min(70.0);
    }

    if weather.wind_speed_kmh > 40.0 {
        safe -= 20.0;
    } else if weather.wind_speed_kmh > 30.0 {
        safe -= 10.0;
    }

    if traffic.congestion_index > 70.0 {
        safe = safe.min(traffic.avg_speed_kmh + 10.0);
    }

    safe.max(cfg.min_safe_speed_kmh)
}

/// Risk level bands over the aggregated hazard score (same bands as the risk
/// engine: 80 critical, 60 high, 30 medium).
fn level_for(score: f64) -> RiskLevel {
    if score >= 80.0 {
        RiskLevel::Critical
    } else if score >= 60.0 {
        RiskLevel::High
    } else if score >= 30.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(speed: f64, road: Option<RoadType>) -> VehicleSnapshot {
        VehicleSnapshot {
            speed_kmh: speed,
            heading_deg: 0.0,
            road_type: road,
        }
    }

    #[test]
    fn test_calm_conditions_surface_nothing() {
        let engine = HazardEngine::default();
        let forecast = engine.forecast(
            &WeatherSnapshot::default(),
            &TrafficSnapshot::default(),
            None,
            0,
        );
        assert!(forecast.hazards.is_empty());
        assert_eq!(forecast.overall_risk, 0.0);
        assert_eq!(forecast.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_hydroplaning_needs_rain_or_speed() {
        let engine = HazardEngine::default();
        let rain = WeatherSnapshot { rain_rate_mm_hr: 12.0, ..WeatherSnapshot::default() };
        let v = vehicle(110.0, Some(RoadType::Highway));

        let forecast = engine.forecast(&rain, &TrafficSnapshot::default(), Some(&v), 0);
        let hydro = forecast
            .hazards
            .iter()
            .find(|h| h.kind == HazardKind::Hydroplaning)
            .unwrap_or_else(|| panic!("heavy rain at speed must surface hydroplaning"));
        // 12/20 = 0.6 rain + 0.4 speed (capped) + 0.1 highway = 1.0 (capped)
        assert!((hydro.probability - 1.0).abs() < 1e-9);
        assert_eq!(hydro.severity, Severity::Critical);
        assert_eq!(hydro.timeframe_minutes, 5);
    }

    #[test]
    fn test_fog_severity_follows_visibility() {
        let engine = HazardEngine::default();
        let cases = [(80.0, Severity::Critical), (150.0, Severity::High), (400.0, Severity::Medium)];
        for (visibility, expected) in cases {
            let weather = WeatherSnapshot {
                visibility_m: visibility,
                humidity_percent: 85.0,
                ..WeatherSnapshot::default()
            };
            let forecast = engine.forecast(&weather, &TrafficSnapshot::default(), None, 0);
            let fog = forecast
                .hazards
                .iter()
                .find(|h| h.kind == HazardKind::Fog)
                .unwrap_or_else(|| panic!("visibility {visibility} must surface fog"));
            assert_eq!(fog.severity, expected, "visibility {visibility}");
        }
    }

    #[test]
    fn test_sudden_congestion_inclusion_threshold() {
        let engine = HazardEngine::default();

        // Congestion alone: 0.4 — not above the 0.4 inclusion bar
        let moderate = TrafficSnapshot {
            congestion_index: 75.0,
            avg_speed_kmh: 40.0,
            density_per_km: 30.0,
        };
        let forecast =
            engine.forecast(&WeatherSnapshot::default(), &moderate, None, 0);
        assert!(forecast.hazards.iter().all(|h| h.kind != HazardKind::SuddenCongestion));

        // Add low speed: 0.7 — surfaced
        let jammed = TrafficSnapshot { avg_speed_kmh: 20.0, ..moderate };
        let forecast = engine.forecast(&WeatherSnapshot::default(), &jammed, None, 0);
        let hazard = forecast
            .hazards
            .iter()
            .find(|h| h.kind == HazardKind::SuddenCongestion)
            .unwrap_or_else(|| panic!("jammed traffic must surface sudden congestion"));
        assert!((hazard.probability - 0.7).abs() < 1e-9);
        assert_eq!(hazard.severity, Severity::High);
    }

    #[test]
    fn test_freezing_rain_forces_critical_temperature_drop() {
        let engine = HazardEngine::default();
        let icy = WeatherSnapshot {
            temperature_c: 1.0,
            precipitation_mm: 2.0,
            ..WeatherSnapshot::default()
        };
        let forecast = engine.forecast(&icy, &TrafficSnapshot::default(), None, 0);
        let drop = forecast
            .hazards
            .iter()
            .find(|h| h.kind == HazardKind::TemperatureDrop)
            .unwrap_or_else(|| panic!("freezing rain must surface a temperature drop"));
        assert_eq!(drop.severity, Severity::Critical);
        assert!((drop.probability - 0.9).abs() < 1e-9);
        assert_eq!(drop.timeframe_minutes, 30);

        // Cold but dry: surfaced at 0.6 with low severity
        let cold = WeatherSnapshot { temperature_c: 2.0, ..WeatherSnapshot::default() };
        let forecast = engine.forecast(&cold, &TrafficSnapshot::default(), None, 0);
        let drop = forecast
            .hazards
            .iter()
            .find(|h| h.kind == HazardKind::TemperatureDrop)
            .unwrap_or_else(|| panic!("cold weather must surface a temperature drop"));
        assert_eq!(drop.severity, Severity::Low);
    }

    #[test]
    fn test_unsafe_speed_is_vehicle_only() {
        let engine = HazardEngine::default();
        let storm = WeatherSnapshot {
            rain_rate_mm_hr: 15.0,
            visibility_m: 150.0,
            ..WeatherSnapshot::default()
        };

        let without_vehicle = engine.forecast(&storm, &TrafficSnapshot::default(), None, 0);
        assert!(without_vehicle.hazards.iter().all(|h| h.kind != HazardKind::UnsafeSpeed));

        // Safe speed here: rain caps to 70, visibility <200 caps to 50
        let v = vehicle(110.0, None);
        let with_vehicle = engine.forecast(&storm, &TrafficSnapshot::default(), Some(&v), 0);
        let unsafe_speed = with_vehicle
            .hazards
            .iter()
            .find(|h| h.kind == HazardKind::UnsafeSpeed)
            .unwrap_or_else(|| panic!("110 km/h in a storm must surface unsafe speed"));
        // (110 − 50) / 50 = 1.2 → capped at 1.0; diff 60 → critical
        assert!((unsafe_speed.probability - 1.0).abs() < 1e-9);
        assert_eq!(unsafe_speed.severity, Severity::Critical);
        assert_eq!(unsafe_speed.timeframe_minutes, 0);
    }

    #[test]
    fn test_wind_bands() {
        let engine = HazardEngine::default();
        let cases = [
            (55.0, Some((0.8, Severity::Critical))),
            (45.0, Some((0.6, Severity::High))),
            (35.0, Some((0.4, Severity::Medium))),
            (25.0, None),
        ];
        for (wind, expected) in cases {
            let weather = WeatherSnapshot { wind_speed_kmh: wind, ..WeatherSnapshot::default() };
            let forecast = engine.forecast(&weather, &TrafficSnapshot::default(), None, 0);
            let hazard = forecast.hazards.iter().find(|h| h.kind == HazardKind::WindHazard);
            match expected {
                Some((probability, severity)) => {
                    let h = hazard.unwrap_or_else(|| panic!("wind {wind} must surface"));
                    assert!((h.probability - probability).abs() < 1e-9);
                    assert_eq!(h.severity, severity);
                }
                None => assert!(hazard.is_none(), "wind {wind} must stay below inclusion"),
            }
        }
    }

    #[test]
    fn test_output_sorted_by_probability() {
        let engine = HazardEngine::default();
        let messy = WeatherSnapshot {
            rain_rate_mm_hr: 8.0,
            wind_speed_kmh: 45.0,
            visibility_m: 300.0,
            humidity_percent: 85.0,
            temperature_c: 8.0,
            ..WeatherSnapshot::default()
        };
        let forecast = engine.forecast(&messy, &TrafficSnapshot::default(), None, 0);
        assert!(forecast.hazards.len() >= 2);
        for pair in forecast.hazards.windows(2) {
            assert!(pair[0].probability >= pair[1].probability);
        }
    }

    #[test]
    fn test_overall_risk_weighted_mean() {
        let engine = HazardEngine::default();
        let windy = WeatherSnapshot { wind_speed_kmh: 55.0, ..WeatherSnapshot::default() };
        let forecast = engine.forecast(&windy, &TrafficSnapshot::default(), None, 0);
        // Single critical hazard at 0.8 → 0.8 × 1.0 × 100 = 80 → critical level
        assert_eq!(forecast.hazards.len(), 1);
        assert!((forecast.overall_risk - 80.0).abs() < 1e-9);
        assert_eq!(forecast.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_safe_speed_formula() {
        let cfg = HazardConfig::default();
        let calm = WeatherSnapshot::default();
        let free = TrafficSnapshot::default();
        assert_eq!(safe_speed(&calm, &free, &cfg), 100.0);

        // Heavy rain: −30
        let rain = WeatherSnapshot { rain_rate_mm_hr: 12.0, ..calm.clone() };
        assert_eq!(safe_speed(&rain, &free, &cfg), 70.0);

        // Dense fog overrides to 30
        let fog = WeatherSnapshot { visibility_m: 80.0, ..calm.clone() };
        assert_eq!(safe_speed(&fog, &free, &cfg), 30.0);

        // Heavy congestion caps at avg + 10
        let jam = TrafficSnapshot {
            congestion_index: 80.0,
            avg_speed_kmh: 25.0,
            density_per_km: 60.0,
        };
        assert_eq!(safe_speed(&calm, &jam, &cfg), 35.0);

        // Floor at 30 even when everything stacks
        let awful = WeatherSnapshot {
            rain_rate_mm_hr: 20.0,
            wind_speed_kmh: 60.0,
            visibility_m: 150.0,
            ..calm
        };
        assert_eq!(safe_speed(&awful, &free, &cfg), 30.0);
    }
}
