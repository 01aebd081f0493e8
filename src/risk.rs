//! Risk Engine
//!
//! Scores trip risk from four independent sub-factors — weather, traffic,
//! visibility, and vehicle speed — each on a 0-100 scale with documented
//! thresholds, then combines them with fixed weights. Visibility carries the
//! highest weight; compounding hazards (two or more elevated factors) are
//! penalized beyond the weighted sum.
//!
//! Missing context degrades confidence, never correctness: no vehicle data
//! and missing visibility each deduct from confidence with a documented
//! floor.

use crate::config::RiskConfig;
use crate::types::{RoadType, TrafficSnapshot, VehicleSnapshot, WeatherSnapshot};
use serde::{Deserialize, Serialize};

/// Risk level band over the combined score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Driver-facing action the assessment recommends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Continue,
    Caution,
    SlowDown,
    Reroute,
    Stop,
}

/// One of the four sub-factors composing the risk score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskFactor {
    Weather,
    Traffic,
    Visibility,
    Speed,
}

impl RiskFactor {
    /// Human-readable description of the factor as a risk source.
    pub fn describe(&self) -> &'static str {
        match self {
            RiskFactor::Weather => "adverse weather conditions",
            RiskFactor::Traffic => "traffic congestion",
            RiskFactor::Visibility => "reduced visibility",
            RiskFactor::Speed => "unsuitable speed",
        }
    }
}

/// The four sub-scores plus the weighted combination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskFactorScores {
    pub weather: f64,
    pub traffic: f64,
    pub visibility: f64,
    pub speed: f64,
    pub combined: f64,
}

/// Narrative context attached to an assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDetails {
    /// The dominant risk source
    pub primary_risk: String,
    /// Elevated but non-dominant risk sources
    pub secondary_risks: Vec<String>,
    /// Mitigation guidance keyed to the elevated factors
    pub mitigation: Vec<String>,
}

/// Composite risk assessment for one evaluation tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Combined risk score (0-100, whole number)
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    /// Dominant sub-factor
    pub risk_category: RiskFactor,
    pub recommended_action: RecommendedAction,
    /// Assessment confidence (0.5-1.0)
    pub confidence: f64,
    pub factors: RiskFactorScores,
    pub details: RiskDetails,
}

/// Weighted multi-factor risk scorer.
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    cfg: RiskConfig,
}

impl RiskEngine {
    pub fn new(cfg: RiskConfig) -> Self {
        Self { cfg }
    }

    /// Assess trip risk from the current context.
    pub fn assess(
        &self,
        weather: &WeatherSnapshot,
        traffic: &TrafficSnapshot,
        vehicle: Option<&VehicleSnapshot>,
    ) -> RiskAssessment {
        let weather_risk = self.weather_risk(weather);
        let traffic_risk = self.traffic_risk(traffic);
        let visibility_risk = visibility_risk(weather.visibility_m);
        let speed_risk = speed_risk(vehicle, traffic);

        let combined = self.combine(weather_risk, traffic_risk, visibility_risk, speed_risk);
        let risk_level = self.level(combined);
        let recommended_action = self.action(combined, risk_level);
        let risk_category =
            dominant_factor(weather_risk, traffic_risk, visibility_risk, speed_risk);
        let confidence = self.confidence(weather, vehicle);
        let details = self.details(
            weather_risk,
            traffic_risk,
            visibility_risk,
            speed_risk,
            risk_category,
            vehicle.is_some(),
        );

        RiskAssessment {
            risk_score: combined.round(),
            risk_level,
            risk_category,
            recommended_action,
            confidence,
            factors: RiskFactorScores {
                weather: weather_risk,
                traffic: traffic_risk,
                visibility: visibility_risk,
                speed: speed_risk,
                combined,
            },
            details,
        }
    }

    /// Weather sub-score: rain rate (≤40) + wind (≤20) + temperature
    /// extremes (flat 15) + condition label points, capped at 100.
    fn weather_risk(&self, weather: &WeatherSnapshot) -> f64 {
        let mut risk = 0.0;

        if weather.rain_rate_mm_hr > 0.0 {
            risk += (weather.rain_rate_mm_hr * 2.0).min(40.0);
        }
        if weather.wind_speed_kmh > 30.0 {
            risk += ((weather.wind_speed_kmh - 30.0) * 0.5).min(20.0);
        }
        if weather.temperature_c > 45.0 || weather.temperature_c < 0.0 {
            risk += 15.0;
        }
        risk += weather.condition.base_risk_points();

        risk.min(100.0)
    }

    /// Traffic sub-score: congestion (≤50) + low-speed bands + excess
    /// density (≤20), capped at 100.
    fn traffic_risk(&self, traffic: &TrafficSnapshot) -> f64 {
        let mut risk = traffic.congestion_index * 0.5;

        if traffic.avg_speed_kmh < 20.0 {
            risk += 30.0;
        } else if traffic.avg_speed_kmh < 40.0 {
            risk += 15.0;
        }
        if traffic.density_per_km > 50.0 {
            risk += ((traffic.density_per_km - 50.0) * 0.5).min(20.0);
        }

        risk.min(100.0)
    }

    /// Weighted combination with a compounding penalty when two or more
    /// sub-scores are elevated.
    fn combine(&self, weather: f64, traffic: f64, visibility: f64, speed: f64) -> f64 {
        let combined = weather * self.cfg.weather_weight
            + traffic * self.cfg.traffic_weight
            + visibility * self.cfg.visibility_weight
            + speed * self.cfg.speed_weight;

        let elevated = [weather, traffic, visibility, speed]
            .iter()
            .filter(|&&score| score > self.cfg.compound_floor)
            .count();

        if elevated >= self.cfg.compound_count {
            (combined * self.cfg.compound_multiplier).min(100.0)
        } else {
            combined.min(100.0)
        }
    }

    fn level(&self, score: f64) -> RiskLevel {
        if score >= self.cfg.critical_score {
            RiskLevel::Critical
        } else if score >= self.cfg.high_score {
            RiskLevel::High
        } else if score >= self.cfg.medium_score {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    fn action(&self, score: f64, level: RiskLevel) -> RecommendedAction {
        match level {
            RiskLevel::Critical => {
                if score > self.cfg.stop_score {
                    RecommendedAction::Stop
                } else {
                    RecommendedAction::Reroute
                }
            }
            RiskLevel::High => RecommendedAction::Reroute,
            RiskLevel::Medium => RecommendedAction::SlowDown,
            RiskLevel::Low => {
                if score > self.cfg.caution_score {
                    RecommendedAction::Caution
                } else {
                    RecommendedAction::Continue
                }
            }
        }
    }

    /// Confidence starts at 1.0 and degrades for missing context.
    fn confidence(&self, weather: &WeatherSnapshot, vehicle: Option<&VehicleSnapshot>) -> f64 {
        let mut confidence = 1.0;

        if vehicle.is_none() {
            confidence -= self.cfg.missing_vehicle_penalty;
        }
        if weather.visibility_m <= 0.0 || !weather.visibility_m.is_finite() {
            confidence -= self.cfg.missing_visibility_penalty;
        }

        confidence.max(self.cfg.confidence_floor)
    }

    fn details(
        &self,
        weather: f64,
        traffic: f64,
        visibility: f64,
        speed: f64,
        category: RiskFactor,
        has_vehicle: bool,
    ) -> RiskDetails {
        let scores = [
            (RiskFactor::Weather, weather),
            (RiskFactor::Traffic, traffic),
            (RiskFactor::Visibility, visibility),
            (RiskFactor::Speed, speed),
        ];
        let max_score = scores
            .iter()
            .map(|(_, s)| *s)
            .fold(0.0_f64, f64::max);

        let secondary_risks = scores
            .iter()
            .filter(|(_, score)| *score > self.cfg.secondary_floor && *score < max_score)
            .map(|(factor, _)| factor.describe().to_string())
            .collect();

        let mut mitigation = Vec::new();
        if visibility > self.cfg.mitigation_floor {
            mitigation.push("Reduce speed for the reduced visibility".to_string());
            mitigation.push("Switch on headlights".to_string());
        }
        if weather > self.cfg.mitigation_floor {
            mitigation.push("Watch for slick road surfaces".to_string());
            mitigation.push("Increase following distance".to_string());
        }
        if traffic > self.cfg.mitigation_floor {
            mitigation.push("Consider an alternative route".to_string());
        }
        if speed > self.cfg.mitigation_floor && has_vehicle {
            mitigation.push("Reduce speed to match conditions".to_string());
        }

        RiskDetails {
            primary_risk: category.describe().to_string(),
            secondary_risks,
            mitigation,
        }
    }
}

/// Visibility sub-score: a step function over visibility in meters.
fn visibility_risk(visibility_m: f64) -> f64 {
    if visibility_m >= 1000.0 {
        0.0
    } else if visibility_m >= 500.0 {
        20.0
    } else if visibility_m >= 200.0 {
        40.0
    } else if visibility_m >= 100.0 {
        60.0
    } else if visibility_m >= 50.0 {
        80.0
    } else {
        100.0
    }
}

/// Speed sub-score: relative to traffic flow, absolute bands, and a slow-on-
/// highway penalty. No vehicle → 0 (the confidence deduction covers it).
fn speed_risk(vehicle: Option<&VehicleSnapshot>, traffic: &TrafficSnapshot) -> f64 {
    let Some(vehicle) = vehicle else {
        return 0.0;
    };

    let mut risk: f64 = 0.0;

    let speed_diff = vehicle.speed_kmh - traffic.avg_speed_kmh;
    if speed_diff > 20.0 {
        risk += 30.0;
    } else if speed_diff < -20.0 {
        risk += 20.0;
    }

    if vehicle.speed_kmh > 120.0 {
        risk += 40.0;
    } else if vehicle.speed_kmh > 100.0 {
        risk += 20.0;
    }

    if vehicle.road_type == Some(RoadType::Highway) && vehicle.speed_kmh < 60.0 {
        risk += 15.0;
    }

    risk.min(100.0)
}

/// Dominant sub-factor; ties resolve visibility > weather > traffic > speed.
fn dominant_factor(weather: f64, traffic: f64, visibility: f64, speed: f64) -> RiskFactor {
    let max_score = weather.max(traffic).max(visibility).max(speed);

    if visibility >= max_score {
        RiskFactor::Visibility
    } else if weather >= max_score {
        RiskFactor::Weather
    } else if traffic >= max_score {
        RiskFactor::Traffic
    } else {
        RiskFactor::Speed
    }
}
