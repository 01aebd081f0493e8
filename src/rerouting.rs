//! Contextual Rerouting Engine
//!
//! Decides whether the current route should be abandoned — not only for
//! congestion, but for weather, incidents, and composite risk. Reasons are
//! non-exclusive and accumulate; the decision's priority is the maximum over
//! every contributing cause, with critical incidents and critical risk
//! forcing the top band.

use crate::config::ReroutingConfig;
use crate::risk::{RiskAssessment, RiskLevel};
use crate::types::{Incident, Priority, RouteInfo, Severity, TrafficSnapshot, WeatherSnapshot};
use serde::{Deserialize, Serialize};

/// Why the route should change. Accumulated, never exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RerouteReason {
    HeavyRain,
    LowVisibility,
    StrongWind,
    ExtremeTemperature,
    DustStorm,
    SevereCongestion,
    CriticalIncidents { count: usize },
    CriticalRisk,
}

impl std::fmt::Display for RerouteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RerouteReason::HeavyRain => write!(f, "heavy rain"),
            RerouteReason::LowVisibility => write!(f, "low visibility"),
            RerouteReason::StrongWind => write!(f, "strong wind"),
            RerouteReason::ExtremeTemperature => write!(f, "extreme temperature"),
            RerouteReason::DustStorm => write!(f, "dust storm"),
            RerouteReason::SevereCongestion => write!(f, "severe congestion"),
            RerouteReason::CriticalIncidents { count } => {
                write!(f, "{count} critical incident(s) on route")
            }
            RerouteReason::CriticalRisk => write!(f, "critical risk on route"),
        }
    }
}

/// The rerouting verdict for one evaluation tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReroutingDecision {
    pub should_reroute: bool,
    pub reasons: Vec<RerouteReason>,
    pub priority: Priority,
    /// Filled by the routing layer once an actual alternative is computed
    pub alternative_route: Option<RouteInfo>,
}

impl ReroutingDecision {
    /// Driver-facing summary of the decision.
    pub fn message(&self) -> String {
        if !self.should_reroute {
            return "Current route is safe".to_string();
        }
        let reasons: Vec<String> = self.reasons.iter().map(ToString::to_string).collect();
        format!("Route changed due to: {}", reasons.join(", "))
    }
}

/// Context-aware rerouting decision engine.
#[derive(Debug, Clone, Default)]
pub struct ReroutingEngine {
    cfg: ReroutingConfig,
}

impl ReroutingEngine {
    pub fn new(cfg: ReroutingConfig) -> Self {
        Self { cfg }
    }

    /// Accumulate every reroute reason present in the context.
    ///
    /// `risk` is optional: the engine also serves callers that only have
    /// weather/traffic context.
    pub fn decide(
        &self,
        weather: &WeatherSnapshot,
        traffic: &TrafficSnapshot,
        incidents: &[Incident],
        risk: Option<&RiskAssessment>,
    ) -> ReroutingDecision {
        let mut reasons = Vec::new();
        let mut priority = Priority::Low;

        let weather_reasons = self.weather_reasons(weather);
        if !weather_reasons.is_empty() {
            reasons.extend(weather_reasons);
            priority = priority.max(self.weather_priority(weather));
        }

        if traffic.congestion_index > self.cfg.congestion_floor {
            reasons.push(RerouteReason::SevereCongestion);
            if traffic.congestion_index > self.cfg.congestion_high {
                priority = priority.max(Priority::High);
            }
        }

        let critical_incidents = incidents
            .iter()
            .filter(|i| matches!(i.severity, Severity::Critical | Severity::High))
            .count();
        if critical_incidents > 0 {
            reasons.push(RerouteReason::CriticalIncidents { count: critical_incidents });
            priority = Priority::Critical;
        }

        if risk.is_some_and(|r| r.risk_level == RiskLevel::Critical) {
            reasons.push(RerouteReason::CriticalRisk);
            priority = Priority::Critical;
        }

        ReroutingDecision {
            should_reroute: !reasons.is_empty(),
            reasons,
            priority,
            alternative_route: None,
        }
    }

    fn weather_reasons(&self, weather: &WeatherSnapshot) -> Vec<RerouteReason> {
        let mut reasons = Vec::new();

        if weather.rain_rate_mm_hr > self.cfg.heavy_rain_rate {
            reasons.push(RerouteReason::HeavyRain);
        }
        if weather.visibility_m < self.cfg.low_visibility_m {
            reasons.push(RerouteReason::LowVisibility);
        }
        if weather.wind_speed_kmh > self.cfg.strong_wind_kmh {
            reasons.push(RerouteReason::StrongWind);
        }
        if weather.temperature_c > self.cfg.heat_limit_c
            || weather.temperature_c < self.cfg.frost_limit_c
        {
            reasons.push(RerouteReason::ExtremeTemperature);
        }
        if weather.condition.is_dust_event() {
            reasons.push(RerouteReason::DustStorm);
        }

        reasons
    }

    /// Band the weather severity into a priority.
    fn weather_priority(&self, weather: &WeatherSnapshot) -> Priority {
        if weather.visibility_m < self.cfg.critical_visibility_m
            || weather.rain_rate_mm_hr > self.cfg.critical_rain_rate
            || weather.wind_speed_kmh > self.cfg.critical_wind_kmh
        {
            Priority::Critical
        } else if weather.visibility_m < self.cfg.low_visibility_m
            || weather.rain_rate_mm_hr > self.cfg.heavy_rain_rate
            || weather.wind_speed_kmh > self.cfg.strong_wind_kmh
        {
            Priority::High
        } else if weather.visibility_m < self.cfg.medium_visibility_m
            || weather.rain_rate_mm_hr > self.cfg.medium_rain_rate
        {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoPoint, IncidentKind, WeatherCondition};

    fn incident(severity: Severity) -> Incident {
        Incident {
            kind: IncidentKind::Accident,
            severity,
            location: GeoPoint::default(),
        }
    }

    #[test]
    fn test_clear_context_stays_on_route() {
        let engine = ReroutingEngine::default();
        let decision = engine.decide(
            &WeatherSnapshot::default(),
            &TrafficSnapshot::default(),
            &[],
            None,
        );
        assert!(!decision.should_reroute);
        assert!(decision.reasons.is_empty());
        assert_eq!(decision.priority, Priority::Low);
        assert_eq!(decision.message(), "Current route is safe");
    }

    #[test]
    fn test_weather_reasons_accumulate() {
        let engine = ReroutingEngine::default();
        let storm = WeatherSnapshot {
            rain_rate_mm_hr: 15.0,
            visibility_m: 150.0,
            wind_speed_kmh: 45.0,
            ..WeatherSnapshot::default()
        };
        let decision = engine.decide(&storm, &TrafficSnapshot::default(), &[], None);
        assert!(decision.should_reroute);
        assert!(decision.reasons.contains(&RerouteReason::HeavyRain));
        assert!(decision.reasons.contains(&RerouteReason::LowVisibility));
        assert!(decision.reasons.contains(&RerouteReason::StrongWind));
        assert_eq!(decision.priority, Priority::High);
    }

    #[test]
    fn test_extreme_weather_is_critical_priority() {
        let engine = ReroutingEngine::default();
        let whiteout = WeatherSnapshot { visibility_m: 80.0, ..WeatherSnapshot::default() };
        let decision = engine.decide(&whiteout, &TrafficSnapshot::default(), &[], None);
        assert_eq!(decision.priority, Priority::Critical);
    }

    #[test]
    fn test_dust_storm_reason() {
        let engine = ReroutingEngine::default();
        let dusty = WeatherSnapshot {
            condition: WeatherCondition::Sandstorm,
            visibility_m: 400.0,
            ..WeatherSnapshot::default()
        };
        let decision = engine.decide(&dusty, &TrafficSnapshot::default(), &[], None);
        assert!(decision.reasons.contains(&RerouteReason::DustStorm));
        assert!(!decision.reasons.contains(&RerouteReason::LowVisibility));
        assert_eq!(decision.priority, Priority::Medium);
    }

    #[test]
    fn test_congestion_reason_and_priority() {
        let engine = ReroutingEngine::default();
        let jammed = TrafficSnapshot {
            congestion_index: 92.0,
            avg_speed_kmh: 8.0,
            density_per_km: 80.0,
        };
        let decision = engine.decide(&WeatherSnapshot::default(), &jammed, &[], None);
        assert!(decision.reasons.contains(&RerouteReason::SevereCongestion));
        assert_eq!(decision.priority, Priority::High);

        // 85: reroute-worthy but not high priority on its own
        let busy = TrafficSnapshot { congestion_index: 85.0, ..jammed };
        let decision = engine.decide(&WeatherSnapshot::default(), &busy, &[], None);
        assert!(decision.should_reroute);
        assert_eq!(decision.priority, Priority::Low);
    }

    #[test]
    fn test_critical_incident_forces_critical_priority() {
        let engine = ReroutingEngine::default();
        let incidents = vec![incident(Severity::Low), incident(Severity::High)];
        let decision = engine.decide(
            &WeatherSnapshot::default(),
            &TrafficSnapshot::default(),
            &incidents,
            None,
        );
        assert!(decision.should_reroute);
        assert!(decision
            .reasons
            .contains(&RerouteReason::CriticalIncidents { count: 1 }));
        assert_eq!(decision.priority, Priority::Critical);
    }

    #[test]
    fn test_critical_risk_forces_critical_priority() {
        use crate::risk::{RiskEngine, RiskLevel};
        let engine = ReroutingEngine::default();

        // Build a genuinely critical assessment through the risk engine
        let weather = WeatherSnapshot {
            visibility_m: 30.0,
            rain_rate_mm_hr: 25.0,
            wind_speed_kmh: 55.0,
            condition: WeatherCondition::Storm,
            ..WeatherSnapshot::default()
        };
        let traffic = TrafficSnapshot {
            congestion_index: 95.0,
            avg_speed_kmh: 5.0,
            density_per_km: 90.0,
        };
        let assessment = RiskEngine::default().assess(&weather, &traffic, None);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);

        let decision = engine.decide(
            &WeatherSnapshot::default(),
            &TrafficSnapshot::default(),
            &[],
            Some(&assessment),
        );
        assert!(decision.reasons.contains(&RerouteReason::CriticalRisk));
        assert_eq!(decision.priority, Priority::Critical);

        // Priority escalation is monotone: weather medium + critical risk = critical
        let drizzle = WeatherSnapshot { rain_rate_mm_hr: 7.0, ..WeatherSnapshot::default() };
        let decision = engine.decide(&drizzle, &TrafficSnapshot::default(), &[], Some(&assessment));
        assert_eq!(decision.priority, Priority::Critical);
        assert!(decision.reasons.len() >= 2);
    }

    #[test]
    fn test_message_lists_reasons() {
        let engine = ReroutingEngine::default();
        let storm = WeatherSnapshot { rain_rate_mm_hr: 15.0, ..WeatherSnapshot::default() };
        let decision = engine.decide(&storm, &TrafficSnapshot::default(), &[], None);
        let message = decision.message();
        assert!(message.contains("heavy rain"));
    }
}
