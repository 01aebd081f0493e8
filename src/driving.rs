//! Driving Decision Engine
//!
//! An ordered, first-match-wins cascade over the trip context. The ordering
//! is deliberate: the most severe actions are checked first, so a stop
//! condition short-circuits every later rule. Re-evaluated on every new
//! snapshot.
//!
//! 1. **Stop** — conditions unsafe to drive at all
//! 2. **Reroute** — the current route is the problem
//! 3. **Delay** — conditions improve if departure waits
//! 4. **Slow down** — speed is the only problem
//! 5. **Continue** — nothing to act on

use crate::config::{DrivingConfig, HazardConfig};
use crate::hazards::{safe_speed, HazardForecast};
use crate::risk::{RiskAssessment, RiskLevel};
use crate::types::{InputError, Priority, RouteInfo, Severity, TrafficSnapshot, VehicleSnapshot, WeatherSnapshot};
use serde::{Deserialize, Serialize};

/// The action the cascade settles on. Exactly one per evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrivingAction {
    Continue,
    SlowDown,
    Reroute,
    Delay,
    Stop,
}

impl std::fmt::Display for DrivingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrivingAction::Continue => write!(f, "continue"),
            DrivingAction::SlowDown => write!(f, "slow_down"),
            DrivingAction::Reroute => write!(f, "reroute"),
            DrivingAction::Delay => write!(f, "delay"),
            DrivingAction::Stop => write!(f, "stop"),
        }
    }
}

/// Action-specific payload. Only the fields relevant to the chosen action
/// are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrivingDetails {
    /// Advised speed for slow-down decisions (km/h)
    pub suggested_speed_kmh: Option<f64>,
    /// Rough alternative-route estimate for reroute decisions
    pub alternative_route: Option<RouteInfo>,
    /// Wait time for delay decisions (minutes)
    pub delay_minutes: Option<u32>,
    /// Which condition forced a stop
    pub stop_reason: Option<String>,
}

/// The cascade's verdict for one evaluation tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivingDecision {
    pub action: DrivingAction,
    /// Decision confidence (0-1)
    pub confidence: f64,
    pub reason: String,
    pub details: DrivingDetails,
    pub priority: Priority,
}

/// Full trip context for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct DrivingContext<'a> {
    pub weather: &'a WeatherSnapshot,
    pub traffic: &'a TrafficSnapshot,
    pub vehicle: Option<&'a VehicleSnapshot>,
    pub route: RouteInfo,
    pub risk: &'a RiskAssessment,
    pub hazards: &'a HazardForecast,
}

/// Severity-first driving decision cascade.
#[derive(Debug, Clone, Default)]
pub struct DrivingDecisionEngine {
    cfg: DrivingConfig,
    hazard_cfg: HazardConfig,
}

impl DrivingDecisionEngine {
    pub fn new(cfg: DrivingConfig, hazard_cfg: HazardConfig) -> Self {
        Self { cfg, hazard_cfg }
    }

    /// Run the cascade. Fails fast only on structurally invalid route data.
    pub fn decide(&self, ctx: &DrivingContext<'_>) -> Result<DrivingDecision, InputError> {
        ctx.route.validate()?;

        if let Some(stop_reason) = self.stop_reason(ctx) {
            return Ok(DrivingDecision {
                action: DrivingAction::Stop,
                confidence: 0.95,
                reason: "Conditions are too dangerous to drive".to_string(),
                details: DrivingDetails {
                    stop_reason: Some(stop_reason),
                    ..DrivingDetails::default()
                },
                priority: Priority::Critical,
            });
        }

        if self.should_reroute(ctx) {
            return Ok(DrivingDecision {
                action: DrivingAction::Reroute,
                confidence: 0.85,
                reason: "An alternative route is safer than the current one".to_string(),
                details: DrivingDetails {
                    // Rough estimate: longer but faster than riding out the risk
                    alternative_route: Some(RouteInfo {
                        distance_km: ctx.route.distance_km * 1.2,
                        duration_minutes: ctx.route.duration_minutes * 0.9,
                    }),
                    ..DrivingDetails::default()
                },
                priority: Priority::High,
            });
        }

        if self.should_delay(ctx) {
            let delay_minutes = self.delay_minutes(ctx.hazards);
            return Ok(DrivingDecision {
                action: DrivingAction::Delay,
                confidence: 0.7,
                reason: format!("Waiting {delay_minutes} minutes avoids the forecast conditions"),
                details: DrivingDetails {
                    delay_minutes: Some(delay_minutes),
                    ..DrivingDetails::default()
                },
                priority: Priority::Medium,
            });
        }

        if let Some(suggested) = self.slow_down_target(ctx) {
            return Ok(DrivingDecision {
                action: DrivingAction::SlowDown,
                confidence: 0.8,
                reason: "Current speed exceeds what conditions support".to_string(),
                details: DrivingDetails {
                    suggested_speed_kmh: Some(suggested),
                    ..DrivingDetails::default()
                },
                priority: Priority::Medium,
            });
        }

        Ok(DrivingDecision {
            action: DrivingAction::Continue,
            confidence: 0.9,
            reason: "Driving conditions are safe".to_string(),
            details: DrivingDetails::default(),
            priority: Priority::Low,
        })
    }

    /// Rule 1: any single condition that makes driving unsafe outright.
    fn stop_reason(&self, ctx: &DrivingContext<'_>) -> Option<String> {
        if ctx.weather.visibility_m < self.cfg.stop_visibility_m {
            return Some("visibility below the safe minimum".to_string());
        }
        if ctx.risk.risk_level == RiskLevel::Critical && ctx.risk.risk_score > self.cfg.stop_risk_score {
            return Some("critical composite risk".to_string());
        }
        let critical_hazard = ctx.hazards.hazards.iter().any(|h| {
            h.severity == Severity::Critical && h.probability > self.cfg.stop_hazard_probability
        });
        if critical_hazard {
            return Some("near-certain critical hazard".to_string());
        }
        if ctx.weather.rain_rate_mm_hr > self.cfg.stop_rain_rate {
            return Some("extreme rainfall".to_string());
        }
        if ctx.weather.wind_speed_kmh > self.cfg.stop_wind_kmh {
            return Some("extreme wind".to_string());
        }
        None
    }

    /// Rule 2: the route itself carries the risk.
    fn should_reroute(&self, ctx: &DrivingContext<'_>) -> bool {
        if matches!(ctx.risk.risk_level, RiskLevel::High | RiskLevel::Critical) {
            return true;
        }
        if ctx.traffic.congestion_index > self.cfg.reroute_congestion_index {
            return true;
        }
        let elevated = ctx
            .hazards
            .hazards
            .iter()
            .filter(|h| {
                matches!(h.severity, Severity::High | Severity::Critical)
                    && h.probability > self.cfg.reroute_hazard_probability
            })
            .count();
        elevated >= self.cfg.reroute_hazard_count
    }

    /// Rule 3: medium risk plus a near-term severe forecast — waiting helps.
    fn should_delay(&self, ctx: &DrivingContext<'_>) -> bool {
        if ctx.risk.risk_level != RiskLevel::Medium {
            return false;
        }
        ctx.hazards.hazards.iter().any(|h| {
            h.timeframe_minutes <= self.cfg.delay_window_minutes
                && h.probability > self.cfg.delay_hazard_probability
                && h.severity == Severity::High
        })
    }

    /// Wait long enough for the worst severe hazard to pass, plus a buffer.
    fn delay_minutes(&self, hazards: &HazardForecast) -> u32 {
        hazards
            .hazards
            .iter()
            .filter(|h| matches!(h.severity, Severity::High | Severity::Critical))
            .map(|h| h.timeframe_minutes)
            .max()
            .map_or(self.cfg.default_delay_minutes, |worst| {
                worst + self.cfg.delay_buffer_minutes
            })
    }

    /// Rule 4: speed against the shared safe-speed formula with tolerance.
    fn slow_down_target(&self, ctx: &DrivingContext<'_>) -> Option<f64> {
        let vehicle = ctx.vehicle?;
        let safe = safe_speed(ctx.weather, ctx.traffic, &self.hazard_cfg);
        if vehicle.speed_kmh > safe * self.cfg.slowdown_tolerance {
            Some(safe)
        } else {
            None
        }
    }
}
