//! Adaptive Signal Recommender
//!
//! Produces signal-timing recommendations from the current analysis and the
//! horizon predictions:
//!
//! - **Reactive**: when congestion is already established, extend green time
//!   proportionally to density and congestion.
//! - **Predictive**: when a horizon prediction crosses the threshold, apply a
//!   smaller anticipatory bump ahead of the jam.
//!
//! Timing bounds are a physical safety constraint. [`validate`] is a hard
//! gate: a recommendation outside the bounds must be discarded by the caller,
//! never silently clamped downstream of this module.

use crate::config::SignalConfig;
use crate::congestion::{round1, TrafficAnalysis};
use crate::prediction::Prediction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Actuation priority of a signal recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SignalPriority {
    Normal,
    High,
    Emergency,
}

impl std::fmt::Display for SignalPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalPriority::Normal => write!(f, "NORMAL"),
            SignalPriority::High => write!(f, "HIGH"),
            SignalPriority::Emergency => write!(f, "EMERGENCY"),
        }
    }
}

/// Expected operational impact of applying a recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalImpact {
    /// Delay removed (minutes)
    pub delay_reduction_minutes: f64,
    /// Throughput increase (%)
    pub throughput_increase_percent: f64,
    /// Queue length reduction (%)
    pub queue_reduction_percent: f64,
}

/// A signal-timing recommendation for one approach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecommendation {
    pub segment_id: String,
    pub recommended_at: DateTime<Utc>,
    /// Recommended green phase (whole seconds)
    pub green_time_seconds: f64,
    /// Recommended full cycle (whole seconds)
    pub cycle_time_seconds: f64,
    pub priority: SignalPriority,
    pub expected_impact: SignalImpact,
}

/// Violation of the physical signal-timing bounds.
#[derive(Debug, Error, PartialEq)]
pub enum SignalViolation {
    #[error("green time {green:.0}s is below the minimum {min:.0}s")]
    GreenTooShort { green: f64, min: f64 },
    #[error("green time {green:.0}s exceeds the maximum {max:.0}s")]
    GreenTooLong { green: f64, max: f64 },
    #[error("cycle time {cycle:.0}s cannot cover twice the green time {green:.0}s")]
    CycleTooShort { cycle: f64, green: f64 },
}

/// Generate reactive and predictive recommendations for a segment.
pub fn generate(
    analysis: &TrafficAnalysis,
    predictions: &[Prediction],
    now: DateTime<Utc>,
    cfg: &SignalConfig,
) -> Vec<SignalRecommendation> {
    let mut recommendations = Vec::new();

    if analysis.congestion_index >= cfg.reactive_index_floor {
        recommendations.push(reactive(analysis, now, cfg));
    }

    let upcoming = predictions
        .iter()
        .find(|p| p.predicted_index >= cfg.predictive_index_floor);
    if let Some(prediction) = upcoming {
        recommendations.push(predictive(analysis, prediction, now, cfg));
    }

    recommendations
}

/// Reactive recommendation: extend green for established congestion.
fn reactive(analysis: &TrafficAnalysis, now: DateTime<Utc>, cfg: &SignalConfig) -> SignalRecommendation {
    let density_factor = (analysis.density_per_km / 50.0).min(1.0);
    let congestion_factor = analysis.congestion_index / 100.0;

    let green = (cfg.default_green_seconds
        + density_factor * cfg.density_green_gain
        + congestion_factor * cfg.congestion_green_gain)
        .clamp(cfg.min_green_seconds, cfg.max_green_seconds);
    let cycle = green * 2.0 + cfg.intergreen_seconds;

    let priority = if analysis.congestion_index >= cfg.emergency_index {
        SignalPriority::Emergency
    } else if analysis.congestion_index >= cfg.high_index {
        SignalPriority::High
    } else {
        SignalPriority::Normal
    };

    // Impact scales with how far green is extended past the baseline
    let green_increase = (green - cfg.default_green_seconds) / cfg.default_green_seconds;
    let delay_reduction = analysis.delay_minutes * green_increase * 0.5;
    let throughput = (green_increase * 100.0).min(cfg.throughput_cap_percent);
    let queue = (congestion_factor * green_increase * 100.0).min(cfg.queue_cap_percent);

    SignalRecommendation {
        segment_id: analysis.segment_id.clone(),
        recommended_at: now,
        green_time_seconds: green.round(),
        cycle_time_seconds: cycle.round(),
        priority,
        expected_impact: SignalImpact {
            delay_reduction_minutes: round1(delay_reduction),
            throughput_increase_percent: round1(throughput),
            queue_reduction_percent: round1(queue),
        },
    }
}

/// Predictive recommendation: smaller anticipatory bump before a forecast jam.
fn predictive(
    analysis: &TrafficAnalysis,
    prediction: &Prediction,
    now: DateTime<Utc>,
    cfg: &SignalConfig,
) -> SignalRecommendation {
    let minutes_until = (prediction.predicted_for - now).num_minutes();

    let green = cfg.default_green_seconds
        + (prediction.predicted_index / 100.0) * cfg.predictive_green_gain;

    let priority = if minutes_until <= cfg.predictive_lead_minutes {
        SignalPriority::High
    } else {
        SignalPriority::Normal
    };

    SignalRecommendation {
        segment_id: analysis.segment_id.clone(),
        recommended_at: now,
        green_time_seconds: green.min(cfg.max_green_seconds).round(),
        cycle_time_seconds: (green * 2.0 + cfg.intergreen_seconds).round(),
        priority,
        expected_impact: SignalImpact {
            delay_reduction_minutes: round1(prediction.predicted_delay_minutes * 0.4),
            throughput_increase_percent: 15.0,
            queue_reduction_percent: 25.0,
        },
    }
}

/// Hard safety gate on signal timing.
///
/// Rejects green outside the configured bounds and cycles shorter than twice
/// the green phase. A rejected recommendation must not reach actuation.
pub fn validate(
    recommendation: &SignalRecommendation,
    cfg: &SignalConfig,
) -> Result<(), SignalViolation> {
    let green = recommendation.green_time_seconds;
    let cycle = recommendation.cycle_time_seconds;

    if green < cfg.min_green_seconds {
        return Err(SignalViolation::GreenTooShort { green, min: cfg.min_green_seconds });
    }
    if green > cfg.max_green_seconds {
        return Err(SignalViolation::GreenTooLong { green, max: cfg.max_green_seconds });
    }
    if cycle < green * 2.0 {
        return Err(SignalViolation::CycleTooShort { cycle, green });
    }
    Ok(())
}
