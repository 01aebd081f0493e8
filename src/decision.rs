//! Decision Engine
//!
//! Turns an analysis, an optional bottleneck, and the horizon predictions
//! into ranked traffic-management decisions. Rules are non-exclusive — every
//! applicable one fires — and the output is sorted descending by expected
//! benefit so operators can act on the single highest-value item first.
//!
//! `DecisionKind::LaneManagement` is a declared variant with no generation
//! rule yet; it is reserved for lane-control integrations.

use crate::bottleneck::Bottleneck;
use crate::config::DecisionConfig;
use crate::congestion::{round1, TrafficAnalysis};
use crate::prediction::Prediction;
use crate::types::{Priority, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of traffic-management action a decision recommends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Divert traffic away from the affected segments
    Diversion,
    /// Retime the signals feeding the segment
    SignalAdjustment,
    /// Preventive intervention ahead of a predicted jam
    Intervention,
    /// Reserved: lane-control actions (no generation rule)
    LaneManagement,
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionKind::Diversion => write!(f, "diversion"),
            DecisionKind::SignalAdjustment => write!(f, "signal_adjustment"),
            DecisionKind::Intervention => write!(f, "intervention"),
            DecisionKind::LaneManagement => write!(f, "lane_management"),
        }
    }
}

/// Operational details attached to a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionDetails {
    pub description: String,
    pub implementation: String,
    /// Time to put the measure in place (minutes)
    pub rollout_minutes: u32,
}

/// A ranked traffic-management recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficDecision {
    pub segment_id: String,
    pub kind: DecisionKind,
    pub recommended_at: DateTime<Utc>,
    /// Expected delay removed (minutes, 0.1 resolution)
    pub expected_delay_reduction: f64,
    /// Relative benefit used for ranking (0-100)
    pub expected_benefit_score: f64,
    pub affected_segments: BTreeSet<String>,
    pub details: DecisionDetails,
    pub priority: Priority,
}

/// Aggregate impact over a set of decisions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct DecisionImpact {
    /// Sum of expected delay reductions (minutes)
    pub total_delay_reduction: f64,
    /// Mean benefit score
    pub mean_benefit_score: f64,
    /// Count of distinct segments touched by any decision
    pub affected_segment_count: usize,
}

/// Generate all applicable decisions, ranked descending by benefit score.
///
/// Ties keep generation order (the sort is stable), so a diversion outranks a
/// signal adjustment of equal benefit.
pub fn generate(
    analysis: &TrafficAnalysis,
    bottleneck: Option<&Bottleneck>,
    predictions: &[Prediction],
    now: DateTime<Utc>,
    cfg: &DecisionConfig,
) -> Vec<TrafficDecision> {
    let mut decisions = Vec::new();

    // Rule 1: critical congestion — by index or by bottleneck severity
    let critical_bottleneck = bottleneck.is_some_and(|b| b.severity == Severity::Critical);
    if analysis.congestion_index >= cfg.critical_index || critical_bottleneck {
        if let Some(b) = bottleneck {
            decisions.push(diversion(analysis, b, now, cfg));
        }
        decisions.push(signal_adjustment(analysis, now, cfg));
    }

    // Rule 2: a confident high-congestion prediction warrants prevention
    let preventable = predictions.iter().find(|p| {
        p.predicted_index >= cfg.prediction_index_floor
            && p.confidence > cfg.prediction_confidence_floor
    });
    if let Some(prediction) = preventable {
        decisions.push(intervention(analysis, prediction, now, cfg));
    }

    decisions.sort_by(|a, b| {
        b.expected_benefit_score
            .partial_cmp(&a.expected_benefit_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    decisions
}

fn diversion(
    analysis: &TrafficAnalysis,
    bottleneck: &Bottleneck,
    now: DateTime<Utc>,
    cfg: &DecisionConfig,
) -> TrafficDecision {
    let severity_multiplier = match bottleneck.severity {
        Severity::Critical => cfg.critical_severity_multiplier,
        Severity::High => cfg.high_severity_multiplier,
        Severity::Medium => cfg.medium_severity_multiplier,
        Severity::Low => cfg.low_severity_multiplier,
    };
    let reduction = analysis.delay_minutes * cfg.diversion_reduction_factor * severity_multiplier;

    TrafficDecision {
        segment_id: analysis.segment_id.clone(),
        kind: DecisionKind::Diversion,
        recommended_at: now,
        expected_delay_reduction: round1(reduction),
        expected_benefit_score: cfg.diversion_benefit,
        affected_segments: bottleneck.affected_segments.clone(),
        details: DecisionDetails {
            description: format!(
                "Divert traffic around critical congestion on {}",
                analysis.segment_id
            ),
            implementation: "Activate electronic diversion signage".to_string(),
            rollout_minutes: 5,
        },
        priority: Priority::Critical,
    }
}

fn signal_adjustment(
    analysis: &TrafficAnalysis,
    now: DateTime<Utc>,
    cfg: &DecisionConfig,
) -> TrafficDecision {
    // Retiming works best in the mid band; above it the reduction tapers off
    let in_mid_band = analysis.congestion_index >= cfg.signal_mid_floor
        && analysis.congestion_index < cfg.critical_index;
    let factor = if in_mid_band {
        cfg.signal_mid_reduction
    } else {
        cfg.signal_low_reduction
    };

    let mut affected = BTreeSet::new();
    affected.insert(analysis.segment_id.clone());

    TrafficDecision {
        segment_id: analysis.segment_id.clone(),
        kind: DecisionKind::SignalAdjustment,
        recommended_at: now,
        expected_delay_reduction: round1(analysis.delay_minutes * factor),
        expected_benefit_score: cfg.signal_benefit,
        affected_segments: affected,
        details: DecisionDetails {
            description: "Retime signals feeding the congested approach".to_string(),
            implementation: "Extend green time for the congested direction".to_string(),
            rollout_minutes: 2,
        },
        priority: Priority::High,
    }
}

fn intervention(
    analysis: &TrafficAnalysis,
    prediction: &Prediction,
    now: DateTime<Utc>,
    cfg: &DecisionConfig,
) -> TrafficDecision {
    let mut affected = BTreeSet::new();
    affected.insert(analysis.segment_id.clone());

    TrafficDecision {
        segment_id: analysis.segment_id.clone(),
        kind: DecisionKind::Intervention,
        recommended_at: now,
        expected_delay_reduction: round1(
            prediction.predicted_delay_minutes * cfg.intervention_reduction_factor,
        ),
        expected_benefit_score: cfg.intervention_benefit,
        affected_segments: affected,
        details: DecisionDetails {
            description: format!(
                "Preventive intervention ahead of congestion expected in {} minutes",
                prediction.horizon_minutes
            ),
            implementation: "Open alternative lanes and push driver advisories".to_string(),
            rollout_minutes: 10,
        },
        priority: Priority::High,
    }
}

/// The single highest-benefit decision, if any. Ties keep the earlier one.
pub fn best_decision(decisions: &[TrafficDecision]) -> Option<&TrafficDecision> {
    decisions.iter().reduce(|best, current| {
        if current.expected_benefit_score > best.expected_benefit_score {
            current
        } else {
            best
        }
    })
}

/// Aggregate total delay reduction, mean benefit, and distinct segment count.
///
/// An empty list aggregates to zeros.
pub fn aggregate_impact(decisions: &[TrafficDecision]) -> DecisionImpact {
    if decisions.is_empty() {
        return DecisionImpact::default();
    }

    let total_delay_reduction: f64 =
        decisions.iter().map(|d| d.expected_delay_reduction).sum();
    let mean_benefit: f64 = decisions
        .iter()
        .map(|d| d.expected_benefit_score)
        .sum::<f64>()
        / decisions.len() as f64;

    let mut segments = BTreeSet::new();
    for decision in decisions {
        segments.extend(decision.affected_segments.iter().cloned());
    }

    DecisionImpact {
        total_delay_reduction: round1(total_delay_reduction),
        mean_benefit_score: round1(mean_benefit),
        affected_segment_count: segments.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BottleneckConfig, PredictionConfig};
    use crate::prediction::PredictionEngine;
    use crate::types::GeoPoint;

    fn analysis(index: f64, delay: f64) -> TrafficAnalysis {
        TrafficAnalysis {
            segment_id: "seg-1".to_string(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            density_per_km: 40.0,
            avg_speed_kmh: 15.0,
            congestion_index: index,
            delay_minutes: delay,
            movement_direction_deg: 0.0,
            free_flow_speed_kmh: 60.0,
        }
    }

    fn critical_bottleneck() -> Bottleneck {
        let cfg = BottleneckConfig::default();
        let previous = TrafficAnalysis {
            avg_speed_kmh: 60.0,
            ..analysis(20.0, 0.0)
        };
        crate::bottleneck::detect(&analysis(85.0, 10.0), Some(&previous), GeoPoint::default(), &cfg)
            .unwrap_or_else(|| panic!("60 → 15 must be a critical bottleneck"))
    }

    fn confident_prediction(index: f64, confidence: f64) -> Prediction {
        let engine = PredictionEngine::new(PredictionConfig::default());
        let mut p = engine
            .predict_all(&analysis(index, 5.0), &[], DateTime::<Utc>::UNIX_EPOCH)
            .remove(0);
        p.predicted_index = index;
        p.confidence = confidence;
        p.predicted_delay_minutes = 8.0;
        p
    }

    #[test]
    fn test_calm_segment_generates_nothing() {
        let cfg = DecisionConfig::default();
        let decisions = generate(&analysis(30.0, 1.0), None, &[], DateTime::<Utc>::UNIX_EPOCH, &cfg);
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_critical_congestion_without_bottleneck() {
        let cfg = DecisionConfig::default();
        let decisions = generate(&analysis(85.0, 10.0), None, &[], DateTime::<Utc>::UNIX_EPOCH, &cfg);

        // No bottleneck → no diversion, but signals still fire
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].kind, DecisionKind::SignalAdjustment);
        // Index 85 is above the mid band → low factor: 10 × 0.15 = 1.5
        assert_eq!(decisions[0].expected_delay_reduction, 1.5);
    }

    #[test]
    fn test_critical_bottleneck_emits_diversion_first() {
        let cfg = DecisionConfig::default();
        let bottleneck = critical_bottleneck();
        let decisions = generate(
            &analysis(85.0, 10.0),
            Some(&bottleneck),
            &[],
            DateTime::<Utc>::UNIX_EPOCH,
            &cfg,
        );

        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].kind, DecisionKind::Diversion);
        assert_eq!(decisions[0].expected_benefit_score, 85.0);
        // 10 min × 0.4 × 1.5 (critical) = 6.0
        assert_eq!(decisions[0].expected_delay_reduction, 6.0);
        assert_eq!(decisions[1].kind, DecisionKind::SignalAdjustment);
    }

    #[test]
    fn test_mid_band_signal_reduction() {
        let cfg = DecisionConfig::default();
        // Critical rule fires via the bottleneck, index sits in the mid band
        let bottleneck = critical_bottleneck();
        let decisions = generate(
            &analysis(65.0, 10.0),
            Some(&bottleneck),
            &[],
            DateTime::<Utc>::UNIX_EPOCH,
            &cfg,
        );
        let signal = decisions
            .iter()
            .find(|d| d.kind == DecisionKind::SignalAdjustment)
            .unwrap_or_else(|| panic!("signal adjustment must fire"));
        // 10 × 0.3 = 3.0
        assert_eq!(signal.expected_delay_reduction, 3.0);
    }

    #[test]
    fn test_confident_prediction_emits_intervention() {
        let cfg = DecisionConfig::default();
        let prediction = confident_prediction(75.0, 0.8);
        let decisions = generate(
            &analysis(40.0, 2.0),
            None,
            &[prediction],
            DateTime::<Utc>::UNIX_EPOCH,
            &cfg,
        );

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].kind, DecisionKind::Intervention);
        // 8.0 × 0.5 = 4.0
        assert_eq!(decisions[0].expected_delay_reduction, 4.0);
    }

    #[test]
    fn test_unconfident_prediction_is_ignored() {
        let cfg = DecisionConfig::default();
        let prediction = confident_prediction(75.0, 0.6);
        let decisions = generate(
            &analysis(40.0, 2.0),
            None,
            &[prediction],
            DateTime::<Utc>::UNIX_EPOCH,
            &cfg,
        );
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_output_sorted_descending_by_benefit() {
        let cfg = DecisionConfig::default();
        let bottleneck = critical_bottleneck();
        let prediction = confident_prediction(75.0, 0.8);
        let decisions = generate(
            &analysis(85.0, 10.0),
            Some(&bottleneck),
            &[prediction],
            DateTime::<Utc>::UNIX_EPOCH,
            &cfg,
        );

        assert_eq!(decisions.len(), 3);
        for pair in decisions.windows(2) {
            assert!(pair[0].expected_benefit_score >= pair[1].expected_benefit_score);
        }
        // 85 (diversion) > 75 (intervention) > 70 (signals)
        assert_eq!(decisions[0].kind, DecisionKind::Diversion);
        assert_eq!(decisions[1].kind, DecisionKind::Intervention);
        assert_eq!(decisions[2].kind, DecisionKind::SignalAdjustment);

        let best = best_decision(&decisions).unwrap_or_else(|| panic!("non-empty"));
        assert_eq!(best.kind, DecisionKind::Diversion);
    }

    #[test]
    fn test_aggregate_impact() {
        let cfg = DecisionConfig::default();
        let bottleneck = critical_bottleneck();
        let prediction = confident_prediction(75.0, 0.8);
        let decisions = generate(
            &analysis(85.0, 10.0),
            Some(&bottleneck),
            &[prediction],
            DateTime::<Utc>::UNIX_EPOCH,
            &cfg,
        );

        let impact = aggregate_impact(&decisions);
        assert!(impact.total_delay_reduction > 0.0);
        assert!((0.0..=100.0).contains(&impact.mean_benefit_score));
        assert!(impact.affected_segment_count >= 1);

        // Empty input aggregates to zeros, never NaN
        let empty = aggregate_impact(&[]);
        assert_eq!(empty.total_delay_reduction, 0.0);
        assert_eq!(empty.mean_benefit_score, 0.0);
        assert_eq!(empty.affected_segment_count, 0);
    }
}
