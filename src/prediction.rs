//! Prediction Engine
//!
//! Produces one congestion prediction per horizon (5, 10, 30, 60 minutes),
//! choosing the model by horizon:
//!
//! - ≤ 10 min: **temporal** — extrapolates the trend of the recent history
//! - 10–30 min: **ml** — additive feature blend behind the swappable
//!   [`MlPredictor`] seam, so a trained model can replace the fixed linear
//!   placeholder without touching the horizon dispatch
//! - > 30 min: **seasonal** — scales the current index by the rush-hour factor
//!
//! A segment with no history degrades to a stable trend — expected for the
//! first sample, not exceptional.

use crate::config::PredictionConfig;
use crate::congestion::{round1, TrafficAnalysis};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// The four prediction horizons, in minutes.
pub const HORIZONS_MINUTES: [i64; 4] = [5, 10, 30, 60];

/// Which model family produced a prediction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Temporal,
    Ml,
    Seasonal,
}

/// Direction of the recent congestion trend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    #[default]
    Stable,
}

/// Inputs that contributed to a prediction, reported for transparency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionFactors {
    /// Congestion index at prediction time
    pub current_congestion: f64,
    /// Mean congestion index over the supplied history
    pub historical_pattern: f64,
    /// Time-of-day multiplier (rush hours raise it)
    pub time_of_day_factor: f64,
    /// Day-of-week multiplier (weekends lower it)
    pub day_of_week_factor: f64,
    pub trend: Trend,
}

/// A congestion forecast for one segment at one horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub segment_id: String,
    pub predicted_at: DateTime<Utc>,
    pub predicted_for: DateTime<Utc>,
    pub horizon_minutes: i64,
    /// Forecast congestion index (0-100)
    pub predicted_index: f64,
    /// Forecast delay (minutes, 0.1 resolution)
    pub predicted_delay_minutes: f64,
    /// Model confidence (0.5-1.0)
    pub confidence: f64,
    pub model: ModelType,
    pub seasonality_factor: f64,
    pub factors: PredictionFactors,
}

// ============================================================================
// Pluggable mid-horizon predictor
// ============================================================================

/// One weighted feature handed to the mid-horizon predictor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Feature {
    pub value: f64,
    pub weight: f64,
}

/// Strategy seam for the mid-horizon ("ml") model.
///
/// Receives the extracted features and returns an index adjustment that is
/// added to the current congestion index. The default [`LinearBlend`] is a
/// fixed placeholder; a trained model drops in behind this trait.
pub trait MlPredictor: Send + Sync {
    fn predict(&self, features: &[Feature]) -> f64;
}

/// Fixed linear placeholder: the weighted sum of the features.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBlend;

impl MlPredictor for LinearBlend {
    fn predict(&self, features: &[Feature]) -> f64 {
        features.iter().map(|f| f.weight * f.value).sum()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Multi-horizon prediction engine.
pub struct PredictionEngine {
    cfg: PredictionConfig,
    predictor: Box<dyn MlPredictor>,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(PredictionConfig::default())
    }
}

impl PredictionEngine {
    /// Engine with the fixed linear placeholder as the mid-horizon model.
    pub fn new(cfg: PredictionConfig) -> Self {
        Self {
            cfg,
            predictor: Box::new(LinearBlend),
        }
    }

    /// Engine with a caller-supplied mid-horizon model.
    pub fn with_predictor(cfg: PredictionConfig, predictor: Box<dyn MlPredictor>) -> Self {
        Self { cfg, predictor }
    }

    /// Produce exactly one prediction per horizon.
    ///
    /// `history` is the caller-owned chronological sequence of past analyses
    /// for this segment; it is read, never retained.
    pub fn predict_all(
        &self,
        current: &TrafficAnalysis,
        history: &[TrafficAnalysis],
        now: DateTime<Utc>,
    ) -> Vec<Prediction> {
        HORIZONS_MINUTES
            .iter()
            .map(|&horizon| self.predict_horizon(current, history, horizon, now))
            .collect()
    }

    fn predict_horizon(
        &self,
        current: &TrafficAnalysis,
        history: &[TrafficAnalysis],
        horizon: i64,
        now: DateTime<Utc>,
    ) -> Prediction {
        if horizon <= 10 {
            self.temporal(current, history, horizon, now)
        } else if horizon <= 30 {
            self.ml(current, history, horizon, now)
        } else {
            self.seasonal(current, history, horizon, now)
        }
    }

    /// Short-horizon model: extrapolate the recent trend.
    fn temporal(
        &self,
        current: &TrafficAnalysis,
        history: &[TrafficAnalysis],
        horizon: i64,
        now: DateTime<Utc>,
    ) -> Prediction {
        let trend = self.trend(history);
        let horizon_f = horizon as f64;

        let predicted_index = match trend {
            Trend::Rising => {
                let increase_rate = horizon_f / 10.0;
                (current.congestion_index + increase_rate * 10.0).min(100.0)
            }
            Trend::Falling => {
                let decrease_rate = horizon_f / 15.0;
                (current.congestion_index - decrease_rate * 5.0).max(0.0)
            }
            Trend::Stable => current.congestion_index,
        }
        .round()
        .clamp(0.0, 100.0);

        let confidence = (self.cfg.temporal_base_confidence - horizon_f / 100.0)
            .clamp(self.cfg.confidence_floor, 1.0);

        self.build(
            current,
            history,
            horizon,
            now,
            predicted_index,
            self.cfg.temporal_reference_minutes,
            confidence,
            ModelType::Temporal,
            1.0,
            trend,
        )
    }

    /// Mid-horizon model: feature blend behind the predictor seam.
    fn ml(
        &self,
        current: &TrafficAnalysis,
        history: &[TrafficAnalysis],
        horizon: i64,
        now: DateTime<Utc>,
    ) -> Prediction {
        let last_historical_index = history
            .last()
            .map_or(self.cfg.default_historical_index, |h| h.congestion_index);

        let features = [
            Feature { value: current.congestion_index, weight: self.cfg.ml_congestion_weight },
            Feature { value: current.density_per_km, weight: self.cfg.ml_density_weight },
            Feature { value: current.avg_speed_kmh, weight: self.cfg.ml_speed_weight },
            Feature { value: last_historical_index, weight: self.cfg.ml_history_weight },
        ];

        let adjustment = self.predictor.predict(&features);
        let predicted_index = (current.congestion_index + adjustment)
            .round()
            .clamp(0.0, 100.0);

        self.build(
            current,
            history,
            horizon,
            now,
            predicted_index,
            self.cfg.ml_reference_minutes,
            self.cfg.ml_confidence,
            ModelType::Ml,
            1.0,
            Trend::Stable,
        )
    }

    /// Long-horizon model: rush-hour seasonality over the current index.
    fn seasonal(
        &self,
        current: &TrafficAnalysis,
        history: &[TrafficAnalysis],
        horizon: i64,
        now: DateTime<Utc>,
    ) -> Prediction {
        let seasonality = if is_rush_hour(now) {
            self.cfg.rush_hour_factor
        } else {
            1.0
        };

        let predicted_index = (current.congestion_index * seasonality)
            .round()
            .clamp(0.0, 100.0);

        self.build(
            current,
            history,
            horizon,
            now,
            predicted_index,
            self.cfg.seasonal_reference_minutes,
            self.cfg.seasonal_confidence,
            ModelType::Seasonal,
            seasonality,
            Trend::Stable,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        current: &TrafficAnalysis,
        history: &[TrafficAnalysis],
        horizon: i64,
        now: DateTime<Utc>,
        predicted_index: f64,
        reference_minutes: f64,
        confidence: f64,
        model: ModelType,
        seasonality_factor: f64,
        trend: Trend,
    ) -> Prediction {
        let predicted_delay = round1(predicted_index / 100.0 * reference_minutes);

        Prediction {
            segment_id: current.segment_id.clone(),
            predicted_at: now,
            predicted_for: now + Duration::minutes(horizon),
            horizon_minutes: horizon,
            predicted_index,
            predicted_delay_minutes: predicted_delay,
            confidence,
            model,
            seasonality_factor,
            factors: PredictionFactors {
                current_congestion: current.congestion_index,
                historical_pattern: self.historical_pattern(history),
                time_of_day_factor: if is_rush_hour(now) { self.cfg.time_of_day_factor } else { 1.0 },
                day_of_week_factor: if is_weekend(now) { self.cfg.weekend_factor } else { 1.0 },
                trend,
            },
        }
    }

    /// Trend over the trailing trend window: rising/falling when the index
    /// moved by more than the configured delta, stable otherwise (including
    /// the no-history case).
    fn trend(&self, history: &[TrafficAnalysis]) -> Trend {
        if history.len() < 2 {
            return Trend::Stable;
        }
        let window_start = history.len().saturating_sub(self.cfg.trend_window);
        let window = &history[window_start..];

        let first = window[0].congestion_index;
        let last = window[window.len() - 1].congestion_index;
        let diff = last - first;

        if diff > self.cfg.trend_delta {
            Trend::Rising
        } else if diff < -self.cfg.trend_delta {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }

    /// Mean congestion index of the supplied history.
    fn historical_pattern(&self, history: &[TrafficAnalysis]) -> f64 {
        if history.is_empty() {
            return self.cfg.default_historical_index;
        }
        history.iter().map(|h| h.congestion_index).mean()
    }
}

/// Morning (7-9) and evening (17-19) rush hours, inclusive.
fn is_rush_hour(time: DateTime<Utc>) -> bool {
    let hour = time.hour();
    (7..=9).contains(&hour) || (17..=19).contains(&hour)
}

fn is_weekend(time: DateTime<Utc>) -> bool {
    matches!(time.weekday(), Weekday::Sat | Weekday::Sun)
}
