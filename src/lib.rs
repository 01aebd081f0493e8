//! Viaflow: Privacy-Preserving Traffic Intelligence
//!
//! Library core for road-segment congestion intelligence and per-trip driver
//! advisories. Two independent pipelines share primitives but never call into
//! each other:
//!
//! ## Infrastructure pipeline (per road segment)
//!
//! - **Anonymization Gate**: k-anonymous aggregation of raw device batches
//! - **Traffic Analyzer**: congestion index and delay estimation
//! - **Bottleneck Detector**: speed-drop origins with backward extent
//! - **Prediction Engine**: 5/10/30/60-minute forecasts, model per horizon
//! - **Decision Engine / Signal Recommender**: ranked operator actions
//!
//! ## Driver pipeline (per navigating vehicle)
//!
//! - **Risk Engine**: weighted multi-factor trip risk
//! - **Hazard Engine**: six independent hazard forecasts
//! - **Driving Decision Engine**: severity-first action cascade
//! - **Rerouting Engine**: context-aware route abandonment
//!
//! Every component is a pure, synchronous function over caller-supplied
//! inputs: no I/O, no shared mutable state, safe to evaluate any number of
//! segments or vehicles concurrently. The host service owns transport,
//! persistence, scheduling, and presentation.

pub mod alerts;
pub mod anonymization;
pub mod bottleneck;
pub mod config;
pub mod congestion;
pub mod decision;
pub mod driving;
pub mod hazards;
pub mod history;
pub mod prediction;
pub mod rerouting;
pub mod risk;
pub mod routing;
pub mod scenario;
pub mod signals;
pub mod types;

// Re-export the pipeline configuration
pub use config::{ConfigError, PipelineConfig};

// Re-export shared data contracts
pub use types::{
    AlertSeverity, CongestionLevel, DeviceSample, GeoPoint, Incident, IncidentKind, InputError,
    Priority, RoadType, RouteInfo, Severity, TrafficSnapshot, VehicleSnapshot, WeatherAlert,
    WeatherCondition, WeatherSnapshot,
};

// Re-export the infrastructure pipeline stages
pub use anonymization::{anonymize, AnonymizedSegmentReading};
pub use bottleneck::{AdjacentSegment, Bottleneck};
pub use congestion::TrafficAnalysis;
pub use decision::{DecisionKind, TrafficDecision};
pub use history::SegmentHistory;
pub use prediction::{MlPredictor, ModelType, Prediction, PredictionEngine, Trend};
pub use signals::{SignalPriority, SignalRecommendation, SignalViolation};

// Re-export the driver pipeline engines
pub use driving::{DrivingAction, DrivingContext, DrivingDecision, DrivingDecisionEngine};
pub use hazards::{HazardEngine, HazardForecast, HazardKind, HazardPrediction};
pub use rerouting::{RerouteReason, ReroutingDecision, ReroutingEngine};
pub use risk::{RecommendedAction, RiskAssessment, RiskEngine, RiskFactor, RiskLevel};

// Re-export the severe-conditions and routing helpers
pub use alerts::{SevereAlert, SevereAlertKind};
pub use routing::PlannedRoute;
