//! Infrastructure Pipeline Regression Tests
//!
//! Exercises the full segment pipeline — anonymization gate, traffic
//! analysis, bottleneck detection, prediction, decisions, signals — over a
//! generated congestion episode. Asserts on data integrity (no NaN, all
//! indexes in range), on the breakdown phase being detected, and on the
//! ranked outputs staying ordered.

use chrono::{DateTime, Utc};
use viaflow::config::PipelineConfig;
use viaflow::prediction::PredictionEngine;
use viaflow::scenario::{congestion_episode, TickBatch};
use viaflow::types::{GeoPoint, Severity};
use viaflow::{anonymization, bottleneck, congestion, decision, signals, SegmentHistory};

const SEGMENT_ID: &str = "riyadh-k1";
const SEGMENT_LENGTH_KM: f64 = 2.0;
const FREE_FLOW_KMH: f64 = 60.0;

struct PipelineStats {
    ticks_processed: usize,
    readings_accepted: usize,
    bottlenecks_detected: usize,
    worst_severity: Option<Severity>,
    decisions_generated: usize,
    recommendations_generated: usize,
    has_nan: bool,
}

/// Run the whole segment pipeline over an episode, collecting stats.
fn run_pipeline(episode: &[TickBatch], config: &PipelineConfig) -> PipelineStats {
    let prediction_engine = PredictionEngine::new(config.prediction.clone());
    let mut history = SegmentHistory::default();

    let mut stats = PipelineStats {
        ticks_processed: 0,
        readings_accepted: 0,
        bottlenecks_detected: 0,
        worst_severity: None,
        decisions_generated: 0,
        recommendations_generated: 0,
        has_nan: false,
    };

    for batch in episode {
        stats.ticks_processed += 1;

        let reading = anonymization::anonymize(
            SEGMENT_ID,
            &batch.devices,
            SEGMENT_LENGTH_KM,
            batch.timestamp,
            &config.privacy,
        )
        .expect("valid segment length");

        let Some(reading) = reading else {
            continue;
        };
        stats.readings_accepted += 1;

        let analysis = congestion::analyze(&reading, Some(FREE_FLOW_KMH), &config.congestion);
        if analysis.congestion_index.is_nan() || analysis.delay_minutes.is_nan() {
            stats.has_nan = true;
        }
        assert!(
            (0.0..=100.0).contains(&analysis.congestion_index),
            "congestion index {} out of range",
            analysis.congestion_index
        );
        assert!(analysis.delay_minutes >= 0.0);

        let detected = bottleneck::detect(
            &analysis,
            history.latest(),
            GeoPoint::new(24.7136, 46.6753),
            &config.bottleneck,
        );
        if let Some(ref b) = detected {
            stats.bottlenecks_detected += 1;
            stats.worst_severity = Some(stats.worst_severity.map_or(b.severity, |w| w.max(b.severity)));
            assert!(b.speed_drop_ratio >= config.bottleneck.speed_drop_floor);
            assert!(b.affected_segments.contains(SEGMENT_ID));
        }

        let history_entries = history.as_slice();
        let predictions =
            prediction_engine.predict_all(&analysis, &history_entries, batch.timestamp);
        assert_eq!(predictions.len(), 4, "exactly one prediction per horizon");
        for p in &predictions {
            assert!((0.0..=100.0).contains(&p.predicted_index));
            assert!((0.5..=1.0).contains(&p.confidence));
            if p.predicted_index.is_nan() || p.predicted_delay_minutes.is_nan() {
                stats.has_nan = true;
            }
        }

        let decisions = decision::generate(
            &analysis,
            detected.as_ref(),
            &predictions,
            batch.timestamp,
            &config.decision,
        );
        stats.decisions_generated += decisions.len();
        for pair in decisions.windows(2) {
            assert!(
                pair[0].expected_benefit_score >= pair[1].expected_benefit_score,
                "decisions must rank descending by benefit"
            );
        }

        let recommendations =
            signals::generate(&analysis, &predictions, batch.timestamp, &config.signal);
        stats.recommendations_generated += recommendations.len();
        for rec in &recommendations {
            assert!(
                signals::validate(rec, &config.signal).is_ok(),
                "generated timing must pass the safety gate: green {} cycle {}",
                rec.green_time_seconds,
                rec.cycle_time_seconds
            );
        }

        history.push(analysis);
    }

    stats
}

#[test]
fn pipeline_full_episode_no_panic_no_nan() {
    let config = PipelineConfig::default();
    let episode = congestion_episode(42, GeoPoint::new(24.7136, 46.6753));

    let stats = run_pipeline(&episode, &config);

    eprintln!(
        "episode: {} ticks, {} readings, {} bottlenecks, {} decisions, {} signal recs",
        stats.ticks_processed,
        stats.readings_accepted,
        stats.bottlenecks_detected,
        stats.decisions_generated,
        stats.recommendations_generated
    );

    assert_eq!(stats.ticks_processed, 30);
    // Every generated batch clears both privacy floors (≥ 40 devices on 2 km)
    assert_eq!(stats.readings_accepted, 30);
    assert!(!stats.has_nan, "no NaN may appear anywhere in the pipeline");
}

#[test]
fn pipeline_detects_the_breakdown() {
    let config = PipelineConfig::default();
    let episode = congestion_episode(42, GeoPoint::new(24.7136, 46.6753));

    let stats = run_pipeline(&episode, &config);

    assert!(
        stats.bottlenecks_detected >= 1,
        "the build-up → breakdown transition must register a bottleneck"
    );
    let worst = stats.worst_severity.expect("at least one bottleneck");
    assert!(
        worst >= Severity::High,
        "the breakdown speed collapse must rank at least HIGH, got {worst}"
    );
}

#[test]
fn pipeline_produces_operator_actions_during_breakdown() {
    let config = PipelineConfig::default();
    let episode = congestion_episode(42, GeoPoint::new(24.7136, 46.6753));

    let stats = run_pipeline(&episode, &config);

    assert!(
        stats.decisions_generated >= 1,
        "a jammed segment must generate at least one traffic decision"
    );
    assert!(
        stats.recommendations_generated >= 1,
        "established congestion must generate signal recommendations"
    );
}

#[test]
fn pipeline_is_deterministic_for_a_seed() {
    let config = PipelineConfig::default();
    let a = run_pipeline(&congestion_episode(7, GeoPoint::new(24.7, 46.7)), &config);
    let b = run_pipeline(&congestion_episode(7, GeoPoint::new(24.7, 46.7)), &config);

    assert_eq!(a.readings_accepted, b.readings_accepted);
    assert_eq!(a.bottlenecks_detected, b.bottlenecks_detected);
    assert_eq!(a.decisions_generated, b.decisions_generated);
    assert_eq!(a.recommendations_generated, b.recommendations_generated);
}

#[test]
fn starved_segment_produces_no_reading_and_no_downstream_output() {
    let config = PipelineConfig::default();

    // 12 devices: below the k-anonymity floor regardless of density
    let mut rng_batch = congestion_episode(3, GeoPoint::new(24.7, 46.7));
    let batch = rng_batch.remove(0);
    let few: Vec<_> = batch.devices.into_iter().take(12).collect();

    let reading = anonymization::anonymize(
        SEGMENT_ID,
        &few,
        SEGMENT_LENGTH_KM,
        DateTime::<Utc>::UNIX_EPOCH,
        &config.privacy,
    )
    .expect("valid segment length");

    assert!(reading.is_none(), "below-floor batches must vanish entirely");
}
