//! Synthetic scenario generation
//!
//! Seeded generators for tests, demos, and bench harnesses. Device batches
//! get per-device scatter from a normal distribution; episodes tell a story
//! in phases (free flow → build-up → breakdown → recovery) so downstream
//! stages see realistic transitions rather than steps.

use crate::types::{DeviceSample, GeoPoint, WeatherCondition, WeatherSnapshot};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// One tick's worth of raw input for a segment.
#[derive(Debug, Clone)]
pub struct TickBatch {
    pub timestamp: DateTime<Utc>,
    pub devices: Vec<DeviceSample>,
}

/// Fixed base instant for generated traces (2024-01-18 08:00 UTC).
fn base_time() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_705_564_800)
}

/// A batch of device samples scattered around a segment center.
///
/// Speeds draw from a normal distribution (σ = 12% of the mean, floored at
/// zero); positions jitter inside roughly a segment-sized box.
pub fn device_batch(
    rng: &mut StdRng,
    center: GeoPoint,
    count: usize,
    mean_speed_kmh: f64,
    timestamp: DateTime<Utc>,
) -> Vec<DeviceSample> {
    let sigma = (mean_speed_kmh * 0.12).max(0.5);
    // Degenerate parameters (non-finite mean) fall back to zero scatter
    let speed_dist = Normal::new(mean_speed_kmh, sigma).ok();

    (0..count)
        .map(|_| DeviceSample {
            lat: center.lat + rng.gen_range(-0.005..0.005),
            lng: center.lng + rng.gen_range(-0.005..0.005),
            speed_kmh: speed_dist
                .as_ref()
                .map_or(mean_speed_kmh, |d| d.sample(rng))
                .max(0.0),
            timestamp,
        })
        .collect()
}

/// A four-phase congestion episode on one segment, one batch per minute.
///
/// | Phase | Ticks | Devices | Mean speed |
/// |---|---|---|---|
/// | free flow | 10 | 40 | 65 km/h |
/// | build-up | 8 | 55 | 45 → 28 km/h |
/// | breakdown | 6 | 70 | 12 km/h |
/// | recovery | 6 | 45 | 50 km/h |
pub fn congestion_episode(seed: u64, center: GeoPoint) -> Vec<TickBatch> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut batches = Vec::new();
    let mut tick = 0i64;

    let mut push = |rng: &mut StdRng, tick: &mut i64, count: usize, speed: f64| {
        let timestamp = base_time() + Duration::minutes(*tick);
        batches.push(TickBatch {
            timestamp,
            devices: device_batch(rng, center, count, speed, timestamp),
        });
        *tick += 1;
    };

    for _ in 0..10 {
        push(&mut rng, &mut tick, 40, 65.0);
    }
    for i in 0..8 {
        // Speed decays as the queue builds
        let speed = 45.0 - f64::from(i) * 2.4;
        push(&mut rng, &mut tick, 55, speed);
    }
    for _ in 0..6 {
        push(&mut rng, &mut tick, 70, 12.0);
    }
    for _ in 0..6 {
        push(&mut rng, &mut tick, 45, 50.0);
    }

    batches
}

/// A deteriorating weather sequence: clear skies into a storm front.
///
/// Returns `ticks` snapshots a minute apart, rain and wind ramping up while
/// visibility collapses. Useful for driving the trip pipeline end to end.
pub fn storm_front(seed: u64, ticks: usize) -> Vec<WeatherSnapshot> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..ticks)
        .map(|i| {
            let progress = i as f64 / ticks.max(1) as f64;
            let rain = progress * 35.0 + rng.gen_range(-1.0..1.0);
            WeatherSnapshot {
                temperature_c: 22.0 - progress * 6.0,
                humidity_percent: 50.0 + progress * 40.0,
                wind_speed_kmh: 12.0 + progress * 45.0,
                wind_direction_deg: rng.gen_range(0.0..360.0),
                visibility_m: (9_000.0 - progress * 8_700.0).max(150.0),
                pressure_hpa: 1012.0 - progress * 14.0,
                precipitation_mm: progress * 20.0,
                rain_rate_mm_hr: rain.max(0.0),
                cloud_cover_percent: (30.0 + progress * 70.0).min(100.0),
                condition: if progress > 0.7 {
                    WeatherCondition::Storm
                } else if progress > 0.4 {
                    WeatherCondition::HeavyRain
                } else if progress > 0.15 {
                    WeatherCondition::Rain
                } else {
                    WeatherCondition::Cloudy
                },
                observed_at: base_time() + Duration::minutes(i as i64),
            }
        })
        .collect()
}
