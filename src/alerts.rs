//! Severe-conditions alert classifier
//!
//! Maps a weather snapshot plus any official provider warnings to ranked
//! `SevereAlert` records for the notification layer (which is out of scope —
//! this module only produces the records). Each alert carries impact and
//! recommendation strings and a validity window.

use crate::types::{Severity, WeatherAlert, WeatherSnapshot};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Class of a severe-conditions alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SevereAlertKind {
    Storm,
    HeavyRain,
    ExtremeHeat,
    StrongWind,
    DustStorm,
    OfficialWarning,
}

/// A driver-facing severe-conditions alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SevereAlert {
    pub kind: SevereAlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub impact: Vec<String>,
    pub recommendations: Vec<String>,
    pub valid_until: DateTime<Utc>,
}

/// Classify the current conditions into severe alerts, most severe first.
pub fn check(
    weather: &WeatherSnapshot,
    provider_alerts: &[WeatherAlert],
    now: DateTime<Utc>,
) -> Vec<SevereAlert> {
    let mut alerts = Vec::new();

    // Official warnings pass through with mapped severity
    for alert in provider_alerts {
        let severity = Severity::from(alert.severity);
        alerts.push(SevereAlert {
            kind: SevereAlertKind::OfficialWarning,
            severity,
            title: alert.title.clone(),
            message: alert.description.clone(),
            impact: impact_for(severity),
            recommendations: recommendations_for(severity),
            valid_until: alert.end_time,
        });
    }

    // Convective storms / torrential rain
    if weather.condition.is_storm() || weather.rain_rate_mm_hr > 20.0 {
        let severity = if weather.rain_rate_mm_hr > 30.0 {
            Severity::Critical
        } else {
            Severity::High
        };
        alerts.push(SevereAlert {
            kind: SevereAlertKind::Storm,
            severity,
            title: "Thunderstorm".to_string(),
            message: format!("Heavy rainfall: {:.1} mm/h", weather.rain_rate_mm_hr),
            impact: vec![
                "Reduced visibility".to_string(),
                "Hydroplaning risk".to_string(),
                "Strong gusts".to_string(),
            ],
            recommendations: vec![
                "Pull over somewhere safe".to_string(),
                "Avoid driving in these conditions".to_string(),
            ],
            valid_until: now + Duration::hours(1),
        });
    }

    // Extreme heat
    if weather.temperature_c > 45.0 {
        alerts.push(SevereAlert {
            kind: SevereAlertKind::ExtremeHeat,
            severity: Severity::High,
            title: "Extreme heat".to_string(),
            message: format!("Temperature: {:.1} °C", weather.temperature_c),
            impact: vec![
                "Tire blowout risk".to_string(),
                "Reduced vehicle performance".to_string(),
            ],
            recommendations: vec![
                "Avoid long drives".to_string(),
                "Check tire pressure".to_string(),
            ],
            valid_until: now + Duration::hours(6),
        });
    }

    // Damaging wind
    if weather.wind_speed_kmh > 50.0 {
        alerts.push(SevereAlert {
            kind: SevereAlertKind::StrongWind,
            severity: Severity::Critical,
            title: "Damaging wind".to_string(),
            message: format!("Wind speed: {:.0} km/h", weather.wind_speed_kmh),
            impact: vec![
                "Severe steering interference".to_string(),
                "Dangerous for high-sided vehicles".to_string(),
            ],
            recommendations: vec![
                "Reduce speed".to_string(),
                "Trucks should avoid driving".to_string(),
            ],
            valid_until: now + Duration::hours(2),
        });
    }

    // Airborne dust / sand
    if weather.condition.is_dust_event() {
        let severity = if weather.visibility_m < 200.0 {
            Severity::Critical
        } else {
            Severity::High
        };
        alerts.push(SevereAlert {
            kind: SevereAlertKind::DustStorm,
            severity,
            title: "Dust storm".to_string(),
            message: format!("Visibility: {:.0} m", weather.visibility_m),
            impact: vec![
                "Severe visibility loss".to_string(),
                "Collision risk".to_string(),
            ],
            recommendations: vec![
                "Stop immediately".to_string(),
                "Do not drive in these conditions".to_string(),
            ],
            valid_until: now + Duration::hours(3),
        });
    }

    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}

fn impact_for(severity: Severity) -> Vec<String> {
    match severity {
        Severity::Critical => vec!["Severe danger".to_string(), "Stop immediately".to_string()],
        Severity::High => vec!["High danger".to_string(), "Exercise caution".to_string()],
        Severity::Medium => vec!["Difficult conditions".to_string(), "Stay alert".to_string()],
        Severity::Low => vec!["Moderate conditions".to_string()],
    }
}

fn recommendations_for(severity: Severity) -> Vec<String> {
    match severity {
        Severity::Critical => vec!["Pull over somewhere safe".to_string(), "Do not drive".to_string()],
        Severity::High => vec!["Reduce speed".to_string(), "Exercise caution".to_string()],
        Severity::Medium => vec!["Stay alert".to_string(), "Reduce speed".to_string()],
        Severity::Low => vec!["Exercise caution".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertSeverity, WeatherCondition};

    fn noon() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::hours(12)
    }

    #[test]
    fn test_clear_weather_no_alerts() {
        let alerts = check(&WeatherSnapshot::default(), &[], noon());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_storm_thresholds() {
        // Rain above 20 without a storm label still alerts
        let rain = WeatherSnapshot { rain_rate_mm_hr: 25.0, ..WeatherSnapshot::default() };
        let alerts = check(&rain, &[], noon());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, SevereAlertKind::Storm);
        assert_eq!(alerts[0].severity, Severity::High);

        // Above 30: critical
        let downpour = WeatherSnapshot { rain_rate_mm_hr: 35.0, ..WeatherSnapshot::default() };
        let alerts = check(&downpour, &[], noon());
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].valid_until, noon() + Duration::hours(1));
    }

    #[test]
    fn test_extreme_heat_trigger() {
        let hot = WeatherSnapshot { temperature_c: 47.0, ..WeatherSnapshot::default() };
        let alerts = check(&hot, &[], noon());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, SevereAlertKind::ExtremeHeat);
        assert_eq!(alerts[0].severity, Severity::High);

        let warm = WeatherSnapshot { temperature_c: 44.0, ..WeatherSnapshot::default() };
        assert!(check(&warm, &[], noon()).is_empty());
    }

    #[test]
    fn test_wind_trigger() {
        let gale = WeatherSnapshot { wind_speed_kmh: 55.0, ..WeatherSnapshot::default() };
        let alerts = check(&gale, &[], noon());
        assert_eq!(alerts[0].kind, SevereAlertKind::StrongWind);
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn test_dust_storm_severity_by_visibility() {
        let dusty = WeatherSnapshot {
            condition: WeatherCondition::Sandstorm,
            visibility_m: 150.0,
            ..WeatherSnapshot::default()
        };
        let alerts = check(&dusty, &[], noon());
        assert_eq!(alerts[0].kind, SevereAlertKind::DustStorm);
        assert_eq!(alerts[0].severity, Severity::Critical);

        let hazy = WeatherSnapshot {
            condition: WeatherCondition::Dust,
            visibility_m: 800.0,
            ..WeatherSnapshot::default()
        };
        let alerts = check(&hazy, &[], noon());
        assert_eq!(alerts[0].severity, Severity::High);
    }

    #[test]
    fn test_official_warning_mapping_is_total() {
        for (provider, expected) in [
            (AlertSeverity::Minor, Severity::Low),
            (AlertSeverity::Moderate, Severity::Medium),
            (AlertSeverity::Severe, Severity::High),
            (AlertSeverity::Extreme, Severity::Critical),
        ] {
            let warning = WeatherAlert {
                title: "Official warning".to_string(),
                description: "Issued by the provider".to_string(),
                severity: provider,
                start_time: noon(),
                end_time: noon() + Duration::hours(4),
            };
            let alerts = check(&WeatherSnapshot::default(), &[warning], noon());
            assert_eq!(alerts.len(), 1);
            assert_eq!(alerts[0].kind, SevereAlertKind::OfficialWarning);
            assert_eq!(alerts[0].severity, expected);
            assert_eq!(alerts[0].valid_until, noon() + Duration::hours(4));
        }
    }

    #[test]
    fn test_sorted_most_severe_first() {
        // Heat (high) + wind (critical) together
        let wild = WeatherSnapshot {
            temperature_c: 47.0,
            wind_speed_kmh: 60.0,
            ..WeatherSnapshot::default()
        };
        let alerts = check(&wild, &[], noon());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::High);
    }
}
