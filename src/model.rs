use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// The four environmental metrics a sensor can report.
///
/// Units are fixed per metric; temperature is stored in °C (Fahrenheit
/// conversion, if any, belongs to the presentation layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Co2,
    Humidity,
    Pm25,
}

impl Metric {
    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Co2 => "ppm",
            Metric::Humidity => "%",
            Metric::Pm25 => "µg/m³",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Metric::Temperature => "temperature",
            Metric::Co2 => "co2",
            Metric::Humidity => "humidity",
            Metric::Pm25 => "pm25",
        };
        f.write_str(s)
    }
}

/// Requested metric name is not one of the four known metrics.
///
/// This indicates a caller bug (bad `report_type` in a request), so it is a
/// hard error and never silently defaulted.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported metric: {0:?}")]
pub struct UnsupportedMetric(pub String);

impl FromStr for Metric {
    type Err = UnsupportedMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(Metric::Temperature),
            "co2" => Ok(Metric::Co2),
            "humidity" => Ok(Metric::Humidity),
            "pm25" => Ok(Metric::Pm25),
            other => Err(UnsupportedMetric(other.to_owned())),
        }
    }
}

/// One raw row from the time-series store, before normalization.
///
/// `fields` holds the device payload exactly as ingested — field names and
/// value types vary across device generations.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// One timestamped multi-metric observation, normalized.
///
/// Any subset of the metrics may be absent — a reading with all four absent
/// is still valid (partial sensor failure) and simply contributes nothing
/// to averages.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub co2: Option<f64>,
    pub humidity: Option<f64>,
    pub pm25: Option<f64>,
}

impl Reading {
    /// A reading with every metric absent.
    pub fn empty(sensor_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp,
            temperature: None,
            co2: None,
            humidity: None,
            pm25: None,
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Co2 => self.co2,
            Metric::Humidity => self.humidity,
            Metric::Pm25 => self.pm25,
        }
    }

    pub fn set_metric(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::Temperature => &mut self.temperature,
            Metric::Co2 => &mut self.co2,
            Metric::Humidity => &mut self.humidity,
            Metric::Pm25 => &mut self.pm25,
        };
        *slot = Some(value);
    }
}

/// A free-text annotation attached to one sensor (maintenance remarks,
/// placement changes, calibration history).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Note {
    pub id: uuid::Uuid,
    pub sensor_id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Liveness classification of a sensor on detail views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    Inactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_parses_canonical_names() {
        assert_eq!("temperature".parse::<Metric>().unwrap(), Metric::Temperature);
        assert_eq!("co2".parse::<Metric>().unwrap(), Metric::Co2);
        assert_eq!("humidity".parse::<Metric>().unwrap(), Metric::Humidity);
        assert_eq!("pm25".parse::<Metric>().unwrap(), Metric::Pm25);
    }

    #[test]
    fn metric_rejects_unknown_name() {
        let err = "radon".parse::<Metric>().unwrap_err();
        assert_eq!(err, UnsupportedMetric("radon".to_owned()));
    }

    #[test]
    fn metric_units_are_fixed() {
        assert_eq!(Metric::Temperature.unit(), "°C");
        assert_eq!(Metric::Co2.unit(), "ppm");
        assert_eq!(Metric::Humidity.unit(), "%");
        assert_eq!(Metric::Pm25.unit(), "µg/m³");
    }

    #[test]
    fn reading_metric_accessor_matches_fields() {
        let mut r = Reading::empty("s1", chrono::Utc::now());
        r.set_metric(Metric::Co2, 415.0);
        assert_eq!(r.metric(Metric::Co2), Some(415.0));
        assert_eq!(r.metric(Metric::Temperature), None);
    }
}
