use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    aggregate::{fleet::FleetHealth, monthly::MonthlyBucket, snapshot::SensorSnapshot},
    config::SensorInfo,
    model::{Metric, Reading, SensorStatus},
    reports::{ComparisonReport, SensorReport},
};

// ---------------------------------------------------------------------------
// Sensor views
// ---------------------------------------------------------------------------

/// Metric values of one sensor's most recent reading. Absent metrics are
/// serialized as `null` so the frontend always sees the same shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct LastReadingDto {
    pub temperature: Option<f64>,
    pub co2: Option<f64>,
    pub humidity: Option<f64>,
    pub pm25: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl LastReadingDto {
    pub fn absent() -> Self {
        Self {
            temperature: None,
            co2: None,
            humidity: None,
            pm25: None,
            timestamp: None,
        }
    }
}

impl From<&Reading> for LastReadingDto {
    fn from(r: &Reading) -> Self {
        Self {
            temperature: r.temperature,
            co2: r.co2,
            humidity: r.humidity,
            pm25: r.pm25,
            timestamp: Some(r.timestamp),
        }
    }
}

/// One sensor on the fleet views: static topology plus its latest snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct SensorDto {
    pub id: String,
    pub name: String,
    pub floor: String,
    pub status: SensorStatus,
    pub last_reading: LastReadingDto,
}

impl SensorDto {
    pub fn from_snapshot(info: &SensorInfo, snapshot: &SensorSnapshot) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            floor: info.floor.clone(),
            status: snapshot.status,
            last_reading: snapshot
                .latest_reading
                .as_ref()
                .map(LastReadingDto::from)
                .unwrap_or_else(LastReadingDto::absent),
        }
    }

    /// Placeholder when the sensor's data could not be fetched at all.
    pub fn unavailable(info: &SensorInfo) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            floor: info.floor.clone(),
            status: SensorStatus::Inactive,
            last_reading: LastReadingDto::absent(),
        }
    }
}

// ---------------------------------------------------------------------------
// Monthly averages
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyAverageDto {
    /// `"YYYY-MM"`.
    pub month: String,
    pub avg_temperature: Option<f64>,
    pub avg_co2: Option<f64>,
}

impl From<&MonthlyBucket> for MonthlyAverageDto {
    fn from(bucket: &MonthlyBucket) -> Self {
        Self {
            month: bucket.month.clone(),
            avg_temperature: bucket.average(Metric::Temperature),
            avg_co2: bucket.average(Metric::Co2),
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthPointDto {
    pub month: String,
    pub value: Option<f64>,
}

/// Current-year monthly series for the dashboard charts.
#[derive(Debug, Serialize, ToSchema)]
pub struct YearlySeriesDto {
    pub temperature: Vec<MonthPointDto>,
    pub co2: Vec<MonthPointDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardDto {
    pub yearly: YearlySeriesDto,
    /// `null` when the sensor has no readings or its fetch failed.
    pub real_time: Option<LastReadingDto>,
    pub fleet: FleetHealth,
}

impl YearlySeriesDto {
    pub fn from_buckets(buckets: &[MonthlyBucket]) -> Self {
        Self {
            temperature: buckets
                .iter()
                .map(|b| MonthPointDto {
                    month: b.month.clone(),
                    value: b.average(Metric::Temperature),
                })
                .collect(),
            co2: buckets
                .iter()
                .map(|b| MonthPointDto {
                    month: b.month.clone(),
                    value: b.average(Metric::Co2),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// Request body for `POST /sensors/{sensor_id}/notes`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub content: String,
    /// Defaults to `"Anonymous"` when omitted.
    pub author: Option<String>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Request body for `POST /reports/generate`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportRequest {
    /// One id → single report; several → comparison report.
    pub sensor_ids: Vec<String>,
    /// Metric name: `temperature`, `co2`, `humidity` or `pm25`.
    pub report_type: String,
    /// Start of time range (RFC3339, inclusive).
    pub start_time: DateTime<Utc>,
    /// End of time range (RFC3339, inclusive).
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeRangeDto {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Response for `POST /reports/generate`, tagged by report shape.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportResponse {
    Single {
        report_type: Metric,
        time_range: TimeRangeDto,
        report: SensorReport,
    },
    Comparison {
        report_type: Metric,
        time_range: TimeRangeDto,
        comparison: ComparisonReport,
    },
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::aggregate::snapshot::resolve_snapshot;

    #[test]
    fn sensor_dto_carries_topology_and_reading() {
        let info = SensorInfo {
            id: "s1".to_owned(),
            name: "Room 402".to_owned(),
            floor: "4".to_owned(),
        };
        let now = Utc::now();
        let mut reading = Reading::empty("s1", now);
        reading.temperature = Some(21.5);

        let snapshot = resolve_snapshot("s1", &[reading], now, chrono::Duration::hours(2));
        let dto = SensorDto::from_snapshot(&info, &snapshot);

        assert_eq!(dto.name, "Room 402");
        assert_eq!(dto.status, SensorStatus::Active);
        assert_eq!(dto.last_reading.temperature, Some(21.5));
        assert_eq!(dto.last_reading.co2, None);
    }

    #[test]
    fn unavailable_sensor_is_inactive_with_null_reading() {
        let info = SensorInfo {
            id: "s1".to_owned(),
            name: "Courtyard".to_owned(),
            floor: "external".to_owned(),
        };
        let dto = SensorDto::unavailable(&info);
        assert_eq!(dto.status, SensorStatus::Inactive);
        assert!(dto.last_reading.timestamp.is_none());
    }
}
