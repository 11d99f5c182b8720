use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    model::Metric,
    normalize::normalize,
    store::{ReadingStore, StoreError},
};

// ---------------------------------------------------------------------------
// Report shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Summary statistics over one sensor's projected values.
///
/// All three statistics are `null` when the filtered data set is empty —
/// never NaN or ±infinity. The unit is always present; it depends only on
/// the metric.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportSummary {
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: String,
}

impl ReportSummary {
    fn of(metric: Metric, values: &[f64]) -> Self {
        let average = if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        };
        Self {
            average,
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
            unit: metric.unit().to_owned(),
        }
    }

    fn empty(metric: Metric) -> Self {
        Self::of(metric, &[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorReport {
    pub sensor_id: String,
    /// Ordered by ascending timestamp.
    pub data: Vec<ReportPoint>,
    pub summary: ReportSummary,
}

impl SensorReport {
    /// Placeholder for a sensor whose fetch failed: present in the output,
    /// visibly carrying no data.
    pub fn empty(sensor_id: impl Into<String>, metric: Metric) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            data: vec![],
            summary: ReportSummary::empty(metric),
        }
    }
}

/// Cross-sensor statistics, keyed by sensor id.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Comparative {
    pub averages: BTreeMap<String, Option<f64>>,
    pub max_values: BTreeMap<String, Option<f64>>,
    pub min_values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ComparisonReport {
    /// Per-sensor reports in the order the sensors were requested.
    pub sensors: Vec<SensorReport>,
    pub comparative: Comparative,
}

// ---------------------------------------------------------------------------
// ReportService
// ---------------------------------------------------------------------------

/// Builds single-sensor and comparison reports on top of the reading store.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn ReadingStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    /// One sensor, one metric, closed time interval on both ends.
    ///
    /// Readings where the metric is absent are dropped from the projection;
    /// the remainder is re-sorted ascending (the store's order is not
    /// trusted) and summarized.
    pub async fn generate_report(
        &self,
        sensor_id: &str,
        metric: Metric,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SensorReport, StoreError> {
        let records = self.store.query_range(sensor_id, start, end).await?;

        let mut data: Vec<ReportPoint> = records
            .iter()
            .map(normalize)
            .filter_map(|reading| {
                reading.metric(metric).map(|value| ReportPoint {
                    timestamp: reading.timestamp,
                    value,
                })
            })
            .collect();
        data.sort_by_key(|point| point.timestamp);

        let values: Vec<f64> = data.iter().map(|p| p.value).collect();
        Ok(SensorReport {
            sensor_id: sensor_id.to_owned(),
            data,
            summary: ReportSummary::of(metric, &values),
        })
    }

    /// One report per sensor, fetched concurrently, merged into a comparison.
    ///
    /// A failed branch becomes an empty placeholder report for that sensor —
    /// one broken sensor never aborts the others. Output order follows the
    /// requested `sensor_ids`.
    pub async fn compare_sensors(
        &self,
        sensor_ids: &[String],
        metric: Metric,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ComparisonReport {
        let mut tasks = JoinSet::new();
        for (index, sensor_id) in sensor_ids.iter().enumerate() {
            let service = self.clone();
            let sensor_id = sensor_id.clone();
            tasks.spawn(async move {
                let report = match service
                    .generate_report(&sensor_id, metric, start, end)
                    .await
                {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(
                            sensor_id = %sensor_id,
                            error = %e,
                            "Sensor fetch failed; substituting empty report"
                        );
                        SensorReport::empty(sensor_id, metric)
                    }
                };
                (index, report)
            });
        }

        let mut slots: Vec<Option<SensorReport>> = vec![None; sensor_ids.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(e) => warn!(error = %e, "Comparison branch task failed"),
            }
        }

        let sensors: Vec<SensorReport> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| SensorReport::empty(sensor_ids[index].clone(), metric))
            })
            .collect();

        let mut comparative = Comparative {
            averages: BTreeMap::new(),
            max_values: BTreeMap::new(),
            min_values: BTreeMap::new(),
        };
        for report in &sensors {
            let id = report.sensor_id.clone();
            comparative.averages.insert(id.clone(), report.summary.average);
            comparative.max_values.insert(id.clone(), report.summary.max);
            comparative.min_values.insert(id, report.summary.min);
        }

        ComparisonReport {
            sensors,
            comparative,
        }
    }
}
