use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::model::{Metric, Reading};

/// Aggregation accumulator for one calendar month.
///
/// Sums and counts are tracked per metric, so a reading missing one metric
/// still contributes its other metrics to the same bucket.
#[derive(Debug, Clone)]
pub struct MonthlyBucket {
    /// `"YYYY-MM"` — lexicographic order is chronological order.
    pub month: String,
    sums: HashMap<Metric, f64>,
    counts: HashMap<Metric, u64>,
}

impl MonthlyBucket {
    fn new(month: String) -> Self {
        Self {
            month,
            sums: HashMap::new(),
            counts: HashMap::new(),
        }
    }

    fn add(&mut self, metric: Metric, value: f64) {
        *self.sums.entry(metric).or_insert(0.0) += value;
        *self.counts.entry(metric).or_insert(0) += 1;
    }

    pub fn count(&self, metric: Metric) -> u64 {
        self.counts.get(&metric).copied().unwrap_or(0)
    }

    /// Mean of the metric's contributions, or `None` when the month has no
    /// readings carrying that metric. Never divides by zero.
    pub fn average(&self, metric: Metric) -> Option<f64> {
        let count = self.count(metric);
        if count == 0 {
            return None;
        }
        Some(self.sums[&metric] / count as f64)
    }
}

/// `"YYYY-MM"` bucket key for a timestamp.
pub fn month_key(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m").to_string()
}

/// Fold readings into per-month buckets for the requested metrics,
/// emitted in ascending month order.
///
/// Single pass; each present metric of each reading contributes to its
/// month's sum and count independently. An empty input yields an empty
/// bucket list, not an error.
pub fn aggregate_monthly(readings: &[Reading], metrics: &[Metric]) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<String, MonthlyBucket> = BTreeMap::new();

    for reading in readings {
        let month = month_key(reading.timestamp);
        let bucket = buckets
            .entry(month.clone())
            .or_insert_with(|| MonthlyBucket::new(month));
        for &metric in metrics {
            if let Some(value) = reading.metric(metric) {
                bucket.add(metric, value);
            }
        }
    }

    buckets.into_values().collect()
}
