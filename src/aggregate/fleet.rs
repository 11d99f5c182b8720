use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::Reading;

/// Fleet-wide sensor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct FleetHealth {
    pub total_sensors: usize,
    pub working_sensors: usize,
}

/// Count distinct and recently-reporting sensors over one materialized scan.
///
/// Both counts derive from the same `readings` slice so they reflect a single
/// wall-clock instant — callers must not re-query between them. A sensor is
/// "working" when its newest timestamp in the scan is strictly newer than
/// `now - freshness_window`.
pub fn count_fleet_health(
    readings: &[Reading],
    now: DateTime<Utc>,
    freshness_window: Duration,
) -> FleetHealth {
    let mut newest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for reading in readings {
        newest
            .entry(reading.sensor_id.as_str())
            .and_modify(|ts| {
                if reading.timestamp > *ts {
                    *ts = reading.timestamp;
                }
            })
            .or_insert(reading.timestamp);
    }

    let cutoff = now - freshness_window;
    let working_sensors = newest.values().filter(|ts| **ts > cutoff).count();

    FleetHealth {
        total_sensors: newest.len(),
        working_sensors,
    }
}
