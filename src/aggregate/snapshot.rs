use chrono::{DateTime, Duration, Utc};

use crate::model::{Reading, SensorStatus};

/// Latest-known state of one sensor.
///
/// A configured sensor with zero observed readings is still representable:
/// `latest_reading: None, status: Inactive`.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub sensor_id: String,
    pub latest_reading: Option<Reading>,
    pub status: SensorStatus,
}

/// Pick the most recent reading for `sensor_id` and classify liveness.
///
/// Input order is arbitrary — the store may return ascending or descending
/// depending on query direction, so the maximum timestamp is scanned for
/// rather than assumed. `Active` means the latest timestamp is strictly
/// newer than `now - liveness_window`.
pub fn resolve_snapshot(
    sensor_id: &str,
    readings: &[Reading],
    now: DateTime<Utc>,
    liveness_window: Duration,
) -> SensorSnapshot {
    let latest_reading = readings
        .iter()
        .filter(|r| r.sensor_id == sensor_id)
        .max_by_key(|r| r.timestamp)
        .cloned();

    let status = match &latest_reading {
        Some(r) if r.timestamp > now - liveness_window => SensorStatus::Active,
        _ => SensorStatus::Inactive,
    };

    SensorSnapshot {
        sensor_id: sensor_id.to_owned(),
        latest_reading,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Duration {
        Duration::hours(2)
    }

    fn reading(sensor_id: &str, ts: DateTime<Utc>, temperature: f64) -> Reading {
        Reading {
            temperature: Some(temperature),
            ..Reading::empty(sensor_id, ts)
        }
    }

    #[test]
    fn no_readings_yields_inactive_with_none() {
        let snap = resolve_snapshot("s1", &[], Utc::now(), window());
        assert_eq!(snap.sensor_id, "s1");
        assert_eq!(snap.latest_reading, None);
        assert_eq!(snap.status, SensorStatus::Inactive);
    }

    #[test]
    fn latest_is_order_independent() {
        let now = Utc::now();
        let t1 = reading("s1", now - Duration::minutes(30), 20.0);
        let t2 = reading("s1", now - Duration::minutes(20), 21.0);
        let t3 = reading("s1", now - Duration::minutes(10), 22.0);

        let a = resolve_snapshot("s1", &[t1.clone(), t3.clone(), t2.clone()], now, window());
        let b = resolve_snapshot("s1", &[t3, t2, t1], now, window());

        assert_eq!(a, b);
        assert_eq!(a.latest_reading.unwrap().temperature, Some(22.0));
    }

    #[test]
    fn recent_reading_is_active() {
        let now = Utc::now();
        let snap = resolve_snapshot(
            "s1",
            &[reading("s1", now - Duration::minutes(5), 20.0)],
            now,
            window(),
        );
        assert_eq!(snap.status, SensorStatus::Active);
    }

    #[test]
    fn reading_older_than_window_is_inactive() {
        let now = Utc::now();
        let snap = resolve_snapshot(
            "s1",
            &[reading("s1", now - Duration::hours(3), 20.0)],
            now,
            window(),
        );
        assert_eq!(snap.status, SensorStatus::Inactive);
    }

    #[test]
    fn reading_exactly_at_cutoff_is_inactive() {
        // Strict comparison: the boundary itself counts as stale.
        let now = Utc::now();
        let snap = resolve_snapshot("s1", &[reading("s1", now - window(), 20.0)], now, window());
        assert_eq!(snap.status, SensorStatus::Inactive);
    }

    #[test]
    fn other_sensors_readings_are_ignored() {
        let now = Utc::now();
        let readings = [
            reading("s1", now - Duration::hours(5), 18.0),
            reading("s2", now - Duration::minutes(1), 25.0),
        ];
        let snap = resolve_snapshot("s1", &readings, now, window());
        assert_eq!(snap.status, SensorStatus::Inactive);
        assert_eq!(snap.latest_reading.unwrap().temperature, Some(18.0));
    }
}
