//! Raw-record normalization.
//!
//! The fleet mixes several device generations, so the same metric shows up
//! under differently cased and spaced field names (`"Temperature"`, `"temp"`,
//! `"PM2.5"`, `"pm 25"`) and values arrive as JSON numbers or numeric
//! strings. Everything is folded onto the canonical [`Reading`] here, in one
//! place, so the aggregation code never sees vendor quirks.

use std::collections::HashMap;

use serde_json::Value;

use crate::model::{Metric, RawRecord, Reading};

/// Alias table mapping folded field names onto canonical metrics.
///
/// Keys are compared after [`fold_key`] (lowercase, alphanumerics only), so
/// `"PM2.5"`, `"pm 25"` and `"Pm25"` all land on the `pm25` entry without
/// needing their own rows.
const FIELD_ALIASES: &[(Metric, &[&str])] = &[
    (Metric::Temperature, &["temperature", "temp"]),
    (Metric::Co2, &["co2", "carbondioxide"]),
    (Metric::Humidity, &["humidity", "hum"]),
    (Metric::Pm25, &["pm25"]),
];

/// Lowercase a raw field name and strip everything non-alphanumeric.
fn fold_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Coerce a JSON value to a float. Numeric strings count; booleans, nulls,
/// arrays, objects and non-numeric strings do not.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert one raw stored record into a canonical [`Reading`].
///
/// Pure and total: a field that fails to parse becomes absent for that
/// metric only, never an error — the rest of the record still contributes.
/// When several raw fields alias the same metric, alias-table order decides:
/// the first alias with a parseable value wins.
pub fn normalize(raw: &RawRecord) -> Reading {
    let mut reading = Reading::empty(raw.sensor_id.clone(), raw.timestamp);

    let mut folded: HashMap<String, &Value> = HashMap::new();
    for (key, value) in &raw.fields {
        folded.entry(fold_key(key)).or_insert(value);
    }

    for (metric, aliases) in FIELD_ALIASES {
        for alias in *aliases {
            if let Some(v) = folded.get(*alias).and_then(|v| as_f64(v)) {
                reading.set_metric(*metric, v);
                break;
            }
        }
    }

    reading
}
