use anyhow::{Context, Result};
use chrono::Duration;

// ---------------------------------------------------------------------------
// Sensor topology
// ---------------------------------------------------------------------------

/// Static mapping of one physical sensor to its location in the building.
///
/// Topology is deployment configuration, not observed data: a sensor listed
/// here with zero stored readings still appears on the dashboard (inactive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorInfo {
    pub id: String,
    pub name: String,
    pub floor: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Sensor → location table.
    /// Format: `"id:name:floor,..."` (e.g. `"bcff4dd3b24c:Room 402:4"`).
    pub topology: Vec<SensorInfo>,
    /// Per-sensor staleness threshold for "active" status on detail views.
    pub liveness_window_secs: i64,
    /// Fleet-wide staleness threshold for the working-sensor count.
    /// Intentionally much shorter than the liveness window.
    pub fleet_freshness_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            topology: parse_topology(&optional("SENSOR_TOPOLOGY", ""))?,
            liveness_window_secs: optional("LIVENESS_WINDOW_SECS", "7200")
                .parse()
                .context("LIVENESS_WINDOW_SECS must be a positive integer")?,
            fleet_freshness_secs: optional("FLEET_FRESHNESS_SECS", "600")
                .parse()
                .context("FLEET_FRESHNESS_SECS must be a positive integer")?,
        })
    }

    pub fn liveness_window(&self) -> Duration {
        Duration::seconds(self.liveness_window_secs)
    }

    pub fn fleet_freshness(&self) -> Duration {
        Duration::seconds(self.fleet_freshness_secs)
    }
}

/// Parse `"id:name:floor,..."` into a `Vec<SensorInfo>`.
///
/// Returns an error immediately if any entry does not have all three parts.
/// Names may contain spaces (`"Room 402"`, `"Main Event Space"`).
fn parse_topology(raw: &str) -> Result<Vec<SensorInfo>> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(name), Some(floor)) if !id.trim().is_empty() => Ok(SensorInfo {
                    id: id.trim().to_owned(),
                    name: name.trim().to_owned(),
                    floor: floor.trim().to_owned(),
                }),
                _ => Err(anyhow::anyhow!(
                    "SENSOR_TOPOLOGY entry must be 'id:name:floor', got: {entry:?}"
                )),
            }
        })
        .collect()
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_topology_empty() {
        let t = parse_topology("").unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn parse_topology_multiple_entries() {
        let t = parse_topology(
            "bcff4dd3b24c:Room 402:4,485519ee6c1a:Lounge Space:2,d8bfc0c0e514:Courtyard:external",
        )
        .unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(
            t[0],
            SensorInfo {
                id: "bcff4dd3b24c".to_owned(),
                name: "Room 402".to_owned(),
                floor: "4".to_owned(),
            }
        );
        assert_eq!(t[2].floor, "external");
    }

    #[test]
    fn parse_topology_trims_whitespace() {
        let t = parse_topology(" a1 : Room 307 : 3 ").unwrap();
        assert_eq!(t[0].id, "a1");
        assert_eq!(t[0].name, "Room 307");
        assert_eq!(t[0].floor, "3");
    }

    #[test]
    fn parse_topology_missing_part_errors() {
        let err = parse_topology("a1:Room 307").unwrap_err();
        assert!(err.to_string().contains("id:name:floor"));
    }

    #[test]
    fn windows_convert_to_durations() {
        let config = Config {
            database_url: String::new(),
            server_host: String::new(),
            server_port: 0,
            topology: vec![],
            liveness_window_secs: 7200,
            fleet_freshness_secs: 600,
        };
        assert_eq!(config.liveness_window(), Duration::hours(2));
        assert_eq!(config.fleet_freshness(), Duration::minutes(10));
    }
}
