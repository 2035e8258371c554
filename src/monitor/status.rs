//! Latest known outcome per target.
//!
//! Written only by the poll cycle coordinator, read at any time by the API.

use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Result of a single probe.
///
/// Serialized in the wire format served by `/status`:
/// `{"state":"UP","code":200,"responseTimeMs":50,"lastCheck":"..."}` or
/// `{"state":"DOWN","lastCheck":"...","error":"timeout"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "UPPERCASE")]
pub enum ProbeOutcome {
    /// The target answered with some HTTP response, whatever its status.
    Up {
        #[serde(rename = "code")]
        http_status: u16,
        #[serde(rename = "responseTimeMs")]
        latency_ms: u64,
        #[serde(rename = "lastCheck", serialize_with = "serialize_timestamp")]
        observed_at: DateTime<Utc>,
    },
    /// The request failed below HTTP.
    Down {
        #[serde(rename = "lastCheck", serialize_with = "serialize_timestamp")]
        observed_at: DateTime<Utc>,
        #[serde(rename = "error")]
        reason: String,
    },
}

impl ProbeOutcome {
    pub fn up(http_status: u16, latency_ms: u64) -> Self {
        ProbeOutcome::Up {
            http_status,
            latency_ms,
            observed_at: Utc::now(),
        }
    }

    pub fn down(reason: impl Into<String>) -> Self {
        ProbeOutcome::Down {
            observed_at: Utc::now(),
            reason: reason.into(),
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, ProbeOutcome::Up { .. })
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        match self {
            ProbeOutcome::Up { observed_at, .. } | ProbeOutcome::Down { observed_at, .. } => {
                *observed_at
            }
        }
    }
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Point-in-time view of the status state.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub up: usize,
    pub down: usize,
    /// Number of targets with a recorded outcome.
    pub total: usize,
    pub per_target: BTreeMap<String, ProbeOutcome>,
}

/// Shared map from target name to its latest outcome.
#[derive(Debug, Default)]
pub struct StatusState {
    entries: DashMap<String, ProbeOutcome>,
}

impl StatusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for `name`.
    pub fn record(&self, name: &str, outcome: ProbeOutcome) {
        self.entries.insert(name.to_string(), outcome);
    }

    pub fn get(&self, name: &str) -> Option<ProbeOutcome> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy out every entry and count them by variant.
    ///
    /// Targets that have not completed a probe yet are absent.
    pub fn snapshot(&self) -> Snapshot {
        let per_target: BTreeMap<String, ProbeOutcome> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let up = per_target.values().filter(|outcome| outcome.is_up()).count();
        let total = per_target.len();

        Snapshot {
            up,
            down: total - up,
            total,
            per_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let state = StatusState::new();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.up, 0);
        assert_eq!(snapshot.down, 0);
        assert_eq!(snapshot.total, 0);
        assert!(snapshot.per_target.is_empty());
    }

    #[test]
    fn test_snapshot_counts() {
        let state = StatusState::new();
        state.record("a", ProbeOutcome::up(200, 12));
        state.record("b", ProbeOutcome::up(503, 40));
        state.record("c", ProbeOutcome::down("timeout"));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.up, 2);
        assert_eq!(snapshot.down, 1);
        assert_eq!(snapshot.up + snapshot.down, snapshot.total);
        assert_eq!(snapshot.total, 3);
    }

    #[test]
    fn test_record_overwrites() {
        let state = StatusState::new();
        state.record("a", ProbeOutcome::down("connection refused"));
        state.record("a", ProbeOutcome::up(200, 5));

        assert_eq!(state.len(), 1);
        assert!(state.get("a").unwrap().is_up());
    }

    #[test]
    fn test_up_wire_format() {
        let observed_at = DateTime::parse_from_rfc3339("2025-03-01T12:00:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        let outcome = ProbeOutcome::Up {
            http_status: 200,
            latency_ms: 50,
            observed_at,
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "state": "UP",
                "code": 200,
                "responseTimeMs": 50,
                "lastCheck": "2025-03-01T12:00:00.250Z",
            })
        );
    }

    #[test]
    fn test_down_wire_format() {
        let outcome = ProbeOutcome::down("timeout");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["state"], "DOWN");
        assert_eq!(json["error"], "timeout");
        assert!(json.get("code").is_none());
        assert!(json["lastCheck"].as_str().unwrap().ends_with('Z'));
    }
}
