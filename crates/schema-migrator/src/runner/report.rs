//! Run reports and migration listings.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunDirection {
    Up,
    Down,
}

/// One migration applied or reverted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationOutcome {
    pub version: i64,
    pub description: String,
    pub duration_ms: u64,
}

/// Result of a runner operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub direction: RunDirection,

    /// Statements were logged, not executed.
    pub preview: bool,

    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Migrations applied, in execution order.
    pub applied: Vec<MigrationOutcome>,

    /// Migrations reverted, in execution order.
    pub reverted: Vec<MigrationOutcome>,

    /// Highest applied version once the run finished.
    pub current_version: Option<i64>,
}

impl RunReport {
    pub(crate) fn new(direction: RunDirection, preview: bool) -> Self {
        let now = Utc::now();
        Self {
            direction,
            preview,
            started_at: now,
            completed_at: now,
            duration_seconds: 0.0,
            applied: Vec::new(),
            reverted: Vec::new(),
            current_version: None,
        }
    }

    pub(crate) fn finish(&mut self, current_version: Option<i64>) {
        self.completed_at = Utc::now();
        self.duration_seconds =
            (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0;
        self.current_version = current_version;
    }

    /// Number of migrations applied or reverted.
    pub fn count(&self) -> usize {
        self.applied.len() + self.reverted.len()
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// State of a migration in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Applied,
    Pending,
    /// Recorded in the version table but unknown to the runner.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationEntry {
    pub version: i64,
    pub description: String,
    pub state: MigrationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_on: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub breaking_change: bool,
}

/// Applied, pending and missing migrations, ordered by version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationListing {
    pub current_version: Option<i64>,
    pub entries: Vec<MigrationEntry>,
}

impl MigrationListing {
    pub fn pending(&self) -> impl Iterator<Item = &MigrationEntry> {
        self.entries
            .iter()
            .filter(|e| e.state == MigrationState::Pending)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json() {
        let mut report = RunReport::new(RunDirection::Up, false);
        report.applied.push(MigrationOutcome {
            version: 1,
            description: "create users".into(),
            duration_ms: 12,
        });
        report.finish(Some(1));
        assert_eq!(report.count(), 1);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["direction"], "up");
        assert_eq!(json["applied"][0]["version"], 1);
        assert_eq!(json["current_version"], 1);
    }

    #[test]
    fn test_listing_skips_empty_fields() {
        let listing = MigrationListing {
            current_version: None,
            entries: vec![MigrationEntry {
                version: 7,
                description: "pending one".into(),
                state: MigrationState::Pending,
                applied_on: None,
                tags: Vec::new(),
                breaking_change: false,
            }],
        };
        assert_eq!(listing.pending().count(), 1);
        let json = listing.to_json().unwrap();
        assert!(json.contains("\"pending\""));
        assert!(!json.contains("applied_on"));
        assert!(!json.contains("tags"));
    }
}
