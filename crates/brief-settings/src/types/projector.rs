//! Event projector settings.

use serde::{Deserialize, Serialize};

/// What happens to an event whose handler keeps failing.
///
/// The offset always advances past the event afterwards; the policy only
/// decides whether a trace of the failure is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log a warning and drop the event.
    Skip,
    /// Record the event in `projection_dead_letters` for later inspection.
    #[default]
    DeadLetter,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "dead_letter" | "dead-letter" | "deadletter" => Ok(Self::DeadLetter),
            other => Err(format!("unknown failure policy: {other}")),
        }
    }
}

/// Poll loop configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectorSettings {
    /// Consumer name used for the offset row.
    pub consumer_id: String,
    /// Sleep between polls when the log is drained.
    pub poll_interval_ms: u64,
    /// Maximum events fetched per cycle.
    pub batch_size: usize,
    /// Terminal action after a handler exhausts its attempts.
    pub failure_policy: FailurePolicy,
    /// Handler attempts per event before the failure policy applies.
    pub max_attempts: u32,
}

impl Default for ProjectorSettings {
    fn default() -> Self {
        Self {
            consumer_id: "context-projector".to_string(),
            poll_interval_ms: 1000,
            batch_size: 50,
            failure_policy: FailurePolicy::DeadLetter,
            max_attempts: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_policy_wire_format() {
        assert_eq!(
            serde_json::to_value(FailurePolicy::DeadLetter).unwrap(),
            "dead_letter"
        );
        let parsed: FailurePolicy = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(parsed, FailurePolicy::Skip);
    }

    #[test]
    fn failure_policy_from_str_variants() {
        assert_eq!("SKIP".parse::<FailurePolicy>(), Ok(FailurePolicy::Skip));
        assert_eq!(
            "dead-letter".parse::<FailurePolicy>(),
            Ok(FailurePolicy::DeadLetter)
        );
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
