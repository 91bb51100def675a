//! Projector runtime configuration.

use std::time::Duration;

use brief_settings::{FailurePolicy, ProjectorSettings};

/// How the projector batches, retries and gives up on events.
#[derive(Clone, Debug)]
pub struct ProjectorConfig {
    /// Default consumer name (used by the CLI).
    pub consumer_id: String,
    /// Sleep between polls when the log is drained.
    pub poll_interval: Duration,
    /// Maximum events per cycle.
    pub batch_size: usize,
    /// Terminal action after a handler exhausts its attempts.
    pub failure_policy: FailurePolicy,
    /// Handler attempts per event.
    pub max_attempts: u32,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self::from(&ProjectorSettings::default())
    }
}

impl From<&ProjectorSettings> for ProjectorConfig {
    fn from(s: &ProjectorSettings) -> Self {
        Self {
            consumer_id: s.consumer_id.clone(),
            poll_interval: Duration::from_millis(s.poll_interval_ms),
            batch_size: s.batch_size.max(1),
            failure_policy: s.failure_policy,
            max_attempts: s.max_attempts.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_settings() {
        let c = ProjectorConfig::default();
        assert_eq!(c.consumer_id, "context-projector");
        assert_eq!(c.poll_interval, Duration::from_millis(1000));
        assert_eq!(c.batch_size, 50);
        assert_eq!(c.failure_policy, FailurePolicy::DeadLetter);
        assert_eq!(c.max_attempts, 1);
    }

    #[test]
    fn zero_values_are_raised() {
        let s = ProjectorSettings {
            batch_size: 0,
            max_attempts: 0,
            ..ProjectorSettings::default()
        };
        let c = ProjectorConfig::from(&s);
        assert_eq!(c.batch_size, 1);
        assert_eq!(c.max_attempts, 1);
    }
}
