//! The projector: ordered, offset-tracked event consumption.
//!
//! A cycle reads up to `batch_size` events after the consumer's offset,
//! applies each one in its own transaction, and advances the offset after
//! every event whether it applied, was ignored, or failed. Handler commit and
//! offset advance are separate writes; a crash between them replays the event
//! on restart, which idempotent handlers absorb.

use std::time::Duration;

use brief_events::{
    DeadLetter, Event, EventCursor, EventStore, EventStoreError, ProjectionOffset, ProjectionStore,
};
use brief_events::sqlite::row_types::EventRow;
use brief_settings::FailurePolicy;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ProjectorConfig;
use crate::errors::{ProjectionError, Result};
use crate::handlers;

/// Counters for one or more cycles.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// Events read from the log.
    pub fetched: usize,
    /// Events whose handler committed.
    pub applied: usize,
    /// Events of a type this build does not know.
    pub ignored: usize,
    /// Events skipped or dead-lettered.
    pub failed: usize,
    /// Position after the last processed event.
    pub last_cursor: Option<EventCursor>,
}

impl BatchStats {
    /// Fold another cycle's counters into this one.
    pub fn merge(&mut self, other: BatchStats) {
        self.fetched += other.fetched;
        self.applied += other.applied;
        self.ignored += other.ignored;
        self.failed += other.failed;
        if other.last_cursor.is_some() {
            self.last_cursor = other.last_cursor;
        }
    }
}

/// Progress of one consumer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectorStatus {
    /// Consumer name.
    pub consumer_id: String,
    /// Stored offset, `None` before the first event.
    pub offset: Option<ProjectionOffset>,
    /// Events after the offset.
    pub pending: u64,
    /// Dead letters recorded for the consumer.
    pub dead_letters: u64,
}

/// What happened to one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Applied,
    Ignored,
    Failed,
}

/// Event projector over an event store and a projection store.
///
/// Cloning is cheap and clones share the cancellation token, so
/// [`Projector::stop`] on any clone ends every running loop.
#[derive(Clone)]
pub struct Projector {
    events: EventStore,
    projections: ProjectionStore,
    config: ProjectorConfig,
    cancel: CancellationToken,
}

impl Projector {
    /// Create a projector.
    pub fn new(events: EventStore, projections: ProjectionStore, config: ProjectorConfig) -> Self {
        Self {
            events,
            projections,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token (e.g. the process
    /// shutdown token).
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runtime configuration.
    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// The token `run` watches.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Ask every running loop to stop after its current cycle.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Poll the log until stopped.
    ///
    /// A full batch is followed immediately by the next cycle; a short one
    /// sleeps `poll_interval`. A failed cycle is logged and retried after
    /// twice the interval. Returns the accumulated counters.
    pub async fn run(&self, consumer_id: &str, poll_interval: Duration) -> BatchStats {
        info!(consumer_id, poll_interval = ?poll_interval, "projector started");
        let mut totals = BatchStats::default();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let this = self.clone();
            let consumer = consumer_id.to_owned();
            let cycle = tokio::task::spawn_blocking(move || this.process_batch(&consumer))
                .await
                .map_err(|e| ProjectionError::Task(e.to_string()))
                .and_then(|r| r);

            let delay = match cycle {
                Ok(stats) => {
                    let full = stats.fetched >= self.config.batch_size;
                    totals.merge(stats);
                    if full {
                        continue;
                    }
                    poll_interval
                }
                Err(e) => {
                    error!(consumer_id, error = %e, "projection cycle failed");
                    poll_interval * 2
                }
            };

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.cancel.cancelled() => break,
            }
        }

        info!(
            consumer_id,
            applied = totals.applied,
            ignored = totals.ignored,
            failed = totals.failed,
            "projector stopped"
        );
        totals
    }

    /// Run one cycle for `consumer_id`.
    ///
    /// Store errors abort the cycle and leave the offset at the last event
    /// that was fully handled.
    pub fn process_batch(&self, consumer_id: &str) -> Result<BatchStats> {
        let offset = self.events.get_offset(consumer_id)?;
        let cursor = offset.map(|o| o.cursor());
        let rows = self.events.events_after(cursor.as_ref(), self.config.batch_size)?;

        let mut stats = BatchStats {
            fetched: rows.len(),
            ..BatchStats::default()
        };

        for row in rows {
            let row_cursor = row.cursor();
            match self.process_row(consumer_id, row)? {
                Outcome::Applied => stats.applied += 1,
                Outcome::Ignored => stats.ignored += 1,
                Outcome::Failed => stats.failed += 1,
            }
            let _ = self.events.advance_offset(consumer_id, &row_cursor)?;
            stats.last_cursor = Some(row_cursor);
        }

        if stats.fetched > 0 {
            debug!(
                consumer_id,
                fetched = stats.fetched,
                applied = stats.applied,
                ignored = stats.ignored,
                failed = stats.failed,
                "projection cycle complete"
            );
        }
        Ok(stats)
    }

    /// Drop all projected state and the consumer's bookkeeping, then replay
    /// the whole log.
    pub fn rebuild(&self, consumer_id: &str) -> Result<BatchStats> {
        info!(consumer_id, "rebuilding projections");
        self.projections.clear_all()?;
        let _ = self.events.reset_offset(consumer_id)?;
        let _ = self.events.clear_dead_letters(consumer_id)?;

        let mut totals = BatchStats::default();
        loop {
            let stats = self.process_batch(consumer_id)?;
            let drained = stats.fetched < self.config.batch_size;
            totals.merge(stats);
            if drained {
                break;
            }
        }
        info!(
            consumer_id,
            applied = totals.applied,
            failed = totals.failed,
            "rebuild complete"
        );
        Ok(totals)
    }

    /// Offset, backlog and dead-letter count of `consumer_id`.
    pub fn status(&self, consumer_id: &str) -> Result<ProjectorStatus> {
        let offset = self.events.get_offset(consumer_id)?;
        let pending = self
            .events
            .count_after(offset.as_ref().map(ProjectionOffset::cursor).as_ref())?;
        let dead_letters = self.events.count_dead_letters(consumer_id)?;
        Ok(ProjectorStatus {
            consumer_id: consumer_id.to_owned(),
            offset,
            pending,
            dead_letters,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────

    fn process_row(&self, consumer_id: &str, row: EventRow) -> Result<Outcome> {
        let event_id = row.id.clone();
        let event_type = row.event_type.clone();

        let event = match row.into_event() {
            Ok(event) => event,
            Err(EventStoreError::UnknownEventType(t)) => {
                debug!(event_id = %event_id, event_type = %t, "ignoring unknown event type");
                return Ok(Outcome::Ignored);
            }
            Err(e) => {
                let err = ProjectionError::Malformed {
                    event_id: event_id.clone(),
                    event_type: event_type.clone(),
                    reason: e.to_string(),
                };
                self.give_up(consumer_id, &event_id, &event_type, &err, 1)?;
                return Ok(Outcome::Failed);
            }
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.apply(&event) {
                Ok(()) => {
                    debug!(event_id = %event_id, event_type = %event_type, "event applied");
                    return Ok(Outcome::Applied);
                }
                Err(e) if e.is_retryable() && attempts < self.config.max_attempts => {
                    warn!(event_id = %event_id, attempts, error = %e, "handler failed, retrying");
                }
                Err(e) => {
                    self.give_up(consumer_id, &event_id, &event_type, &e, attempts)?;
                    return Ok(Outcome::Failed);
                }
            }
        }
    }

    fn apply(&self, event: &Event) -> Result<()> {
        self.projections.write(|tx| handlers::apply(tx, event))
    }

    fn give_up(
        &self,
        consumer_id: &str,
        event_id: &str,
        event_type: &str,
        err: &ProjectionError,
        attempts: u32,
    ) -> Result<()> {
        match self.config.failure_policy {
            FailurePolicy::Skip => {
                warn!(consumer_id, event_id, event_type, error = %err, "skipping failed event");
            }
            FailurePolicy::DeadLetter => {
                warn!(consumer_id, event_id, event_type, error = %err, "dead-lettering failed event");
                self.events.record_dead_letter(&DeadLetter {
                    consumer_id: consumer_id.to_owned(),
                    event_id: event_id.into(),
                    event_type: event_type.to_owned(),
                    error: err.to_string(),
                    attempts,
                    failed_at: brief_core::time::format_ts(&brief_core::time::now()),
                })?;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
