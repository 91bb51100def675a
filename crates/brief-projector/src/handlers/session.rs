//! Assistant session handlers.

use brief_events::Event;
use brief_events::sqlite::repositories::session::SessionRepo;
use brief_events::types::payloads::session::{SessionEndedPayload, SessionStartedPayload};
use rusqlite::Connection;

use super::require;
use crate::errors::Result;

/// `session.started`: upsert as active. An already-ended session stays ended.
pub(super) fn started(conn: &Connection, event: &Event, p: &SessionStartedPayload) -> Result<()> {
    let id = require(event, p.session_id.as_deref(), "session_id")?;
    SessionRepo::upsert_started(
        conn,
        id,
        &event.project_id,
        p.block_id.as_ref(),
        p.title.as_deref(),
        p.metadata.as_ref(),
        &event.created_at,
    )?;
    Ok(())
}

/// `session.ended`: upsert as ended with the summary.
pub(super) fn ended(conn: &Connection, event: &Event, p: &SessionEndedPayload) -> Result<()> {
    let id = require(event, p.session_id.as_deref(), "session_id")?;
    SessionRepo::upsert_ended(
        conn,
        id,
        &event.project_id,
        p.summary.as_deref(),
        p.metadata.as_ref(),
        &event.created_at,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::apply;
    use super::super::test_support::{conn, event_at};
    use brief_events::sqlite::repositories::session::SessionRepo;
    use brief_events::{EventType, SessionStatus};
    use serde_json::json;

    #[test]
    fn start_then_end() {
        let conn = conn();
        apply(
            &conn,
            &event_at(
                EventType::SessionStarted,
                json!({"session_id": "ses_1", "block_id": "blk_1", "title": "Auth work"}),
                "2024-03-01T10:00:00Z",
            ),
        )
        .unwrap();
        let session = SessionRepo::get(&conn, "ses_1").unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.block_id.as_ref().map(|b| b.as_str()), Some("blk_1"));

        apply(
            &conn,
            &event_at(
                EventType::SessionEnded,
                json!({"session_id": "ses_1", "summary": "Added refresh tokens"}),
                "2024-03-01T11:00:00Z",
            ),
        )
        .unwrap();
        let session = SessionRepo::get(&conn, "ses_1").unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Ended);
        assert_eq!(session.summary.as_deref(), Some("Added refresh tokens"));
        assert_eq!(session.title.as_deref(), Some("Auth work"));
        assert!(session.started_at.is_some());
        assert!(session.ended_at.is_some());
    }

    #[test]
    fn replayed_start_does_not_reopen() {
        let conn = conn();
        let start = event_at(
            EventType::SessionStarted,
            json!({"session_id": "ses_1"}),
            "2024-03-01T10:00:00Z",
        );
        apply(&conn, &start).unwrap();
        apply(
            &conn,
            &event_at(EventType::SessionEnded, json!({"session_id": "ses_1"}), "2024-03-01T11:00:00Z"),
        )
        .unwrap();
        apply(&conn, &start).unwrap();
        assert_eq!(
            SessionRepo::get(&conn, "ses_1").unwrap().unwrap().status,
            SessionStatus::Ended
        );
    }
}
