//! Project metadata handler for `project.created` and `project.updated`.

use brief_events::Event;
use brief_events::sqlite::repositories::project::{ProjectFields, ProjectRepo};
use brief_events::types::payloads::project::ProjectPayload;
use rusqlite::Connection;

use super::non_empty;
use crate::errors::Result;

/// Upsert the event's project. Supplied fields overwrite.
pub(super) fn upsert(conn: &Connection, event: &Event, p: &ProjectPayload) -> Result<()> {
    let fields = ProjectFields {
        name: non_empty(p.name.as_deref()),
        description: p.description.as_deref(),
        status: non_empty(p.status.as_deref()),
        repository: p.repository.as_deref(),
    };
    ProjectRepo::upsert(conn, &event.project_id, &fields, &event.created_at)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::apply;
    use super::super::test_support::{conn, event};
    use brief_events::EventType;
    use brief_events::sqlite::repositories::project::ProjectRepo;
    use serde_json::json;

    #[test]
    fn created_then_updated() {
        let conn = conn();
        apply(
            &conn,
            &event(EventType::ProjectCreated, json!({"name": "Brief", "description": "Planner"})),
        )
        .unwrap();
        apply(&conn, &event(EventType::ProjectUpdated, json!({"status": "paused"}))).unwrap();

        let project = ProjectRepo::get(&conn, "prj_1").unwrap().unwrap();
        assert_eq!(project.name, "Brief");
        assert_eq!(project.description.as_deref(), Some("Planner"));
        assert_eq!(project.status, "paused");
    }

    #[test]
    fn update_before_create_uses_id_as_name() {
        let conn = conn();
        apply(&conn, &event(EventType::ProjectUpdated, json!({}))).unwrap();
        assert_eq!(ProjectRepo::get(&conn, "prj_1").unwrap().unwrap().name, "prj_1");
    }
}
