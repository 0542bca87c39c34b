use rusqlite::{params, Connection, OptionalExtension};

use crate::db::error::{constraint_violation, require, Constraint};
use crate::db::models::{CreateEventData, Event, UpdateEventData};
use crate::db::{now, Changes, DbError, DbResult};
use crate::state::DbPool;

/// Shows at venues. Every event belongs to exactly one venue.
#[derive(Clone)]
pub struct EventModel {
    pool: DbPool,
}

impl EventModel {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create_event(&self, data: CreateEventData) -> DbResult<Event> {
        require("title", &data.title)?;
        require("date", &data.date)?;

        let conn = self.pool.get()?;
        let now = now();
        conn.execute(
            "INSERT INTO events (venue_id, title, date, image_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![data.venue_id, data.title, data.date, data.image_url, now],
        )
        .map_err(|e| unknown_venue(e, data.venue_id))?;

        let id = conn.last_insert_rowid();
        fetch(&conn, id)?.ok_or(DbError::Sql(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_event_by_id(&self, id: i64) -> DbResult<Option<Event>> {
        let conn = self.pool.get()?;
        Ok(fetch(&conn, id)?)
    }

    /// Events ordered by date, latest first.
    pub fn get_events(&self, limit: i64, offset: i64) -> DbResult<Vec<Event>> {
        self.list(
            "SELECT * FROM events ORDER BY date DESC, id DESC LIMIT ?1 OFFSET ?2",
            params![limit, offset],
        )
    }

    pub fn get_events_by_venue(&self, venue_id: i64, limit: i64, offset: i64) -> DbResult<Vec<Event>> {
        self.list(
            "SELECT * FROM events WHERE venue_id = ?1
             ORDER BY date DESC, id DESC LIMIT ?2 OFFSET ?3",
            params![venue_id, limit, offset],
        )
    }

    pub fn update_event(&self, id: i64, data: UpdateEventData) -> DbResult<Option<Event>> {
        if let Some(title) = &data.title {
            require("title", title)?;
        }
        let venue_id = data.venue_id;

        let mut changes = Changes::default();
        changes
            .set("venue_id", data.venue_id)
            .set("title", data.title)
            .set("date", data.date)
            .set("image_url", data.image_url);

        let conn = self.pool.get()?;
        if changes.is_empty() {
            return Ok(fetch(&conn, id)?);
        }
        let updated = changes
            .apply(&conn, "events", id)
            .map_err(|e| unknown_venue(e, venue_id.unwrap_or_default()))?;
        if updated == 0 {
            return Ok(None);
        }
        Ok(fetch(&conn, id)?)
    }

    /// Delete an event. Its photos remain, detached from any event.
    pub fn delete_event(&self, id: i64) -> DbResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list(&self, sql: &str, params: impl rusqlite::Params) -> DbResult<Vec<Event>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let events = stmt
            .query_map(params, Event::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }
}

fn fetch(conn: &Connection, id: i64) -> rusqlite::Result<Option<Event>> {
    conn.query_row("SELECT * FROM events WHERE id = ?1", params![id], Event::from_row)
        .optional()
}

fn unknown_venue(err: rusqlite::Error, venue_id: i64) -> DbError {
    match constraint_violation(&err) {
        Some(Constraint::ForeignKey) => {
            DbError::InvalidReference(format!("venue {} does not exist", venue_id))
        }
        _ => err.into(),
    }
}
