use rusqlite::{params, Connection, OptionalExtension};

use crate::db::error::{constraint_violation, require, Constraint};
use crate::db::models::{CreateVenueData, Venue};
use crate::db::{now, DbError, DbResult};
use crate::state::DbPool;

#[derive(Clone)]
pub struct VenueModel {
    pool: DbPool,
}

impl VenueModel {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create_venue(&self, data: CreateVenueData) -> DbResult<Venue> {
        require("name", &data.name)?;

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO venues (name, location, website, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![data.name, data.location, data.website, now()],
        )?;
        let id = conn.last_insert_rowid();
        fetch(&conn, id)?.ok_or(DbError::Sql(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_venue_by_id(&self, id: i64) -> DbResult<Option<Venue>> {
        let conn = self.pool.get()?;
        Ok(fetch(&conn, id)?)
    }

    /// All venues, alphabetically.
    pub fn get_all_venues(&self) -> DbResult<Vec<Venue>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM venues ORDER BY name, id")?;
        let venues = stmt
            .query_map([], Venue::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(venues)
    }

    /// Delete a venue. A venue that still hosts events cannot be removed.
    pub fn delete_venue(&self, id: i64) -> DbResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM venues WHERE id = ?1", params![id])
            .map_err(|e| match constraint_violation(&e) {
                Some(Constraint::ForeignKey) => {
                    DbError::Conflict(format!("venue {} still has events", id))
                }
                _ => e.into(),
            })?;
        Ok(rows > 0)
    }
}

fn fetch(conn: &Connection, id: i64) -> rusqlite::Result<Option<Venue>> {
    conn.query_row("SELECT * FROM venues WHERE id = ?1", params![id], Venue::from_row)
        .optional()
}
