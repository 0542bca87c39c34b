use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::error::{constraint_violation, Constraint};
use crate::db::models::Session;
use crate::db::{now, timestamp, DbError, DbResult};
use crate::state::DbPool;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Bearer-token sessions.
///
/// A session is valid while `expires_at` lies in the future. Expired rows stay
/// on disk until [`SessionModel::delete_expired_sessions`] sweeps them, but no
/// lookup ever returns one.
#[derive(Clone)]
pub struct SessionModel {
    pool: DbPool,
}

impl SessionModel {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Issue a session for `user_id` expiring `ttl_hours` from now.
    /// A negative TTL yields a session that is already expired.
    pub fn create_session(&self, user_id: i64, ttl_hours: i64) -> DbResult<Session> {
        let expires_at = expiry(ttl_hours)?;
        let conn = self.pool.get()?;
        let token = generate_token();

        conn.execute(
            "INSERT INTO sessions (user_id, session_token, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, token, expires_at, now()],
        )
        .map_err(|e| match constraint_violation(&e) {
            Some(Constraint::ForeignKey) => {
                DbError::InvalidReference(format!("user {} does not exist", user_id))
            }
            _ => e.into(),
        })?;

        let id = conn.last_insert_rowid();
        tracing::debug!(user_id, session_id = id, "Created session");
        fetch_by_id(&conn, id)?.ok_or(DbError::Sql(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Row lookup by id, regardless of expiry.
    pub fn get_session_by_id(&self, id: i64) -> DbResult<Option<Session>> {
        let conn = self.pool.get()?;
        Ok(fetch_by_id(&conn, id)?)
    }

    pub fn get_session_by_token(&self, token: &str) -> DbResult<Option<Session>> {
        let conn = self.pool.get()?;
        Ok(fetch_valid(&conn, token)?)
    }

    pub fn is_session_valid(&self, token: &str) -> DbResult<bool> {
        Ok(self.get_session_by_token(token)?.is_some())
    }

    /// Valid sessions of a user, newest first.
    pub fn get_user_sessions(&self, user_id: i64) -> DbResult<Vec<Session>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM sessions
             WHERE user_id = ?1 AND expires_at > ?2
             ORDER BY created_at DESC, id DESC",
        )?;
        let sessions = stmt
            .query_map(params![user_id, now()], Session::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    pub fn delete_session(&self, token: &str) -> DbResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM sessions WHERE session_token = ?1",
            params![token],
        )?;
        Ok(rows > 0)
    }

    /// Remove every session of a user. Returns how many were removed.
    pub fn delete_user_sessions(&self, user_id: i64) -> DbResult<usize> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
        Ok(rows)
    }

    /// Sweep rows whose expiry has passed. Returns how many were removed.
    pub fn delete_expired_sessions(&self) -> DbResult<usize> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![now()],
        )?;
        if rows > 0 {
            tracing::info!("Swept {} expired sessions", rows);
        }
        Ok(rows)
    }

    /// Move the expiry of a still-valid session to `ttl_hours` from now.
    /// Expired sessions are not revived; they yield `None`.
    pub fn extend_session(&self, token: &str, ttl_hours: i64) -> DbResult<Option<Session>> {
        let expires_at = expiry(ttl_hours)?;
        let conn = self.pool.get()?;

        let rows = conn.execute(
            "UPDATE sessions SET expires_at = ?1
             WHERE session_token = ?2 AND expires_at > ?3",
            params![expires_at, token, now()],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        Ok(fetch_valid(&conn, token)?)
    }
}

fn fetch_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Session>> {
    conn.query_row(
        "SELECT * FROM sessions WHERE id = ?1",
        params![id],
        Session::from_row,
    )
    .optional()
}

fn fetch_valid(conn: &Connection, token: &str) -> rusqlite::Result<Option<Session>> {
    conn.query_row(
        "SELECT * FROM sessions WHERE session_token = ?1 AND expires_at > ?2",
        params![token, now()],
        Session::from_row,
    )
    .optional()
}

/// Expiry timestamp `ttl_hours` from now, rejecting TTLs outside chrono's range.
fn expiry(ttl_hours: i64) -> DbResult<String> {
    Duration::try_hours(ttl_hours)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .map(timestamp)
        .ok_or_else(|| {
            DbError::Validation(format!("session TTL of {} hours is out of range", ttl_hours))
        })
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
