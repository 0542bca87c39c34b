pub mod error;
pub mod events;
pub mod models;
pub mod photos;
pub mod posts;
pub mod sessions;
pub mod users;
pub mod venues;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::state::DbPool;

pub use self::error::{DbError, DbResult};
pub use self::events::EventModel;
pub use self::photos::PhotoModel;
pub use self::posts::PostModel;
pub use self::sessions::SessionModel;
pub use self::users::UserModel;
pub use self::venues::VenueModel;

pub const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../migrations/001_initial.sql"),
)];

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Foreign key enforcement is per connection in SQLite, so every pooled
    // connection gets it on open.
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            ",
        )
    });
    let pool = Pool::builder().max_size(8).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// Owner of the one store handle a process uses.
///
/// The pool is created and migrated on the first call to [`Database::handle`].
/// Initialization happens under a lock, so concurrent first callers see a
/// single schema application, and a failure leaves the handle empty for the
/// next caller to retry.
pub struct Database {
    path: PathBuf,
    pool: Mutex<Option<DbPool>>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn handle(&self) -> anyhow::Result<DbPool> {
        let mut slot = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let pool = create_pool(&self.path)?;
        run_migrations(&pool)?;
        tracing::info!("Opened database at {}", self.path.display());

        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// Drop the pool. Returns whether a pool was open.
    pub fn close(&self) -> bool {
        let mut slot = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        let was_open = slot.take().is_some();
        if was_open {
            tracing::info!("Closed database at {}", self.path.display());
        }
        was_open
    }

    pub fn is_open(&self) -> bool {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn now() -> String {
    timestamp(Utc::now())
}

/// `%query%` with LIKE wildcards in the query escaped; pair with `ESCAPE '\'`.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Column assignments for a partial `UPDATE`, collected from optional fields.
#[derive(Default)]
pub(crate) struct Changes {
    assignments: Vec<(&'static str, Value)>,
}

impl Changes {
    pub(crate) fn set<T: Into<Value>>(&mut self, column: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.assignments.push((column, value.into()));
        }
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Apply the assignments to row `id` of `table`, bumping `updated_at`.
    pub(crate) fn apply(self, conn: &Connection, table: &str, id: i64) -> rusqlite::Result<usize> {
        let mut columns = Vec::with_capacity(self.assignments.len() + 1);
        let mut values = Vec::with_capacity(self.assignments.len() + 2);
        for (column, value) in self.assignments {
            values.push(value);
            columns.push(format!("{} = ?{}", column, values.len()));
        }
        values.push(Value::from(now()));
        columns.push(format!("updated_at = ?{}", values.len()));
        values.push(Value::from(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            columns.join(", "),
            values.len()
        );
        conn.execute(&sql, params_from_iter(values))
    }
}
