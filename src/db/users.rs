use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::db::error::{constraint_violation, require, Constraint};
use crate::db::models::{CreateUserData, UpdateUserData, User};
use crate::db::{now, posts, Changes, DbError, DbResult};
use crate::state::DbPool;

/// Accounts and credentials.
#[derive(Clone)]
pub struct UserModel {
    pool: DbPool,
    hash_cost: u32,
}

impl UserModel {
    pub fn new(pool: DbPool) -> Self {
        Self::with_hash_cost(pool, bcrypt::DEFAULT_COST)
    }

    /// Use a non-default bcrypt cost. Tests use the cheapest cost, 4.
    pub fn with_hash_cost(pool: DbPool, hash_cost: u32) -> Self {
        Self { pool, hash_cost }
    }

    /// Register an account. The plaintext password is hashed here and never stored.
    ///
    /// Fails with [`DbError::Conflict`] when the username or email is taken.
    pub fn create_user(&self, data: CreateUserData) -> DbResult<User> {
        require("username", &data.username)?;
        require("email", &data.email)?;
        require("password", &data.password)?;

        let password_hash = bcrypt::hash(&data.password, self.hash_cost)?;
        let conn = self.pool.get()?;
        let now = now();

        conn.execute(
            "INSERT INTO users (username, email, password_hash, first_name, last_name,
                                profile_image_url, bio, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                data.username.trim(),
                data.email.trim(),
                password_hash,
                data.first_name,
                data.last_name,
                data.profile_image_url,
                data.bio,
                now
            ],
        )
        .map_err(uniqueness_conflict)?;

        let id = conn.last_insert_rowid();
        tracing::info!(user_id = id, "Registered user {}", data.username.trim());
        fetch_by_id(&conn, id)?.ok_or(DbError::Sql(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_user_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let conn = self.pool.get()?;
        Ok(fetch_by_id(&conn, id)?)
    }

    pub fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let conn = self.pool.get()?;
        Ok(conn
            .query_row(
                "SELECT * FROM users WHERE email = ?1",
                params![email],
                User::from_row,
            )
            .optional()?)
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let conn = self.pool.get()?;
        Ok(conn
            .query_row(
                "SELECT * FROM users WHERE username = ?1",
                params![username],
                User::from_row,
            )
            .optional()?)
    }

    /// Update the supplied profile fields. Returns `None` if the user does not exist.
    pub fn update_user(&self, id: i64, data: UpdateUserData) -> DbResult<Option<User>> {
        if let Some(username) = &data.username {
            require("username", username)?;
        }
        if let Some(email) = &data.email {
            require("email", email)?;
        }

        let mut changes = Changes::default();
        changes
            .set("username", data.username.map(|s| s.trim().to_string()))
            .set("email", data.email.map(|s| s.trim().to_string()))
            .set("first_name", data.first_name)
            .set("last_name", data.last_name)
            .set("profile_image_url", data.profile_image_url)
            .set("bio", data.bio);

        let conn = self.pool.get()?;
        if changes.is_empty() {
            return Ok(fetch_by_id(&conn, id)?);
        }

        let updated = changes
            .apply(&conn, "users", id)
            .map_err(uniqueness_conflict)?;
        if updated == 0 {
            return Ok(None);
        }
        Ok(fetch_by_id(&conn, id)?)
    }

    /// Delete an account.
    ///
    /// Sessions, likes, comments and photos go with it; posts stay behind
    /// without an author. Counters on posts the user liked or commented on
    /// are recomputed in the same transaction.
    pub fn delete_user(&self, id: i64) -> DbResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let touched: Vec<i64> = {
            let mut stmt = tx.prepare(
                "SELECT post_id FROM post_likes WHERE user_id = ?1
                 UNION
                 SELECT post_id FROM post_comments WHERE user_id = ?1",
            )?;
            let rows = stmt.query_map(params![id], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let removed = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        for post_id in &touched {
            posts::refresh_likes_count(&tx, *post_id)?;
            posts::refresh_comments_count(&tx, *post_id)?;
        }
        tx.commit()?;

        if removed > 0 {
            tracing::info!(user_id = id, posts = touched.len(), "Deleted user");
        }
        Ok(removed > 0)
    }

    /// The only way to authenticate: returns the user only when the password
    /// matches the stored hash.
    pub fn verify_password(&self, email: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.get_user_by_email(email)? else {
            return Ok(None);
        };

        if bcrypt::verify(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            tracing::debug!(user_id = user.id, "Password mismatch");
            Ok(None)
        }
    }

    pub fn get_all_users(&self, limit: i64, offset: i64) -> DbResult<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let users = stmt
            .query_map(params![limit, offset], User::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn get_user_count(&self) -> DbResult<i64> {
        let conn = self.pool.get()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
    }
}

fn fetch_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], User::from_row)
        .optional()
}

fn uniqueness_conflict(err: rusqlite::Error) -> DbError {
    if constraint_violation(&err) != Some(Constraint::Unique) {
        return err.into();
    }
    let message = err.to_string();
    if message.contains("users.username") {
        DbError::Conflict("Username already taken".into())
    } else if message.contains("users.email") {
        DbError::Conflict("User with this email already exists".into())
    } else {
        DbError::Conflict(message)
    }
}
