use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};

use snapshare_types::User;

use crate::db::{parse_timestamp, DbPool};

const USER_COLUMNS: &str =
    "id, name, username, email, bio, avatar_url, created_at, updated_at";

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Editable profile fields.
#[derive(Debug, Clone)]
pub struct ProfileUpdate<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub bio: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            username: row.get(2)?,
            email: row.get(3)?,
            bio: row.get(4)?,
            avatar_url: row.get(5)?,
            created_at: parse_timestamp(6, row.get(6)?)?,
            updated_at: parse_timestamp(7, row.get(7)?)?,
        })
    }

    /// Create a new user and return it
    pub fn create(&self, new_user: &NewUser<'_>) -> Result<User> {
        let conn = self.pool.get()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (name, username, email, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                new_user.name,
                new_user.username,
                new_user.email,
                new_user.password_hash,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )
        .context("Failed to create user")?;

        Ok(User {
            id: conn.last_insert_rowid(),
            name: new_user.name.to_string(),
            username: new_user.username.to_string(),
            email: new_user.email.to_string(),
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))?;

        let user = stmt.query_row([user_id], Self::map_row).optional()?;
        Ok(user)
    }

    /// Get user by username
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))?;

        let user = stmt.query_row([username], Self::map_row).optional()?;
        Ok(user)
    }

    /// Find a user and their password hash by username or email
    pub fn get_credentials(&self, login_identifier: &str) -> Result<Option<(User, String)>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, password_hash FROM users WHERE username = ?1 OR email = ?1 LIMIT 1",
            USER_COLUMNS
        ))?;

        let credentials = stmt
            .query_row([login_identifier], |row| {
                Ok((Self::map_row(row)?, row.get::<_, String>(8)?))
            })
            .optional()?;
        Ok(credentials)
    }

    /// Get all users, ordered by username
    pub fn list_all(&self) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Whether the username belongs to someone other than `except_user_id`
    pub fn username_taken(&self, username: &str, except_user_id: Option<i64>) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ? AND id != ?",
            (username, except_user_id.unwrap_or(-1)),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether the email belongs to someone other than `except_user_id`
    pub fn email_taken(&self, email: &str, except_user_id: Option<i64>) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ? AND id != ?",
            (email, except_user_id.unwrap_or(-1)),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Update profile fields; returns the updated user, or None if it does not exist
    pub fn update_profile(&self, user_id: i64, update: &ProfileUpdate<'_>) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let rows_affected = conn
            .execute(
                "UPDATE users
                 SET name = ?, username = ?, email = ?, bio = ?, avatar_url = ?, updated_at = ?
                 WHERE id = ?",
                (
                    update.name,
                    update.username,
                    update.email,
                    update.bio,
                    update.avatar_url,
                    Utc::now().to_rfc3339(),
                    user_id,
                ),
            )
            .context("Failed to update user profile")?;
        drop(conn);

        if rows_affected == 0 {
            return Ok(None);
        }
        self.get_by_id(user_id)
    }

    /// Number of registered users
    pub fn count(&self) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}
