use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};

use snapshare_types::Comment;

use crate::db::{parse_timestamp, DbPool};

const COMMENT_COLUMNS: &str = "id, text, author_id, post_id, created_at, updated_at";

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get(0)?,
            text: row.get(1)?,
            author_id: row.get(2)?,
            post_id: row.get(3)?,
            created_at: parse_timestamp(4, row.get(4)?)?,
            updated_at: parse_timestamp(5, row.get(5)?)?,
        })
    }

    /// Add a comment to a post
    pub fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        let conn = self.pool.get()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO comments (text, author_id, post_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (text, author_id, post_id, now.to_rfc3339(), now.to_rfc3339()),
        )
        .context("Failed to create comment")?;

        Ok(Comment {
            id: conn.last_insert_rowid(),
            text: text.to_string(),
            author_id,
            post_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get comment by ID
    pub fn get_by_id(&self, comment_id: i64) -> Result<Option<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE id = ?",
            COMMENT_COLUMNS
        ))?;

        let comment = stmt.query_row([comment_id], Self::map_row).optional()?;
        Ok(comment)
    }

    /// Comments on a post in the order they were written
    pub fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE post_id = ? ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS
        ))?;

        let comments = stmt
            .query_map([post_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }
}
