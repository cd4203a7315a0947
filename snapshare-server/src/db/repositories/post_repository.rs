use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, TransactionBehavior};

use snapshare_types::Post;

use crate::db::{parse_timestamp, DbPool};

const POST_COLUMNS: &str = "id, image_url, caption, author_id, created_at, updated_at";

/// Rows removed by a cascading post deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedPost {
    pub likes: usize,
    pub comments: usize,
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            image_url: row.get(1)?,
            caption: row.get(2)?,
            author_id: row.get(3)?,
            created_at: parse_timestamp(4, row.get(4)?)?,
            updated_at: parse_timestamp(5, row.get(5)?)?,
        })
    }

    /// Create a new post and return it
    pub fn create(&self, author_id: i64, image_url: &str, caption: Option<&str>) -> Result<Post> {
        let conn = self.pool.get()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO posts (image_url, caption, author_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (image_url, caption, author_id, now.to_rfc3339(), now.to_rfc3339()),
        )
        .context("Failed to create post")?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            image_url: image_url.to_string(),
            caption: caption.map(str::to_string),
            author_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: i64) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts WHERE id = ?",
            POST_COLUMNS
        ))?;

        let post = stmt.query_row([post_id], Self::map_row).optional()?;
        Ok(post)
    }

    /// Get every post, newest first
    pub fn list_all(&self) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))?;

        let posts = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Get posts by a specific user, newest first
    pub fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts WHERE author_id = ? ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        ))?;

        let posts = stmt
            .query_map([author_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Delete a post together with its likes and comments.
    ///
    /// Runs as one transaction: either every row goes or none does.
    /// Returns `None` when the post did not exist.
    pub fn delete_with_dependents(&self, post_id: i64) -> Result<Option<DeletedPost>> {
        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin delete transaction")?;

        let likes = tx
            .execute("DELETE FROM likes WHERE post_id = ?", [post_id])
            .context("Failed to delete likes")?;
        let comments = tx
            .execute("DELETE FROM comments WHERE post_id = ?", [post_id])
            .context("Failed to delete comments")?;
        let posts = tx
            .execute("DELETE FROM posts WHERE id = ?", [post_id])
            .context("Failed to delete post")?;

        if posts == 0 {
            // Dropping the transaction rolls back the dependent deletes
            return Ok(None);
        }

        tx.commit().context("Failed to commit delete transaction")?;
        Ok(Some(DeletedPost { likes, comments }))
    }
}
