use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior};

use snapshare_types::Like;

use crate::db::{is_unique_constraint, parse_timestamp, DbPool};

/// Like state after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
}

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Flip a user's like on a post.
    ///
    /// Deletes the existing like if there is one, otherwise inserts it. The
    /// unique (user_id, post_id) index is the only guard against a concurrent
    /// toggle inserting first; losing that race leaves the post liked.
    pub fn toggle(&self, user_id: i64, post_id: i64) -> Result<LikeToggle> {
        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin like transaction")?;

        let removed = tx
            .execute(
                "DELETE FROM likes WHERE user_id = ? AND post_id = ?",
                (user_id, post_id),
            )
            .context("Failed to remove like")?;

        let state = if removed > 0 {
            LikeToggle::Unliked
        } else {
            match tx.execute(
                "INSERT INTO likes (user_id, post_id, created_at) VALUES (?, ?, ?)",
                (user_id, post_id, Utc::now().to_rfc3339()),
            ) {
                Ok(_) => LikeToggle::Liked,
                Err(e) if is_unique_constraint(&e) => {
                    tracing::debug!(user_id, post_id, "Concurrent like already inserted");
                    LikeToggle::Liked
                }
                Err(e) => return Err(e).context("Failed to insert like"),
            }
        };

        tx.commit().context("Failed to commit like transaction")?;
        Ok(state)
    }

    /// Get a user's like on a post
    pub fn get(&self, user_id: i64, post_id: i64) -> Result<Option<Like>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, post_id, created_at
             FROM likes
             WHERE user_id = ? AND post_id = ?",
        )?;

        let like = stmt
            .query_row((user_id, post_id), |row| {
                Ok(Like {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    post_id: row.get(2)?,
                    created_at: parse_timestamp(3, row.get(3)?)?,
                })
            })
            .optional()?;

        Ok(like)
    }

    /// Whether the user currently likes the post
    pub fn is_liked(&self, user_id: i64, post_id: i64) -> Result<bool> {
        Ok(self.get(user_id, post_id)?.is_some())
    }

    /// Number of likes on a post
    pub fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{NewUser, PostRepository, UserRepository};
    use crate::db::Database;
    use proptest::prelude::*;

    fn setup() -> (LikeRepository, i64, i64, i64) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        let users = UserRepository::new(db.pool.clone());
        let ada = users
            .create(&NewUser {
                name: "Ada",
                username: "ada",
                email: "ada@example.com",
                password_hash: "hash",
            })
            .unwrap();
        let bob = users
            .create(&NewUser {
                name: "Bob",
                username: "bob",
                email: "bob@example.com",
                password_hash: "hash",
            })
            .unwrap();
        let post = PostRepository::new(db.pool.clone())
            .create(ada.id, "https://img.example/1.jpg", None)
            .unwrap();
        (LikeRepository::new(db.pool), ada.id, bob.id, post.id)
    }

    #[test]
    fn test_toggle_likes_then_unlikes() {
        let (repo, ada, _, post) = setup();

        assert_eq!(repo.toggle(ada, post).unwrap(), LikeToggle::Liked);
        assert!(repo.is_liked(ada, post).unwrap());
        assert_eq!(repo.count_for_post(post).unwrap(), 1);

        assert_eq!(repo.toggle(ada, post).unwrap(), LikeToggle::Unliked);
        assert!(!repo.is_liked(ada, post).unwrap());
        assert_eq!(repo.count_for_post(post).unwrap(), 0);
    }

    #[test]
    fn test_likes_are_per_user() {
        let (repo, ada, bob, post) = setup();

        repo.toggle(ada, post).unwrap();
        repo.toggle(bob, post).unwrap();
        assert_eq!(repo.count_for_post(post).unwrap(), 2);

        repo.toggle(bob, post).unwrap();
        assert!(repo.is_liked(ada, post).unwrap());
        assert!(!repo.is_liked(bob, post).unwrap());
    }

    #[test]
    fn test_unique_index_rejects_duplicate_rows() {
        let (repo, ada, _, post) = setup();
        repo.toggle(ada, post).unwrap();

        let conn = repo.pool.get().unwrap();
        let err = conn
            .execute(
                "INSERT INTO likes (user_id, post_id, created_at) VALUES (?, ?, ?)",
                (ada, post, Utc::now().to_rfc3339()),
            )
            .unwrap_err();
        assert!(is_unique_constraint(&err));
    }

    #[test]
    fn test_like_on_missing_post_fails() {
        let (repo, ada, _, post) = setup();
        assert!(repo.toggle(ada, post + 99).is_err());
        assert_eq!(repo.count_for_post(post + 99).unwrap(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        // Liked exactly when the toggle count is odd
        #[test]
        fn prop_toggle_parity(toggles in 0usize..12) {
            let (repo, ada, _, post) = setup();
            let mut last = None;
            for _ in 0..toggles {
                last = Some(repo.toggle(ada, post).unwrap());
            }

            let liked = repo.is_liked(ada, post).unwrap();
            prop_assert_eq!(liked, toggles % 2 == 1);
            prop_assert_eq!(repo.count_for_post(post).unwrap(), if liked { 1 } else { 0 });
            if let Some(state) = last {
                prop_assert_eq!(state == LikeToggle::Liked, liked);
            }
        }
    }
}
