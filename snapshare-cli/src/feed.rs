//! Local feed state with optimistic likes.
//!
//! A like is applied to the local copy first so the caller can render it
//! right away. The returned [`PendingLike`] is then either confirmed with the
//! server's version of the post or rolled back if the mutation failed.

use snapshare_types::PostView;

/// Snapshot taken before an optimistic toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLike {
    pub post_id: i64,
    previous_liked: bool,
    previous_count: i64,
}

impl PendingLike {
    /// Whether the optimistic toggle turned the like on
    pub fn now_liked(&self) -> bool {
        !self.previous_liked
    }
}

#[derive(Debug, Default)]
pub struct FeedState {
    posts: Vec<PostView>,
}

impl FeedState {
    pub fn new(posts: Vec<PostView>) -> Self {
        Self { posts }
    }

    pub fn get(&self, post_id: i64) -> Option<&PostView> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    fn get_mut(&mut self, post_id: i64) -> Option<&mut PostView> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    /// Flip the like flag and adjust the count locally. `None` when the post
    /// is not in the feed.
    pub fn toggle_like_optimistic(&mut self, post_id: i64) -> Option<PendingLike> {
        let post = self.get_mut(post_id)?;
        let pending = PendingLike {
            post_id,
            previous_liked: post.liked_by_current_user,
            previous_count: post.like_count,
        };

        post.liked_by_current_user = !pending.previous_liked;
        post.like_count = if pending.previous_liked {
            (pending.previous_count - 1).max(0)
        } else {
            pending.previous_count + 1
        };
        Some(pending)
    }

    /// Replace the local post with what the server returned
    pub fn confirm(&mut self, pending: PendingLike, server_post: PostView) {
        debug_assert_eq!(pending.post_id, server_post.id);
        match self.get_mut(pending.post_id) {
            Some(post) => *post = server_post,
            None => log::debug!("Post {} left the feed before its like was confirmed", pending.post_id),
        }
    }

    /// Undo an optimistic toggle after the mutation failed
    pub fn rollback(&mut self, pending: PendingLike) {
        if let Some(post) = self.get_mut(pending.post_id) {
            post.liked_by_current_user = pending.previous_liked;
            post.like_count = pending.previous_count;
        }
    }
}
