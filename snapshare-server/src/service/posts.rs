use snapshare_types::{Comment, DeletePostResponse, ErrorCode, Post};

use crate::auth::Viewer;
use crate::db::repositories::{CommentRepository, LikeRepository, LikeToggle, PostRepository};
use crate::db::DbPool;

use super::error::{parse_id, ServiceError, ServiceResult};
use super::validation;

/// Posts, comments and likes
#[derive(Clone)]
pub struct PostService {
    pool: DbPool,
}

impl PostService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn posts(&self) -> PostRepository {
        PostRepository::new(self.pool.clone())
    }

    fn comments(&self) -> CommentRepository {
        CommentRepository::new(self.pool.clone())
    }

    fn likes(&self) -> LikeRepository {
        LikeRepository::new(self.pool.clone())
    }

    fn existing_post(&self, post_id: i64) -> ServiceResult<Post> {
        self.posts()
            .get_by_id(post_id)?
            .ok_or_else(|| ServiceError::not_found(format!("Post {} not found", post_id)))
    }

    /// Every post, newest first
    pub fn all_posts(&self) -> ServiceResult<Vec<Post>> {
        Ok(self.posts().list_all()?)
    }

    pub fn posts_by_user(&self, user_id: i64) -> ServiceResult<Vec<Post>> {
        Ok(self.posts().list_by_author(user_id)?)
    }

    pub fn get_post(&self, post_id: i64) -> ServiceResult<Option<Post>> {
        Ok(self.posts().get_by_id(post_id)?)
    }

    /// Comments on a post, oldest first
    pub fn comments_by_post(&self, post_id: i64) -> ServiceResult<Vec<Comment>> {
        Ok(self.comments().list_by_post(post_id)?)
    }

    pub fn like_count(&self, post_id: i64) -> ServiceResult<i64> {
        Ok(self.likes().count_for_post(post_id)?)
    }

    /// Whether the viewer likes the post; always false for anonymous viewers
    pub fn liked_by(&self, viewer: &Viewer, post_id: i64) -> ServiceResult<bool> {
        match viewer.user_id() {
            Some(user_id) => Ok(self.likes().is_liked(user_id, post_id)?),
            None => Ok(false),
        }
    }

    pub fn create_post(
        &self,
        viewer: &Viewer,
        image_url: &str,
        caption: Option<&str>,
    ) -> ServiceResult<Post> {
        let author_id = viewer.require()?;
        let image_url = validation::required("Image URL", image_url)?;
        let caption = validation::optional(caption);

        let post = self.posts().create(author_id, image_url, caption)?;
        tracing::info!("User {} created post {}", author_id, post.id);
        Ok(post)
    }

    pub fn add_comment(&self, viewer: &Viewer, post_id: i64, text: &str) -> ServiceResult<Comment> {
        let author_id = viewer.require()?;
        let text = validation::required("Comment text", text)?;
        self.existing_post(post_id)?;

        let comment = self.comments().create(post_id, author_id, text)?;
        tracing::debug!("User {} commented on post {}", author_id, post_id);
        Ok(comment)
    }

    /// Like the post if the viewer has not, unlike it otherwise.
    ///
    /// Returns the post so its like fields can be resolved against the new state.
    pub fn toggle_like(&self, viewer: &Viewer, post_id: i64) -> ServiceResult<Post> {
        let user_id = viewer.require()?;
        let post = self.existing_post(post_id)?;

        match self.likes().toggle(user_id, post_id)? {
            LikeToggle::Liked => tracing::debug!("User {} liked post {}", user_id, post_id),
            LikeToggle::Unliked => tracing::debug!("User {} unliked post {}", user_id, post_id),
        }
        Ok(post)
    }

    /// Delete one of the viewer's posts together with its likes and comments.
    ///
    /// Never fails: every outcome is described by the returned response.
    pub fn delete_post(&self, viewer: &Viewer, raw_id: &str) -> DeletePostResponse {
        let user_id = match viewer.require() {
            Ok(id) => id,
            Err(_) => {
                return DeletePostResponse::failed(
                    None,
                    ErrorCode::Unauthenticated,
                    "Authentication required",
                )
            }
        };

        let post_id = match parse_id(raw_id, "post") {
            Ok(id) => id,
            Err(e) => return DeletePostResponse::failed(None, e.code(), e.to_string()),
        };

        let post = match self.posts().get_by_id(post_id) {
            Ok(Some(post)) => post,
            Ok(None) => {
                return DeletePostResponse::failed(Some(post_id), ErrorCode::NotFound, "Post not found")
            }
            Err(e) => {
                tracing::error!("Failed to load post {} for deletion: {:#}", post_id, e);
                return Self::delete_failed(post_id);
            }
        };

        if post.author_id != user_id {
            tracing::warn!(
                "User {} tried to delete post {} owned by {}",
                user_id,
                post_id,
                post.author_id
            );
            return DeletePostResponse::failed(
                Some(post_id),
                ErrorCode::Forbidden,
                "Not authorized to delete this post",
            );
        }

        match self.posts().delete_with_dependents(post_id) {
            Ok(Some(removed)) => {
                tracing::info!(
                    "Deleted post {} with {} likes and {} comments",
                    post_id,
                    removed.likes,
                    removed.comments
                );
                DeletePostResponse::deleted(post_id)
            }
            // Deleted concurrently between the ownership check and the transaction
            Ok(None) => {
                DeletePostResponse::failed(Some(post_id), ErrorCode::NotFound, "Post not found")
            }
            Err(e) => {
                tracing::error!("Error deleting post {}: {:#}", post_id, e);
                Self::delete_failed(post_id)
            }
        }
    }

    fn delete_failed(post_id: i64) -> DeletePostResponse {
        DeletePostResponse::failed(
            Some(post_id),
            ErrorCode::InternalServerError,
            "Failed to delete post due to server error",
        )
    }
}
