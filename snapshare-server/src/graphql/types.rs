use async_graphql::{Context, Object, Result, ID};
use chrono::{DateTime, Utc};

use snapshare_types::{AuthPayload, Comment, DeletePostResponse, ErrorCode, Post, User};

use super::error::GraphqlResultExt;
use super::{app_state, viewer};
use crate::service::ServiceError;

fn id(value: i64) -> ID {
    ID(value.to_string())
}

pub struct UserNode(pub User);

#[Object(name = "User")]
impl UserNode {
    async fn id(&self) -> ID {
        id(self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn bio(&self) -> Option<&str> {
        self.0.bio.as_deref()
    }

    async fn avatar_url(&self) -> Option<&str> {
        self.0.avatar_url.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    /// Posts by this user, newest first
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<PostNode>> {
        let posts = app_state(ctx).posts().posts_by_user(self.0.id).gql()?;
        Ok(posts.into_iter().map(PostNode).collect())
    }
}

pub struct PostNode(pub Post);

#[Object(name = "Post")]
impl PostNode {
    async fn id(&self) -> ID {
        id(self.0.id)
    }

    async fn image_url(&self) -> &str {
        &self.0.image_url
    }

    async fn caption(&self) -> Option<&str> {
        self.0.caption.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    async fn author(&self, ctx: &Context<'_>) -> Result<UserNode> {
        let author = app_state(ctx).accounts().get_user(self.0.author_id).gql()?;
        author.map(UserNode).ok_or_else(|| {
            missing_row(format!(
                "Author {} not found for post {}",
                self.0.author_id, self.0.id
            ))
        })
    }

    /// Comments in the order they were written
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<CommentNode>> {
        let comments = app_state(ctx).posts().comments_by_post(self.0.id).gql()?;
        Ok(comments.into_iter().map(CommentNode).collect())
    }

    async fn like_count(&self, ctx: &Context<'_>) -> Result<i64> {
        app_state(ctx).posts().like_count(self.0.id).gql()
    }

    async fn liked_by_current_user(&self, ctx: &Context<'_>) -> Result<bool> {
        app_state(ctx)
            .posts()
            .liked_by(&viewer(ctx), self.0.id)
            .gql()
    }
}

pub struct CommentNode(pub Comment);

#[Object(name = "Comment")]
impl CommentNode {
    async fn id(&self) -> ID {
        id(self.0.id)
    }

    async fn text(&self) -> &str {
        &self.0.text
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    async fn author(&self, ctx: &Context<'_>) -> Result<UserNode> {
        let author = app_state(ctx).accounts().get_user(self.0.author_id).gql()?;
        author.map(UserNode).ok_or_else(|| {
            missing_row(format!(
                "Author {} not found for comment {}",
                self.0.author_id, self.0.id
            ))
        })
    }

    async fn post(&self, ctx: &Context<'_>) -> Result<Option<PostNode>> {
        let post = app_state(ctx).posts().get_post(self.0.post_id).gql()?;
        Ok(post.map(PostNode))
    }
}

// Foreign keys make this unreachable unless the data is corrupt
fn missing_row(detail: String) -> async_graphql::Error {
    use async_graphql::ErrorExtensions;
    ServiceError::Internal(anyhow::anyhow!("Data integrity issue: {}", detail)).extend()
}

pub struct AuthPayloadNode(pub AuthPayload);

#[Object(name = "AuthPayload")]
impl AuthPayloadNode {
    async fn token(&self) -> &str {
        &self.0.token
    }

    async fn user(&self) -> UserNode {
        UserNode(self.0.user.clone())
    }
}

pub struct DeletePostResult(pub DeletePostResponse);

#[Object(name = "DeletePostResponse")]
impl DeletePostResult {
    async fn success(&self) -> bool {
        self.0.success
    }

    async fn message(&self) -> &str {
        &self.0.message
    }

    async fn id(&self) -> Option<ID> {
        self.0.id.map(id)
    }

    /// Why the deletion failed; null on success
    async fn code(&self) -> Option<ErrorCode> {
        self.0.code
    }
}
