use async_graphql::{Context, Object, Result, ID};

use super::error::GraphqlResultExt;
use super::types::{CommentNode, PostNode, UserNode};
use super::{app_state, viewer};
use crate::service::parse_id;

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every post, newest first
    async fn all_posts(&self, ctx: &Context<'_>) -> Result<Vec<PostNode>> {
        let posts = app_state(ctx).posts().all_posts().gql()?;
        Ok(posts.into_iter().map(PostNode).collect())
    }

    async fn posts_by_user(&self, ctx: &Context<'_>, user_id: ID) -> Result<Vec<PostNode>> {
        let user_id = parse_id(&user_id, "user").gql()?;
        let posts = app_state(ctx).posts().posts_by_user(user_id).gql()?;
        Ok(posts.into_iter().map(PostNode).collect())
    }

    /// Comments on a post, oldest first
    #[graphql(name = "CommentsByPost")]
    async fn comments_by_post(&self, ctx: &Context<'_>, post_id: ID) -> Result<Vec<CommentNode>> {
        let post_id = parse_id(&post_id, "post").gql()?;
        let comments = app_state(ctx).posts().comments_by_post(post_id).gql()?;
        Ok(comments.into_iter().map(CommentNode).collect())
    }

    /// The authenticated caller
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<UserNode>> {
        let me = app_state(ctx).accounts().me(&viewer(ctx)).gql()?;
        Ok(me.map(UserNode))
    }

    async fn all_users(&self, ctx: &Context<'_>) -> Result<Vec<UserNode>> {
        let users = app_state(ctx).accounts().all_users().gql()?;
        Ok(users.into_iter().map(UserNode).collect())
    }

    /// Profile by username; the caller's own profile when no username is given
    async fn user_profile(
        &self,
        ctx: &Context<'_>,
        username: Option<String>,
    ) -> Result<Option<UserNode>> {
        let user = app_state(ctx)
            .accounts()
            .user_profile(&viewer(ctx), username.as_deref())
            .gql()?;
        Ok(user.map(UserNode))
    }
}
