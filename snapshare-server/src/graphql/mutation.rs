use async_graphql::{Context, Object, Result, ID};

use super::error::GraphqlResultExt;
use super::types::{AuthPayloadNode, CommentNode, DeletePostResult, PostNode, UserNode};
use super::{app_state, viewer};
use crate::service::{parse_id, ProfileChanges};

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn signup(
        &self,
        ctx: &Context<'_>,
        name: String,
        username: String,
        email: String,
        password: String,
    ) -> Result<AuthPayloadNode> {
        let payload = app_state(ctx)
            .accounts()
            .signup(&name, &username, &email, &password)
            .gql()?;
        Ok(AuthPayloadNode(payload))
    }

    /// Log in with a username or an email address
    async fn login(
        &self,
        ctx: &Context<'_>,
        login_identifier: String,
        password: String,
    ) -> Result<Option<AuthPayloadNode>> {
        let payload = app_state(ctx)
            .accounts()
            .login(&login_identifier, &password)
            .gql()?;
        Ok(Some(AuthPayloadNode(payload)))
    }

    async fn create_post(
        &self,
        ctx: &Context<'_>,
        image_url: String,
        caption: Option<String>,
    ) -> Result<PostNode> {
        let post = app_state(ctx)
            .posts()
            .create_post(&viewer(ctx), &image_url, caption.as_deref())
            .gql()?;
        Ok(PostNode(post))
    }

    /// Delete one of your own posts. Failures are reported in the payload.
    async fn delete_post(&self, ctx: &Context<'_>, id: ID) -> DeletePostResult {
        DeletePostResult(app_state(ctx).posts().delete_post(&viewer(ctx), &id))
    }

    async fn toggle_like(&self, ctx: &Context<'_>, post_id: ID) -> Result<PostNode> {
        let post_id = parse_id(&post_id, "post").gql()?;
        let post = app_state(ctx)
            .posts()
            .toggle_like(&viewer(ctx), post_id)
            .gql()?;
        Ok(PostNode(post))
    }

    async fn add_comment(
        &self,
        ctx: &Context<'_>,
        post_id: ID,
        text: String,
    ) -> Result<CommentNode> {
        let post_id = parse_id(&post_id, "post").gql()?;
        let comment = app_state(ctx)
            .posts()
            .add_comment(&viewer(ctx), post_id, &text)
            .gql()?;
        Ok(CommentNode(comment))
    }

    async fn update_profile(
        &self,
        ctx: &Context<'_>,
        name: String,
        username: String,
        email: String,
        bio: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<UserNode> {
        let changes = ProfileChanges {
            name,
            username,
            email,
            bio,
            avatar_url,
        };
        let user = app_state(ctx)
            .accounts()
            .update_profile(&viewer(ctx), &changes)
            .gql()?;
        Ok(UserNode(user))
    }
}
