//! GraphQL schema served at `/graphql`.
//!
//! Resolvers are thin: they parse IDs, pull the [`Viewer`] out of the request
//! data and delegate to the services. Nested fields (`Post.author`,
//! `Post.comments`, ...) are fetched lazily, one query per field.

mod error;
mod mutation;
mod query;
mod types;

use async_graphql::http::GraphiQLSource;
use async_graphql::{Context, EmptySubscription, Schema};
use axum::{
    response::{Html, IntoResponse},
    Extension, Json,
};

use crate::auth::Viewer;
use crate::state::AppState;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(state: AppState) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .finish()
}

pub(crate) fn app_state<'a>(ctx: &Context<'a>) -> &'a AppState {
    ctx.data_unchecked::<AppState>()
}

/// Requests executed without a viewer (e.g. directly in tests) are anonymous
pub(crate) fn viewer(ctx: &Context<'_>) -> Viewer {
    ctx.data_opt::<Viewer>().copied().unwrap_or_default()
}

pub async fn graphql_handler(
    Extension(schema): Extension<AppSchema>,
    viewer: Option<Extension<Viewer>>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let viewer = viewer.map(|Extension(v)| v).unwrap_or_default();
    Json(schema.execute(request.data(viewer)).await)
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
