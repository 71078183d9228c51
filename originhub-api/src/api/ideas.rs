use super::{created, respond, ApiResponse, ApiResult, CurrentUser, MaybeUser};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use originhub_app::domain::{Idea, IdeaEvent, IdeaFilter, IdeaPatch, IdeaSort, NewIdea};
use originhub_app::AppContext;
use originhub_errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub(crate) struct ListIdeasQuery {
    search: Option<String>,
    tags: Option<String>,
    sort_by: Option<String>,
}

impl From<ListIdeasQuery> for IdeaFilter {
    fn from(query: ListIdeasQuery) -> Self {
        Self {
            search: query.search,
            tags: query.tags,
            sort: query
                .sort_by
                .as_deref()
                .map(IdeaSort::from_key)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct IdeaList {
    ideas: Vec<Idea>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdeaCreated {
    id: Uuid,
}

#[derive(Debug, Serialize)]
pub(crate) struct ViewCount {
    views: i32,
}

pub(crate) async fn list_ideas(
    State(ctx): State<AppContext>,
    Query(query): Query<ListIdeasQuery>,
) -> ApiResult<IdeaList> {
    let ideas = ctx.ideas.list(&query.into()).await?;
    let message = format!("Retrieved {} ideas", ideas.len());
    respond(IdeaList { ideas }, message)
}

pub(crate) async fn create_idea(
    State(ctx): State<AppContext>,
    MaybeUser(user): MaybeUser,
    Json(input): Json<NewIdea>,
) -> Result<(StatusCode, Json<ApiResponse<IdeaCreated>>), AppError> {
    let idea = ctx.ideas.create(input, user.as_deref()).await?;
    created(IdeaCreated { id: idea.id }, "Idea created successfully")
}

pub(crate) async fn get_idea(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Idea> {
    let idea = ctx.ideas.get(id).await?;
    respond(idea, "Idea retrieved")
}

pub(crate) async fn update_idea(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(patch): Json<IdeaPatch>,
) -> ApiResult<Idea> {
    let idea = ctx.ideas.update(id, &user, patch).await?;
    respond(idea, "Idea updated")
}

pub(crate) async fn delete_idea(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<IdeaCreated> {
    ctx.ideas.delete(id, &user).await?;
    respond(IdeaCreated { id }, "Idea deleted")
}

pub(crate) async fn record_view(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<ViewCount> {
    let views = ctx.ideas.record_view(id).await?;
    ctx.updates.publish(IdeaEvent::view(id, views));
    respond(ViewCount { views }, "View recorded")
}
