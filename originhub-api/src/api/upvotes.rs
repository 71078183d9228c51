use super::{respond, AdminAccess, ApiResult, CurrentUser};
use axum::extract::{Path, State};
use originhub_app::domain::{IdeaEvent, UpvoteAction, UpvoteStatus};
use originhub_app::AppContext;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub(crate) struct UpvoteResult {
    idea_id: Uuid,
    upvotes: i32,
    upvoted: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecountResult {
    idea_id: Uuid,
    upvotes: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecountReport {
    counts: BTreeMap<Uuid, i32>,
    failed: Vec<Uuid>,
}

pub(crate) async fn upvote_status(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<UpvoteStatus> {
    let status = ctx.upvotes.status(id, &user).await?;
    respond(status, "Upvote status retrieved")
}

pub(crate) async fn add_upvote(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<UpvoteResult> {
    let idea = ctx.upvotes.add_upvote(id, &user).await?;
    ctx.updates.publish(IdeaEvent::upvote(
        id,
        idea.upvotes,
        user,
        UpvoteAction::Upvoted,
    ));
    respond(
        UpvoteResult {
            idea_id: id,
            upvotes: idea.upvotes,
            upvoted: true,
        },
        "Idea upvoted",
    )
}

pub(crate) async fn remove_upvote(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<UpvoteResult> {
    let idea = ctx.upvotes.remove_upvote(id, &user).await?;
    ctx.updates.publish(IdeaEvent::upvote(
        id,
        idea.upvotes,
        user,
        UpvoteAction::RemovedUpvote,
    ));
    respond(
        UpvoteResult {
            idea_id: id,
            upvotes: idea.upvotes,
            upvoted: false,
        },
        "Upvote removed",
    )
}

pub(crate) async fn recount_idea(
    _admin: AdminAccess,
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<RecountResult> {
    let upvotes = ctx.upvotes.recount(id).await?;
    respond(RecountResult { idea_id: id, upvotes }, "Upvote count recomputed")
}

pub(crate) async fn recount_all(
    _admin: AdminAccess,
    State(ctx): State<AppContext>,
) -> ApiResult<RecountReport> {
    let summary = ctx.upvotes.recount_all().await?;
    let message = format!(
        "Recounted {} ideas, {} failed",
        summary.counts.len(),
        summary.failed.len()
    );
    respond(
        RecountReport {
            counts: summary.counts,
            failed: summary.failed,
        },
        message,
    )
}
