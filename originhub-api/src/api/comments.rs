use super::{created, respond, respond_raw, ApiResponse, ApiResult, CurrentUser};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use originhub_app::domain::{forest_to_json, Comment, CommentNode, NewComment};
use originhub_app::AppContext;
use originhub_errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub(crate) struct EditCommentRequest {
    content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentDeleted {
    deleted: bool,
}

/// Threads can nest arbitrarily deep, so the tree is rendered by
/// `forest_to_json` instead of a derived serializer.
pub(crate) async fn list_comments(
    State(ctx): State<AppContext>,
    Path(idea_id): Path<Uuid>,
) -> Result<Response, AppError> {
    ctx.ideas.get(idea_id).await?;

    let comments = ctx.comments.build_tree(idea_id).await?;
    let total: usize = comments.iter().map(CommentNode::subtree_size).sum();
    let tree = forest_to_json(&comments).map_err(|e| {
        tracing::error!(%idea_id, error = %e, "Failed to render comment tree");
        AppError::Internal(e.to_string())
    })?;

    respond_raw(
        format!(r#"{{"comments":{tree},"total":{total}}}"#),
        format!("Retrieved {total} comments"),
    )
}

pub(crate) async fn create_comment(
    State(ctx): State<AppContext>,
    Path(idea_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewComment>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>), AppError> {
    let comment = ctx.comments.create_comment(idea_id, &user, input).await?;
    created(comment, "Comment created successfully")
}

/// The idea segment only scopes the URL; ownership is checked on the comment.
pub(crate) async fn edit_comment(
    State(ctx): State<AppContext>,
    Path((_idea_id, comment_id)): Path<(Uuid, Uuid)>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<EditCommentRequest>,
) -> ApiResult<Comment> {
    let comment = ctx
        .comments
        .edit_comment(comment_id, &user, &request.content)
        .await?;
    respond(comment, "Comment updated")
}

pub(crate) async fn delete_comment(
    State(ctx): State<AppContext>,
    Path((_idea_id, comment_id)): Path<(Uuid, Uuid)>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<CommentDeleted> {
    let deleted = ctx.comments.delete_comment(comment_id, &user).await?;
    respond(CommentDeleted { deleted }, "Comment deleted")
}
