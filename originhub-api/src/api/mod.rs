mod chats;
mod comments;
mod ideas;
mod updates;
mod upvotes;
mod users;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Extension, Json, Router};
use originhub_app::AppContext;
use originhub_errors::AppError;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

const USER_HEADER: &str = "x-user-id";
const ADMIN_HEADER: &str = "x-admin-token";

/// Success envelope. Failures use the same shape through `AppError`.
#[derive(Debug, Serialize)]
pub(crate) struct ApiResponse<T> {
    success: bool,
    data: T,
    message: String,
}

pub(crate) type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

pub(crate) fn respond<T>(data: T, message: impl Into<String>) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data,
        message: message.into(),
    }))
}

pub(crate) fn created<T>(
    data: T,
    message: impl Into<String>,
) -> Result<(StatusCode, Json<ApiResponse<T>>), AppError> {
    let body = respond(data, message)?;
    Ok((StatusCode::CREATED, body))
}

/// Same envelope around `data` that is already JSON text.
pub(crate) fn respond_raw(data: String, message: impl Into<String>) -> Result<Response, AppError> {
    let message = serde_json::to_string(&message.into())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let body = format!(r#"{{"success":true,"data":{data},"message":{message}}}"#);
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// The caller's identity, taken from `X-User-Id`. Token verification is the
/// identity provider's job upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CurrentUser(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_header(parts).map(CurrentUser).ok_or(AppError::Unauthenticated)
    }
}

/// Like `CurrentUser` for routes that also serve anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MaybeUser(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_header(parts)))
    }
}

/// Shared secret for operator routes. `None` keeps those routes closed.
#[derive(Debug, Clone)]
pub(crate) struct AdminToken(Option<Arc<str>>);

/// Present only when `X-Admin-Token` matches the configured secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AdminAccess;

impl<S: Send + Sync> FromRequestParts<S> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let expected = parts
            .extensions
            .get::<AdminToken>()
            .and_then(|token| token.0.clone());
        let Some(expected) = expected else {
            return Err(AppError::PermissionDenied(
                "Operator routes are disabled".to_string(),
            ));
        };

        match header_value(parts, ADMIN_HEADER) {
            Some(given) if given == *expected => Ok(AdminAccess),
            _ => Err(AppError::PermissionDenied(
                "A valid X-Admin-Token header is required".to_string(),
            )),
        }
    }
}

fn user_header(parts: &Parts) -> Option<String> {
    header_value(parts, USER_HEADER)
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// `admin_token` guards the user sync and recount routes.
pub fn router(app_context: AppContext, admin_token: Option<String>) -> Router {
    let admin_token = AdminToken(
        admin_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .map(Arc::from),
    );

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ideas", get(ideas::list_ideas).post(ideas::create_idea))
        .route(
            "/ideas/{id}",
            get(ideas::get_idea)
                .put(ideas::update_idea)
                .delete(ideas::delete_idea),
        )
        .route("/ideas/{id}/views", post(ideas::record_view))
        .route(
            "/ideas/{id}/upvote",
            get(upvotes::upvote_status)
                .post(upvotes::add_upvote)
                .delete(upvotes::remove_upvote),
        )
        .route("/ideas/{id}/upvotes/recount", post(upvotes::recount_idea))
        .route("/maintenance/recount-upvotes", post(upvotes::recount_all))
        .route(
            "/ideas/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/ideas/{id}/comments/{comment_id}",
            patch(comments::edit_comment).delete(comments::delete_comment),
        )
        .route(
            "/users/{user_id}",
            put(users::upsert_user).delete(users::remove_user),
        )
        .route("/chats", get(chats::list_chats).post(chats::create_chat))
        .route("/chats/empty", get(chats::empty_chat))
        .route(
            "/chats/{chat_id}",
            patch(chats::rename_chat).delete(chats::delete_chat),
        )
        .route(
            "/chats/{chat_id}/messages",
            get(chats::list_messages).post(chats::post_message),
        )
        .route("/ws/ideas/{id}/updates", get(updates::idea_updates))
        .layer(Extension(admin_token))
        .with_state(app_context)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "OriginHub API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<serde_json::Value>) {
    if ctx.ping_database().await {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "healthy", "database": "up" })),
        )
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unhealthy", "database": "down" })),
        )
    }
}
