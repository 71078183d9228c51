use super::{respond, AdminAccess, ApiResult};
use axum::extract::{Path, State};
use axum::Json;
use originhub_app::domain::User;
use originhub_app::AppContext;
use serde::{Deserialize, Serialize};

/// Profile fields pushed by the identity provider. The id comes from the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserSync {
    email: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    bio: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserRemoved {
    removed: bool,
}

pub(crate) async fn upsert_user(
    _admin: AdminAccess,
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
    Json(sync): Json<UserSync>,
) -> ApiResult<User> {
    let user = ctx
        .users
        .upsert(User {
            user_id,
            email: sync.email,
            first_name: sync.first_name,
            last_name: sync.last_name,
            bio: sync.bio,
        })
        .await?;
    respond(user, "User synced")
}

pub(crate) async fn remove_user(
    _admin: AdminAccess,
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> ApiResult<UserRemoved> {
    let removed = ctx.users.remove(&user_id).await?;
    let message = if removed { "User removed" } else { "User not found" };
    respond(UserRemoved { removed }, message)
}
