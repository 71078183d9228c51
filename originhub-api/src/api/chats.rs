use super::{created, respond, ApiResponse, ApiResult, CurrentUser};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use originhub_app::domain::{Chat, ChatMessage, Sender};
use originhub_app::AppContext;
use originhub_errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub(crate) struct RenameChatRequest {
    title: String,
}

/// `sender` defaults to `user`. Anything but `user` or `assistant` is a 400.
#[derive(Debug, Deserialize)]
pub(crate) struct PostMessageRequest {
    #[serde(default)]
    sender: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatTranscript {
    chat_id: Uuid,
    messages: Vec<ChatMessage>,
    total: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatDeleted {
    deleted: bool,
}

pub(crate) async fn create_chat(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<ApiResponse<Chat>>), AppError> {
    let chat = ctx.chats.create_chat(&user).await?;
    created(chat, "Chat created")
}

pub(crate) async fn list_chats(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Chat>> {
    let chats = ctx.chats.get_user_chats(&user).await?;
    let message = format!("Retrieved {} chats", chats.len());
    respond(chats, message)
}

/// `data` is null when every chat already has messages.
pub(crate) async fn empty_chat(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Option<Chat>> {
    let chat = ctx.chats.get_empty_chat(&user).await?;
    let message = if chat.is_some() {
        "Empty chat found"
    } else {
        "No empty chat"
    };
    respond(chat, message)
}

pub(crate) async fn rename_chat(
    State(ctx): State<AppContext>,
    Path(chat_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<RenameChatRequest>,
) -> ApiResult<Chat> {
    let chat = ctx
        .chats
        .update_chat_title(chat_id, &user, &request.title)
        .await?;
    respond(chat, "Chat title updated")
}

pub(crate) async fn delete_chat(
    State(ctx): State<AppContext>,
    Path(chat_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ChatDeleted> {
    ctx.chats.delete_chat(chat_id, &user).await?;
    respond(ChatDeleted { deleted: true }, "Chat deleted")
}

pub(crate) async fn list_messages(
    State(ctx): State<AppContext>,
    Path(chat_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ChatTranscript> {
    let messages = ctx.chats.get_chat_messages(chat_id, &user).await?;
    let total = messages.len();
    respond(
        ChatTranscript {
            chat_id,
            messages,
            total,
        },
        format!("Retrieved {total} messages"),
    )
}

pub(crate) async fn post_message(
    State(ctx): State<AppContext>,
    Path(chat_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ChatMessage>>), AppError> {
    let sender = match request.sender.as_deref().map(str::trim) {
        None | Some("") => Sender::User,
        Some(raw) => raw.parse()?,
    };
    let saved = ctx
        .chats
        .save_message(chat_id, &user, sender, &request.message)
        .await?;
    created(saved, "Message saved")
}
