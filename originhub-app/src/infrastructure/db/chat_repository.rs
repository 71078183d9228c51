use super::entities::{chat, message};
use crate::domain::{Chat, ChatMessage, Sender};
use chrono::{DateTime, Utc};
use originhub_errors::AppError;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, PaginatorTrait};
use uuid::Uuid;

/// Chats and their messages. Messages go with their chat through the
/// `ON DELETE CASCADE` on `messages.chat_id`.
pub struct ChatRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ChatRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, chat_data: &Chat) -> Result<chat::Model, DbErr> {
        let active = chat::ActiveModel {
            id: Set(chat_data.id),
            user_id: Set(chat_data.user_id.clone()),
            title: Set(chat_data.title.clone()),
            created_at: Set(chat_data.created_at),
            last_message_at: Set(chat_data.last_message_at),
        };
        active.insert(self.conn).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<chat::Model>, DbErr> {
        chat::Entity::find_by_id(id).one(self.conn).await
    }

    /// Most recently active first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<chat::Model>, DbErr> {
        chat::Entity::find()
            .filter(chat::Column::UserId.eq(user_id))
            .order_by_desc(chat::Column::LastMessageAt)
            .order_by_desc(chat::Column::CreatedAt)
            .all(self.conn)
            .await
    }

    /// The newest chat of this user that has no messages yet.
    pub async fn find_empty_for_user(&self, user_id: &str) -> Result<Option<chat::Model>, DbErr> {
        chat::Entity::find()
            .left_join(message::Entity)
            .filter(chat::Column::UserId.eq(user_id))
            .filter(message::Column::Id.is_null())
            .order_by_desc(chat::Column::CreatedAt)
            .one(self.conn)
            .await
    }

    pub async fn set_title(&self, model: chat::Model, title: String) -> Result<chat::Model, DbErr> {
        let mut active: chat::ActiveModel = model.into();
        active.title = Set(Some(title));
        active.update(self.conn).await
    }

    pub async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = chat::Entity::update_many()
            .col_expr(chat::Column::LastMessageAt, Expr::value(at))
            .filter(chat::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, DbErr> {
        let result = chat::Entity::delete_by_id(id).exec(self.conn).await?;
        Ok(result.rows_affected)
    }

    pub async fn create_message(&self, message_data: &ChatMessage) -> Result<message::Model, DbErr> {
        let active = message::ActiveModel {
            id: Set(message_data.id),
            chat_id: Set(message_data.chat_id),
            sender: Set(message_data.sender.as_str().to_string()),
            message: Set(message_data.message.clone()),
            created_at: Set(message_data.created_at),
        };
        active.insert(self.conn).await
    }

    /// Oldest first, the order a conversation is read in.
    pub async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<message::Model>, DbErr> {
        message::Entity::find()
            .filter(message::Column::ChatId.eq(chat_id))
            .order_by_asc(message::Column::CreatedAt)
            .all(self.conn)
            .await
    }

    pub async fn count_messages(&self, chat_id: Uuid) -> Result<u64, DbErr> {
        message::Entity::find()
            .filter(message::Column::ChatId.eq(chat_id))
            .count(self.conn)
            .await
    }
}

impl From<chat::Model> for Chat {
    fn from(model: chat::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            created_at: model.created_at,
            last_message_at: model.last_message_at,
        }
    }
}

impl TryFrom<message::Model> for ChatMessage {
    type Error = AppError;

    fn try_from(model: message::Model) -> Result<Self, Self::Error> {
        let sender: Sender = model.sender.parse().map_err(|_| {
            AppError::Internal(format!(
                "message {} has unknown sender '{}'",
                model.id, model.sender
            ))
        })?;
        Ok(Self {
            id: model.id,
            chat_id: model.chat_id,
            sender,
            message: model.message,
            created_at: model.created_at,
        })
    }
}
