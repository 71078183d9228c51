use crate::domain::{Chat, ChatMessage, Sender};
use crate::infrastructure::db::entities::chat;
use crate::infrastructure::db::{self, ChatRepository};
use crate::infrastructure::security::InputSanitizer;
use originhub_errors::AppError;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use uuid::Uuid;

/// Stored conversations between a user and the assistant. Only the owner
/// of a chat can read or change it. Replies are written by the caller;
/// nothing here talks to a model.
#[derive(Clone)]
pub struct ChatHistory {
    db: DatabaseConnection,
}

impl ChatHistory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_chat(&self, user_id: &str) -> Result<Chat, AppError> {
        let chat = Chat::new(user_id.to_string());
        let model = ChatRepository::new(&self.db)
            .create(&chat)
            .await
            .map_err(|err| unknown_user(err, user_id))?;

        tracing::info!(chat_id = %model.id, user_id, "Chat created");
        Ok(model.into())
    }

    pub async fn get_chat(&self, chat_id: Uuid, user_id: &str) -> Result<Chat, AppError> {
        owned_chat(&self.db, chat_id, user_id).await.map(Chat::from)
    }

    pub async fn get_user_chats(&self, user_id: &str) -> Result<Vec<Chat>, AppError> {
        let models = ChatRepository::new(&self.db)
            .list_for_user(user_id)
            .await
            .map_err(db::storage_error)?;
        Ok(models.into_iter().map(Chat::from).collect())
    }

    /// Lets a client reuse a blank chat instead of piling up new ones.
    pub async fn get_empty_chat(&self, user_id: &str) -> Result<Option<Chat>, AppError> {
        let model = ChatRepository::new(&self.db)
            .find_empty_for_user(user_id)
            .await
            .map_err(db::storage_error)?;
        Ok(model.map(Chat::from))
    }

    /// Appends a message and bumps the chat's `last_message_at` in one
    /// transaction.
    pub async fn save_message(
        &self,
        chat_id: Uuid,
        user_id: &str,
        sender: Sender,
        message: &str,
    ) -> Result<ChatMessage, AppError> {
        let message = InputSanitizer::require_text("message", message)?;
        let user_id = user_id.to_string();

        let saved = self
            .db
            .transaction::<_, ChatMessage, AppError>(move |txn| {
                Box::pin(async move {
                    owned_chat(txn, chat_id, &user_id).await?;

                    let entry = ChatMessage::new(chat_id, sender, message);
                    let repo = ChatRepository::new(txn);
                    repo.create_message(&entry)
                        .await
                        .map_err(db::storage_error)?;
                    repo.touch(chat_id, entry.created_at)
                        .await
                        .map_err(db::storage_error)?;
                    Ok(entry)
                })
            })
            .await
            .map_err(db::transaction_error)?;

        tracing::debug!(%chat_id, sender = %saved.sender, "Chat message saved");
        Ok(saved)
    }

    pub async fn get_chat_messages(
        &self,
        chat_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<ChatMessage>, AppError> {
        owned_chat(&self.db, chat_id, user_id).await?;
        ChatRepository::new(&self.db)
            .list_messages(chat_id)
            .await
            .map_err(db::storage_error)?
            .into_iter()
            .map(ChatMessage::try_from)
            .collect()
    }

    pub async fn update_chat_title(
        &self,
        chat_id: Uuid,
        user_id: &str,
        title: &str,
    ) -> Result<Chat, AppError> {
        let title = InputSanitizer::require_short_text("title", title)?;
        let existing = owned_chat(&self.db, chat_id, user_id).await?;

        let updated = ChatRepository::new(&self.db)
            .set_title(existing, title)
            .await
            .map_err(db::storage_error)?;
        Ok(updated.into())
    }

    /// Messages are removed with the chat by the database.
    pub async fn delete_chat(&self, chat_id: Uuid, user_id: &str) -> Result<(), AppError> {
        owned_chat(&self.db, chat_id, user_id).await?;

        let removed = ChatRepository::new(&self.db)
            .delete(chat_id)
            .await
            .map_err(db::storage_error)?;
        if removed == 0 {
            return Err(AppError::ChatNotFound(chat_id.to_string()));
        }

        tracing::info!(%chat_id, "Chat deleted");
        Ok(())
    }
}

async fn owned_chat<C: ConnectionTrait>(
    conn: &C,
    chat_id: Uuid,
    user_id: &str,
) -> Result<chat::Model, AppError> {
    let model = ChatRepository::new(conn)
        .find_by_id(chat_id)
        .await
        .map_err(db::storage_error)?
        .ok_or_else(|| AppError::ChatNotFound(chat_id.to_string()))?;

    if model.user_id != user_id {
        return Err(AppError::PermissionDenied(
            "You can only access your own chats".to_string(),
        ));
    }
    Ok(model)
}

fn unknown_user(err: DbErr, user_id: &str) -> AppError {
    if db::is_foreign_key_violation(&err) {
        AppError::Validation(format!("Unknown user {user_id}"))
    } else {
        db::storage_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::UserDirectory;
    use crate::infrastructure::db::test_support::{seed_user, setup_db};

    #[tokio::test]
    async fn test_conversation_round() {
        let db = setup_db().await;
        let chats = ChatHistory::new(db.clone());
        let user = seed_user(&db, "user_a").await;

        let chat = chats.create_chat(&user).await.unwrap();
        assert_eq!(chat.title, None);
        let before = chats.get_chat(chat.id, &user).await.unwrap();

        chats
            .save_message(chat.id, &user, Sender::User, "  How do I validate a market? ")
            .await
            .unwrap();
        chats
            .save_message(chat.id, &user, Sender::Assistant, "Talk to ten customers.")
            .await
            .unwrap();

        let messages = chats.get_chat_messages(chat.id, &user).await.unwrap();
        let transcript: Vec<_> = messages
            .iter()
            .map(|m| (m.sender, m.message.as_str()))
            .collect();
        assert_eq!(
            transcript,
            vec![
                (Sender::User, "How do I validate a market?"),
                (Sender::Assistant, "Talk to ten customers."),
            ]
        );

        let refreshed = chats.get_chat(chat.id, &user).await.unwrap();
        assert!(refreshed.last_message_at > before.last_message_at);
        assert_eq!(refreshed.created_at, before.created_at);

        let titled = chats
            .update_chat_title(chat.id, &user, " Market validation ")
            .await
            .unwrap();
        assert_eq!(titled.title.as_deref(), Some("Market validation"));
    }

    #[tokio::test]
    async fn test_blank_message_and_unknown_user_are_rejected() {
        let db = setup_db().await;
        let chats = ChatHistory::new(db.clone());
        let user = seed_user(&db, "user_a").await;
        let chat = chats.create_chat(&user).await.unwrap();

        assert!(matches!(
            chats.save_message(chat.id, &user, Sender::User, "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            chats.create_chat("nobody").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            chats.save_message(Uuid::new_v4(), &user, Sender::User, "hi").await,
            Err(AppError::ChatNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_chats_are_private_to_their_owner() {
        let db = setup_db().await;
        let chats = ChatHistory::new(db.clone());
        let owner = seed_user(&db, "owner").await;
        let stranger = seed_user(&db, "stranger").await;
        let chat = chats.create_chat(&owner).await.unwrap();
        chats
            .save_message(chat.id, &owner, Sender::User, "secret plan")
            .await
            .unwrap();

        fn denied(result: Result<(), AppError>) -> bool {
            matches!(result, Err(AppError::PermissionDenied(_)))
        }
        assert!(denied(chats.get_chat(chat.id, &stranger).await.map(|_| ())));
        assert!(denied(chats.get_chat_messages(chat.id, &stranger).await.map(|_| ())));
        assert!(denied(
            chats
                .save_message(chat.id, &stranger, Sender::User, "me too")
                .await
                .map(|_| ())
        ));
        assert!(denied(
            chats
                .update_chat_title(chat.id, &stranger, "Mine now")
                .await
                .map(|_| ())
        ));
        assert!(denied(chats.delete_chat(chat.id, &stranger).await));

        assert!(chats.get_user_chats(&stranger).await.unwrap().is_empty());
        assert_eq!(chats.get_chat_messages(chat.id, &owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_chats_most_recent_activity_first() {
        let db = setup_db().await;
        let chats = ChatHistory::new(db.clone());
        let user = seed_user(&db, "user_a").await;

        let older = chats.create_chat(&user).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = chats.create_chat(&user).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        chats
            .save_message(older.id, &user, Sender::User, "back to this one")
            .await
            .unwrap();

        let ids: Vec<_> = chats
            .get_user_chats(&user)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[tokio::test]
    async fn test_empty_chat_is_the_newest_without_messages() {
        let db = setup_db().await;
        let chats = ChatHistory::new(db.clone());
        let user = seed_user(&db, "user_a").await;

        assert_eq!(chats.get_empty_chat(&user).await.unwrap(), None);

        let blank_old = chats.create_chat(&user).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let blank_new = chats.create_chat(&user).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let used = chats.create_chat(&user).await.unwrap();
        chats
            .save_message(used.id, &user, Sender::User, "hello")
            .await
            .unwrap();

        let found = chats.get_empty_chat(&user).await.unwrap().unwrap();
        assert_eq!(found.id, blank_new.id);

        chats
            .save_message(blank_new.id, &user, Sender::User, "now used")
            .await
            .unwrap();
        let found = chats.get_empty_chat(&user).await.unwrap().unwrap();
        assert_eq!(found.id, blank_old.id);
    }

    #[tokio::test]
    async fn test_delete_chat_takes_its_messages() {
        let db = setup_db().await;
        let chats = ChatHistory::new(db.clone());
        let user = seed_user(&db, "user_a").await;
        let chat = chats.create_chat(&user).await.unwrap();
        chats
            .save_message(chat.id, &user, Sender::User, "one")
            .await
            .unwrap();
        chats
            .save_message(chat.id, &user, Sender::Assistant, "two")
            .await
            .unwrap();

        chats.delete_chat(chat.id, &user).await.unwrap();

        assert_eq!(
            ChatRepository::new(&db).count_messages(chat.id).await.unwrap(),
            0
        );
        assert!(matches!(
            chats.get_chat(chat.id, &user).await,
            Err(AppError::ChatNotFound(_))
        ));
        assert!(matches!(
            chats.delete_chat(chat.id, &user).await,
            Err(AppError::ChatNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_removing_the_user_removes_their_chats() {
        let db = setup_db().await;
        let chats = ChatHistory::new(db.clone());
        let user = seed_user(&db, "user_a").await;
        let chat = chats.create_chat(&user).await.unwrap();
        chats
            .save_message(chat.id, &user, Sender::User, "bye")
            .await
            .unwrap();

        assert!(UserDirectory::new(db.clone()).remove(&user).await.unwrap());

        assert!(chats.get_user_chats(&user).await.unwrap().is_empty());
        assert_eq!(
            ChatRepository::new(&db).count_messages(chat.id).await.unwrap(),
            0
        );
    }
}
