use super::entities::upvote;
use crate::domain::Upvote;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, PaginatorTrait};
use uuid::Uuid;

/// Access to the upvote ledger. The ledger, not `ideas.upvotes`, is the
/// source of truth for who upvoted what.
pub struct UpvoteRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> UpvoteRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, idea_id: Uuid, user_id: &str) -> Result<bool, DbErr> {
        let upvote = upvote::Entity::find()
            .filter(upvote::Column::UserId.eq(user_id))
            .filter(upvote::Column::IdeaId.eq(idea_id))
            .one(self.conn)
            .await?;
        Ok(upvote.is_some())
    }

    /// Fails with a unique constraint violation if the pair already exists.
    pub async fn create(&self, idea_id: Uuid, user_id: &str) -> Result<Upvote, DbErr> {
        let created_at = chrono::Utc::now();
        let active = upvote::ActiveModel {
            user_id: Set(user_id.to_string()),
            idea_id: Set(idea_id),
            created_at: Set(created_at),
        };
        upvote::Entity::insert(active)
            .exec_without_returning(self.conn)
            .await?;

        Ok(Upvote {
            user_id: user_id.to_string(),
            idea_id,
            created_at,
        })
    }

    pub async fn delete(&self, idea_id: Uuid, user_id: &str) -> Result<u64, DbErr> {
        let result = upvote::Entity::delete_many()
            .filter(upvote::Column::UserId.eq(user_id))
            .filter(upvote::Column::IdeaId.eq(idea_id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Sorted, so callers locking these ideas always lock in the same order.
    pub async fn idea_ids_for_user(&self, user_id: &str) -> Result<Vec<Uuid>, DbErr> {
        upvote::Entity::find()
            .select_only()
            .column(upvote::Column::IdeaId)
            .filter(upvote::Column::UserId.eq(user_id))
            .order_by_asc(upvote::Column::IdeaId)
            .into_tuple::<Uuid>()
            .all(self.conn)
            .await
    }

    pub async fn count_for_idea(&self, idea_id: Uuid) -> Result<u64, DbErr> {
        upvote::Entity::find()
            .filter(upvote::Column::IdeaId.eq(idea_id))
            .count(self.conn)
            .await
    }
}
