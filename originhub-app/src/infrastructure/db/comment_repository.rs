use super::entities::comment;
use crate::domain::Comment;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use uuid::Uuid;

pub struct CommentRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> CommentRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, comment_data: &Comment) -> Result<comment::Model, DbErr> {
        let active = comment::ActiveModel {
            id: Set(comment_data.id),
            idea_id: Set(comment_data.idea_id),
            user_id: Set(comment_data.author_id.clone()),
            content: Set(comment_data.content.clone()),
            parent_comment_id: Set(comment_data.parent_comment_id),
            created_at: Set(comment_data.created_at),
            updated_at: Set(comment_data.updated_at),
        };
        active.insert(self.conn).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<comment::Model>, DbErr> {
        comment::Entity::find_by_id(id).one(self.conn).await
    }

    /// Every comment on the idea, all depths, in one query.
    pub async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<comment::Model>, DbErr> {
        comment::Entity::find()
            .filter(comment::Column::IdeaId.eq(idea_id))
            .order_by_desc(comment::Column::CreatedAt)
            .all(self.conn)
            .await
    }

    pub async fn update_content(
        &self,
        model: comment::Model,
        content: String,
    ) -> Result<comment::Model, DbErr> {
        let mut active: comment::ActiveModel = model.into();
        active.content = Set(content);
        active.updated_at = Set(Some(chrono::Utc::now()));
        active.update(self.conn).await
    }

    /// Replies are removed by the `ON DELETE CASCADE` on `parent_comment_id`.
    pub async fn delete(&self, id: Uuid) -> Result<u64, DbErr> {
        let result = comment::Entity::delete_by_id(id).exec(self.conn).await?;
        Ok(result.rows_affected)
    }
}

impl From<comment::Model> for Comment {
    fn from(model: comment::Model) -> Self {
        Self {
            id: model.id,
            idea_id: model.idea_id,
            author_id: model.user_id,
            parent_comment_id: model.parent_comment_id,
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
