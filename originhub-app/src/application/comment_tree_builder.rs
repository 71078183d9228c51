use crate::domain::{assemble_tree, Comment, CommentNode, NewComment};
use crate::infrastructure::db::{self, CommentRepository, IdeaRepository};
use crate::infrastructure::security::InputSanitizer;
use originhub_errors::AppError;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use uuid::Uuid;

/// Threaded discussions under ideas.
#[derive(Clone)]
pub struct CommentTreeBuilder {
    db: DatabaseConnection,
}

impl CommentTreeBuilder {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// A reply must point at an existing comment on the same idea.
    pub async fn validate_parent(&self, idea_id: Uuid, parent_id: Uuid) -> Result<(), AppError> {
        check_parent(&self.db, idea_id, parent_id).await
    }

    pub async fn create_comment(
        &self,
        idea_id: Uuid,
        author_id: &str,
        input: NewComment,
    ) -> Result<Comment, AppError> {
        let content = InputSanitizer::validate_comment(&input.content)?;
        let comment = Comment::new(
            idea_id,
            author_id.to_string(),
            content,
            input.parent_comment_id,
        );

        // Parent check and insert share a transaction so the parent cannot
        // disappear in between.
        let created = self
            .db
            .transaction::<_, Comment, AppError>(move |txn| {
                Box::pin(async move {
                    IdeaRepository::new(txn)
                        .find_by_id(idea_id)
                        .await
                        .map_err(db::storage_error)?
                        .ok_or_else(|| AppError::IdeaNotFound(idea_id.to_string()))?;

                    if let Some(parent_id) = comment.parent_comment_id {
                        check_parent(txn, idea_id, parent_id).await?;
                    }

                    CommentRepository::new(txn)
                        .create(&comment)
                        .await
                        .map_err(|err| insert_error(err, &comment.author_id))?;
                    Ok(comment)
                })
            })
            .await
            .map_err(db::transaction_error)?;

        tracing::info!(
            comment_id = %created.id,
            %idea_id,
            reply = !created.is_top_level(),
            "Comment created"
        );
        Ok(created)
    }

    /// The whole discussion for an idea, fetched in one query.
    pub async fn build_tree(&self, idea_id: Uuid) -> Result<Vec<CommentNode>, AppError> {
        let comments = CommentRepository::new(&self.db)
            .list_for_idea(idea_id)
            .await
            .map_err(db::storage_error)?;

        Ok(assemble_tree(comments.into_iter().map(Comment::from).collect()))
    }

    pub async fn edit_comment(
        &self,
        comment_id: Uuid,
        user_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let content = InputSanitizer::validate_comment(content)?;
        let repo = CommentRepository::new(&self.db);

        let existing = repo
            .find_by_id(comment_id)
            .await
            .map_err(db::storage_error)?
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;

        if existing.user_id != user_id {
            return Err(AppError::PermissionDenied(
                "You can only edit your own comments".to_string(),
            ));
        }

        let updated = repo
            .update_content(existing, content)
            .await
            .map_err(db::storage_error)?;
        Ok(updated.into())
    }

    /// Removes the comment and, through the cascade, every reply under it.
    /// Allowed for the comment's author and for the owner of the idea.
    pub async fn delete_comment(&self, comment_id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let repo = CommentRepository::new(&self.db);

        let existing = repo
            .find_by_id(comment_id)
            .await
            .map_err(db::storage_error)?
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;

        if existing.user_id != user_id {
            let idea_owner = IdeaRepository::new(&self.db)
                .find_by_id(existing.idea_id)
                .await
                .map_err(db::storage_error)?
                .and_then(|idea| idea.user_id);
            if idea_owner.as_deref() != Some(user_id) {
                return Err(AppError::PermissionDenied(
                    "You can only delete your own comments".to_string(),
                ));
            }
        }

        // Gone already, e.g. through a concurrent delete of an ancestor.
        let removed = repo.delete(comment_id).await.map_err(db::storage_error)?;
        if removed == 0 {
            return Err(AppError::CommentNotFound(comment_id.to_string()));
        }
        tracing::info!(%comment_id, idea_id = %existing.idea_id, "Comment deleted");
        Ok(true)
    }
}

async fn check_parent<C: ConnectionTrait>(
    conn: &C,
    idea_id: Uuid,
    parent_id: Uuid,
) -> Result<(), AppError> {
    let parent = CommentRepository::new(conn)
        .find_by_id(parent_id)
        .await
        .map_err(db::storage_error)?
        .ok_or_else(|| AppError::ParentNotFound(parent_id.to_string()))?;

    if parent.idea_id != idea_id {
        return Err(AppError::ParentIdeaMismatch {
            idea_id: idea_id.to_string(),
            parent_idea_id: parent.idea_id.to_string(),
        });
    }
    Ok(())
}

fn insert_error(err: DbErr, author_id: &str) -> AppError {
    if db::is_foreign_key_violation(&err) {
        AppError::Validation(format!("Unknown user {author_id}"))
    } else {
        db::storage_error(err)
    }
}
