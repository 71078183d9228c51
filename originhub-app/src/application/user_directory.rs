use super::upvote_ledger::recount_locked;
use crate::domain::User;
use crate::infrastructure::db::{self, IdeaRepository, UpvoteRepository, UserRepository};
use crate::infrastructure::security::InputSanitizer;
use originhub_errors::AppError;
use sea_orm::{DatabaseConnection, TransactionTrait};

/// Local mirror of the identity provider's users.
#[derive(Clone)]
pub struct UserDirectory {
    db: DatabaseConnection,
}

impl UserDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn upsert(&self, user: User) -> Result<User, AppError> {
        let user = User {
            user_id: InputSanitizer::require_short_text("userId", &user.user_id)?,
            email: InputSanitizer::validate_email(&user.email)?,
            ..user
        };
        let repo = UserRepository::new(&self.db);

        let email_owner = repo
            .find_by_email(&user.email)
            .await
            .map_err(db::storage_error)?;
        if email_owner.is_some_and(|other| other.user_id != user.user_id) {
            return Err(AppError::Validation(
                "Email address is already in use".to_string(),
            ));
        }

        let model = repo.upsert(&user).await.map_err(|err| {
            if db::is_unique_violation(&err) {
                AppError::Validation("Email address is already in use".to_string())
            } else {
                db::storage_error(err)
            }
        })?;

        tracing::info!(user_id = %model.user_id, "User synced");
        Ok(model.into())
    }

    /// Returns whether a user was removed. Their upvotes and comments go
    /// with them, and every idea they had upvoted is recounted in the same
    /// transaction.
    pub async fn remove(&self, user_id: &str) -> Result<bool, AppError> {
        let owned_id = user_id.to_string();
        let (removed, recounted) = self
            .db
            .transaction::<_, (bool, usize), AppError>(move |txn| {
                Box::pin(async move {
                    let idea_ids = UpvoteRepository::new(txn)
                        .idea_ids_for_user(&owned_id)
                        .await
                        .map_err(db::storage_error)?;

                    let ideas = IdeaRepository::new(txn);
                    let mut locked = Vec::with_capacity(idea_ids.len());
                    for idea_id in idea_ids {
                        if let Some(model) = ideas
                            .find_by_id_for_update(idea_id)
                            .await
                            .map_err(db::storage_error)?
                        {
                            locked.push(model);
                        }
                    }

                    let removed = UserRepository::new(txn)
                        .delete(&owned_id)
                        .await
                        .map_err(db::storage_error)?;
                    if removed == 0 {
                        return Ok((false, 0));
                    }

                    let recounted = locked.len();
                    for model in locked {
                        recount_locked(txn, model).await?;
                    }
                    Ok((true, recounted))
                })
            })
            .await
            .map_err(db::transaction_error)?;

        if removed {
            tracing::info!(user_id, recounted, "User removed");
        }
        Ok(removed)
    }
}
