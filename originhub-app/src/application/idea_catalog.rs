use crate::domain::{Idea, IdeaFilter, IdeaPatch, NewIdea};
use crate::infrastructure::db::{self, IdeaRepository, UserRepository};
use crate::infrastructure::security::InputSanitizer;
use originhub_errors::AppError;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

#[derive(Clone)]
pub struct IdeaCatalog {
    db: DatabaseConnection,
}

impl IdeaCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// An owner id that matches no user is stored as NULL rather than
    /// rejecting the submission.
    pub async fn create(&self, input: NewIdea, owner: Option<&str>) -> Result<Idea, AppError> {
        let input = validate_new_idea(input)?;

        let owner = match owner {
            Some(user_id) => {
                let known = UserRepository::new(&self.db)
                    .find_by_id(user_id)
                    .await
                    .map_err(db::storage_error)?;
                if known.is_none() {
                    tracing::warn!(user_id, "Idea owner not found, storing without owner");
                }
                known.map(|user| user.user_id)
            }
            None => None,
        };

        let idea = Idea::new(input, owner);
        let model = IdeaRepository::new(&self.db)
            .create(&idea)
            .await
            .map_err(db::storage_error)?;

        tracing::info!(idea_id = %model.id, "Idea created");
        Ok(model.into())
    }

    pub async fn get(&self, id: Uuid) -> Result<Idea, AppError> {
        IdeaRepository::new(&self.db)
            .find_by_id(id)
            .await
            .map_err(db::storage_error)?
            .map(Idea::from)
            .ok_or_else(|| AppError::IdeaNotFound(id.to_string()))
    }

    pub async fn list(&self, filter: &IdeaFilter) -> Result<Vec<Idea>, AppError> {
        let models = IdeaRepository::new(&self.db)
            .list(filter)
            .await
            .map_err(db::storage_error)?;
        Ok(models.into_iter().map(Idea::from).collect())
    }

    pub async fn update(&self, id: Uuid, user_id: &str, patch: IdeaPatch) -> Result<Idea, AppError> {
        let patch = validate_patch(patch)?;
        let repo = IdeaRepository::new(&self.db);

        let existing = repo
            .find_by_id(id)
            .await
            .map_err(db::storage_error)?
            .ok_or_else(|| AppError::IdeaNotFound(id.to_string()))?;

        if existing.user_id.as_deref() != Some(user_id) {
            return Err(AppError::PermissionDenied(
                "You can only edit your own ideas".to_string(),
            ));
        }

        let updated = repo
            .apply_patch(existing, patch)
            .await
            .map_err(db::storage_error)?;
        Ok(updated.into())
    }

    /// Upvotes and comments go with the idea.
    pub async fn delete(&self, id: Uuid, user_id: &str) -> Result<(), AppError> {
        let repo = IdeaRepository::new(&self.db);

        let existing = repo
            .find_by_id(id)
            .await
            .map_err(db::storage_error)?
            .ok_or_else(|| AppError::IdeaNotFound(id.to_string()))?;

        if existing.user_id.as_deref() != Some(user_id) {
            return Err(AppError::PermissionDenied(
                "You can only delete your own ideas".to_string(),
            ));
        }

        repo.delete(id).await.map_err(db::storage_error)?;
        tracing::info!(idea_id = %id, "Idea deleted");
        Ok(())
    }

    /// Increments in the database, so concurrent views are never lost.
    pub async fn record_view(&self, id: Uuid) -> Result<i32, AppError> {
        let repo = IdeaRepository::new(&self.db);

        let touched = repo.increment_views(id).await.map_err(db::storage_error)?;
        if touched == 0 {
            return Err(AppError::IdeaNotFound(id.to_string()));
        }

        repo.find_by_id(id)
            .await
            .map_err(db::storage_error)?
            .map(|model| model.views)
            .ok_or_else(|| AppError::IdeaNotFound(id.to_string()))
    }
}

fn validate_new_idea(input: NewIdea) -> Result<NewIdea, AppError> {
    Ok(NewIdea {
        title: InputSanitizer::require_short_text("title", &input.title)?,
        description: InputSanitizer::require_text("description", &input.description)?,
        problem: InputSanitizer::require_text("problem", &input.problem)?,
        solution: InputSanitizer::require_text("solution", &input.solution)?,
        market_size: InputSanitizer::require_short_text("marketSize", &input.market_size)?,
        tags: InputSanitizer::normalize_tags(input.tags)?,
        author: InputSanitizer::require_short_text("author", &input.author)?,
        link: InputSanitizer::validate_link(input.link)?,
    })
}

/// Blank links leave the stored link as it is.
fn validate_patch(patch: IdeaPatch) -> Result<IdeaPatch, AppError> {
    Ok(IdeaPatch {
        title: patch
            .title
            .map(|v| InputSanitizer::require_short_text("title", &v))
            .transpose()?,
        description: patch
            .description
            .map(|v| InputSanitizer::require_text("description", &v))
            .transpose()?,
        problem: patch
            .problem
            .map(|v| InputSanitizer::require_text("problem", &v))
            .transpose()?,
        solution: patch
            .solution
            .map(|v| InputSanitizer::require_text("solution", &v))
            .transpose()?,
        market_size: patch
            .market_size
            .map(|v| InputSanitizer::require_short_text("marketSize", &v))
            .transpose()?,
        tags: patch.tags.map(InputSanitizer::normalize_tags).transpose()?,
        link: InputSanitizer::validate_link(patch.link)?,
    })
}
