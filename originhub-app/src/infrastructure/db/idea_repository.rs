use super::entities::idea;
use crate::domain::{Idea, IdeaFilter, IdeaPatch, IdeaSort};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{entity::*, query::*, Condition, ConnectionTrait, DbErr};
use uuid::Uuid;

/// Idea queries over any connection, so callers can run them inside a transaction.
pub struct IdeaRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> IdeaRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, idea_data: &Idea) -> Result<idea::Model, DbErr> {
        let active = idea::ActiveModel {
            id: Set(idea_data.id),
            title: Set(idea_data.title.clone()),
            description: Set(idea_data.description.clone()),
            problem: Set(idea_data.problem.clone()),
            solution: Set(idea_data.solution.clone()),
            market_size: Set(idea_data.market_size.clone()),
            tags: Set(serde_json::json!(idea_data.tags)),
            author: Set(idea_data.author.clone()),
            created_at: Set(idea_data.created_at),
            upvotes: Set(idea_data.upvotes),
            views: Set(idea_data.views),
            status: Set(idea_data.status.clone()),
            user_id: Set(idea_data.user_id.clone()),
            link: Set(idea_data.link.clone()),
        };
        active.insert(self.conn).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<idea::Model>, DbErr> {
        idea::Entity::find_by_id(id).one(self.conn).await
    }

    /// Same as `find_by_id` but takes a row lock for the rest of the
    /// transaction. Backends without row locks (SQLite) ignore the clause.
    pub async fn find_by_id_for_update(&self, id: Uuid) -> Result<Option<idea::Model>, DbErr> {
        idea::Entity::find_by_id(id)
            .lock_exclusive()
            .one(self.conn)
            .await
    }

    pub async fn list(&self, filter: &IdeaFilter) -> Result<Vec<idea::Model>, DbErr> {
        let mut query = idea::Entity::find();

        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let pattern = format!("%{}%", search.to_lowercase());
            let lower_like = |column: idea::Column| {
                Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone())
            };
            query = query.filter(
                Condition::any()
                    .add(lower_like(idea::Column::Title))
                    .add(lower_like(idea::Column::Description))
                    .add(lower_like(idea::Column::Problem))
                    .add(lower_like(idea::Column::Solution)),
            );
        }

        query = match filter.sort {
            IdeaSort::Newest => query.order_by_desc(idea::Column::CreatedAt),
            IdeaSort::Title => query.order_by_asc(idea::Column::Title),
        };

        let ideas = query.all(self.conn).await?;

        // Tags live in a JSON column, so tag matching happens here.
        Ok(ideas
            .into_iter()
            .filter(|model| filter.matches_tags(&tags_of(model)))
            .collect())
    }

    pub async fn all_ids(&self) -> Result<Vec<Uuid>, DbErr> {
        idea::Entity::find()
            .select_only()
            .column(idea::Column::Id)
            .order_by_asc(idea::Column::CreatedAt)
            .into_tuple::<Uuid>()
            .all(self.conn)
            .await
    }

    pub async fn set_upvotes(&self, model: idea::Model, upvotes: i32) -> Result<idea::Model, DbErr> {
        let mut active: idea::ActiveModel = model.into();
        active.upvotes = Set(upvotes);
        active.update(self.conn).await
    }

    pub async fn apply_patch(&self, model: idea::Model, patch: IdeaPatch) -> Result<idea::Model, DbErr> {
        if patch.is_empty() {
            return Ok(model);
        }

        let mut active: idea::ActiveModel = model.into();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(problem) = patch.problem {
            active.problem = Set(problem);
        }
        if let Some(solution) = patch.solution {
            active.solution = Set(solution);
        }
        if let Some(market_size) = patch.market_size {
            active.market_size = Set(market_size);
        }
        if let Some(tags) = patch.tags {
            active.tags = Set(serde_json::json!(tags));
        }
        if let Some(link) = patch.link {
            active.link = Set(Some(link));
        }
        active.update(self.conn).await
    }

    /// Bumps the view counter in place. Returns the number of rows touched.
    pub async fn increment_views(&self, id: Uuid) -> Result<u64, DbErr> {
        let result = idea::Entity::update_many()
            .col_expr(idea::Column::Views, Expr::col(idea::Column::Views).add(1))
            .filter(idea::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, DbErr> {
        let result = idea::Entity::delete_by_id(id).exec(self.conn).await?;
        Ok(result.rows_affected)
    }
}

fn tags_of(model: &idea::Model) -> Vec<String> {
    serde_json::from_value(model.tags.clone()).unwrap_or_default()
}

impl From<idea::Model> for Idea {
    fn from(model: idea::Model) -> Self {
        let tags = tags_of(&model);
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            problem: model.problem,
            solution: model.solution,
            market_size: model.market_size,
            tags,
            author: model.author,
            created_at: model.created_at,
            upvotes: model.upvotes,
            views: model.views,
            status: model.status,
            user_id: model.user_id,
            link: model.link,
        }
    }
}
