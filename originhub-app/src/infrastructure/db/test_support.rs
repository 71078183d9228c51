use super::entities::idea;
use super::{run_migrations, IdeaRepository, UserRepository};
use crate::domain::{NewIdea, User};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

/// A fresh in-memory database with the full schema. One pooled connection,
/// since every SQLite memory connection is its own database.
pub(crate) async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

pub(crate) async fn seed_user(db: &DatabaseConnection, user_id: &str) -> String {
    let user = User::new(user_id.to_string(), format!("{user_id}@example.com"));
    UserRepository::new(db).upsert(&user).await.unwrap();
    user_id.to_string()
}

pub(crate) async fn seed_idea(
    db: &DatabaseConnection,
    owner: Option<&str>,
    title: &str,
) -> idea::Model {
    let input = NewIdea {
        title: title.to_string(),
        description: format!("{title} description"),
        problem: "Something is hard".to_string(),
        solution: "Make it easy".to_string(),
        market_size: "Large".to_string(),
        tags: vec!["test".to_string()],
        author: "Tester".to_string(),
        link: None,
    };
    let idea = crate::domain::Idea::new(input, owner.map(str::to_string));
    IdeaRepository::new(db).create(&idea).await.unwrap()
}

/// Writes the cached counter directly, bypassing the ledger.
pub(crate) async fn corrupt_upvotes(db: &DatabaseConnection, idea_id: Uuid, upvotes: i32) {
    idea::Entity::update_many()
        .col_expr(idea::Column::Upvotes, Expr::value(upvotes))
        .filter(idea::Column::Id.eq(idea_id))
        .exec(db)
        .await
        .unwrap();
}
