pub mod entities;
mod chat_repository;
mod comment_repository;
mod idea_repository;
mod upvote_repository;
mod user_repository;

#[cfg(test)]
pub(crate) mod test_support;

pub use chat_repository::ChatRepository;
pub use comment_repository::CommentRepository;
pub use idea_repository::IdeaRepository;
pub use upvote_repository::UpvoteRepository;
pub use user_repository::UserRepository;

use originhub_errors::AppError;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    SqlErr, TransactionError,
};
use std::time::Duration;

pub async fn create_connection(
    database_url: &str,
    max_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Database::connect(opt).await
}

/// Creates tables and indexes from the entity definitions. Safe to run on
/// every start.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Parents before children so foreign keys resolve.
    create_table(db, entities::User).await?;
    create_table(db, entities::Idea).await?;
    create_table(db, entities::Upvote).await?;
    create_table(db, entities::Comment).await?;
    create_table(db, entities::Chat).await?;
    create_table(db, entities::Message).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }
    Ok(())
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

/// Anything the service layer did not anticipate becomes `Internal`. The
/// detail goes to the log.
pub(crate) fn storage_error(err: DbErr) -> AppError {
    tracing::error!(error = %err, "Database operation failed");
    AppError::Internal(err.to_string())
}

pub(crate) fn transaction_error(err: TransactionError<AppError>) -> AppError {
    match err {
        TransactionError::Connection(db_err) => storage_error(db_err),
        TransactionError::Transaction(app_err) => app_err,
    }
}
