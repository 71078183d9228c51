use crate::application::{ChatHistory, CommentTreeBuilder, IdeaCatalog, UpvoteLedger, UserDirectory};
use crate::infrastructure::db;
use crate::infrastructure::realtime::BroadcastHub;
use originhub_errors::AppError;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub db: DatabaseConnection,
    pub ideas: Arc<IdeaCatalog>,
    pub upvotes: Arc<UpvoteLedger>,
    pub comments: Arc<CommentTreeBuilder>,
    pub users: Arc<UserDirectory>,
    pub chats: Arc<ChatHistory>,
    pub updates: BroadcastHub,
}

impl AppContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            ideas: Arc::new(IdeaCatalog::new(db.clone())),
            upvotes: Arc::new(UpvoteLedger::new(db.clone())),
            comments: Arc::new(CommentTreeBuilder::new(db.clone())),
            users: Arc::new(UserDirectory::new(db.clone())),
            chats: Arc::new(ChatHistory::new(db.clone())),
            updates: BroadcastHub::new(),
            db,
        }
    }

    /// Connects, brings the schema up to date and wires the services.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let conn = db::create_connection(database_url, max_connections)
            .await
            .map_err(|e| AppError::Internal(format!("Database connection failed: {e}")))?;
        tracing::info!("Database connected");

        db::run_migrations(&conn)
            .await
            .map_err(|e| AppError::Internal(format!("Database migration failed: {e}")))?;

        Ok(Self::new(conn))
    }

    pub async fn ping_database(&self) -> bool {
        self.db.ping().await.is_ok()
    }
}
