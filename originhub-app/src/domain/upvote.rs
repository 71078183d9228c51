use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upvote {
    pub user_id: String,
    pub idea_id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Whether a user has upvoted an idea, alongside its current count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteStatus {
    pub upvoted: bool,
    pub upvotes: i32,
}
