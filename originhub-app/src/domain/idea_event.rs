use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpvoteAction {
    Upvoted,
    RemovedUpvote,
}

/// Realtime update pushed to everyone watching an idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdeaEvent {
    UpvoteUpdate {
        idea_id: Uuid,
        upvotes: i32,
        user_id: String,
        action: UpvoteAction,
        /// Seconds since the Unix epoch.
        timestamp: f64,
    },
    ViewUpdate {
        idea_id: Uuid,
        views: i32,
        timestamp: f64,
    },
}

impl IdeaEvent {
    pub fn upvote(idea_id: Uuid, upvotes: i32, user_id: String, action: UpvoteAction) -> Self {
        Self::UpvoteUpdate {
            idea_id,
            upvotes,
            user_id,
            action,
            timestamp: now_seconds(),
        }
    }

    pub fn view(idea_id: Uuid, views: i32) -> Self {
        Self::ViewUpdate {
            idea_id,
            views,
            timestamp: now_seconds(),
        }
    }

    pub fn idea_id(&self) -> Uuid {
        match self {
            Self::UpvoteUpdate { idea_id, .. } | Self::ViewUpdate { idea_id, .. } => *idea_id,
        }
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upvote_event_wire_shape() {
        let idea_id = Uuid::new_v4();
        let event = IdeaEvent::upvote(idea_id, 3, "user_9".to_string(), UpvoteAction::RemovedUpvote);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "upvote_update");
        assert_eq!(json["idea_id"], idea_id.to_string());
        assert_eq!(json["upvotes"], 3);
        assert_eq!(json["user_id"], "user_9");
        assert_eq!(json["action"], "removed_upvote");
        assert!(json["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_view_event_carries_idea_id() {
        let idea_id = Uuid::new_v4();
        let event = IdeaEvent::view(idea_id, 12);
        assert_eq!(event.idea_id(), idea_id);
        assert_eq!(serde_json::to_value(&event).unwrap()["type"], "view_update");
    }
}
