use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Idea with id {0} not found")]
    IdeaNotFound(String),

    #[error("Comment with id {0} not found")]
    CommentNotFound(String),

    #[error("Chat with id {0} not found")]
    ChatNotFound(String),

    #[error("Parent comment with id {0} not found")]
    ParentNotFound(String),

    #[error("Parent comment does not belong to idea {idea_id}. It belongs to idea {parent_idea_id}")]
    ParentIdeaMismatch {
        idea_id: String,
        parent_idea_id: String,
    },

    #[error("You have already upvoted this idea")]
    AlreadyUpvoted,

    #[error("You have not upvoted this idea")]
    NotUpvoted,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Authentication required. Please provide X-User-Id header.")]
    Unauthenticated,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    PermissionDenied,
    Validation,
    Unauthenticated,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IdeaNotFound(_)
            | Self::CommentNotFound(_)
            | Self::ChatNotFound(_)
            | Self::ParentNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyUpvoted | Self::NotUpvoted => ErrorKind::Conflict,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::ParentIdeaMismatch { .. } | Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::IdeaNotFound(_) => "That idea does not exist.",
            Self::CommentNotFound(_) => "That comment does not exist.",
            Self::ChatNotFound(_) => "That chat does not exist.",
            Self::ParentNotFound(_) => "The comment you are replying to does not exist.",
            Self::ParentIdeaMismatch { .. } => {
                "You can only reply to comments on the same idea."
            }
            Self::AlreadyUpvoted => "You already upvoted this idea.",
            Self::NotUpvoted => "You have not upvoted this idea yet.",
            Self::PermissionDenied(_) => "You are not allowed to do that.",
            Self::Validation(_) => "Some of the submitted data is invalid.",
            Self::Unauthenticated => "Please sign in first.",
            Self::Internal(_) => "Something went wrong on our side. Try again later.",
        }
    }
}

#[cfg(feature = "http")]
mod http_impl {
    use super::{AppError, ErrorKind};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    #[derive(serde::Serialize)]
    struct ErrorResponse {
        success: bool,
        message: String,
    }

    impl ErrorKind {
        pub fn status_code(self) -> StatusCode {
            match self {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = self.kind().status_code();
            // Storage details stay in the logs.
            let message = match &self {
                AppError::Internal(_) => self.user_message().to_string(),
                other => other.to_string(),
            };
            (
                status,
                Json(ErrorResponse {
                    success: false,
                    message,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(AppError::IdeaNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::ParentNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::AlreadyUpvoted.kind(), ErrorKind::Conflict);
        assert_eq!(AppError::NotUpvoted.kind(), ErrorKind::Conflict);
        assert_eq!(
            AppError::ParentIdeaMismatch {
                idea_id: "a".into(),
                parent_idea_id: "b".into(),
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AppError::PermissionDenied("nope".into()).kind(),
            ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn test_mismatch_message_names_both_ideas() {
        let err = AppError::ParentIdeaMismatch {
            idea_id: "idea-a".into(),
            parent_idea_id: "idea-b".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("idea-a"));
        assert!(msg.contains("idea-b"));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_status_codes() {
        use axum::http::StatusCode;
        use axum::response::IntoResponse;

        assert_eq!(
            AppError::CommentNotFound("c".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ChatNotFound("c".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::AlreadyUpvoted.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal("db down".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
