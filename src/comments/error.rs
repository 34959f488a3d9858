use axum::http::StatusCode;
use thiserror::Error;

/// Failures of comment mutations and reads.
///
/// A missing target and a missing permission share one variant so that
/// callers cannot tell which comments exist.
#[derive(Debug, Error)]
pub enum CommentError {
    #[error("you must be signed in to do that")]
    Unauthorized,
    #[error("comment not found or you are not allowed to change it")]
    NotFoundOrUnauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("storage failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl CommentError {
    /// HTTP status a host should answer with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFoundOrUnauthorized => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}
