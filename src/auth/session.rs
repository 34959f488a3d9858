use anyhow::Result;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sqlx::SqlitePool;

use crate::db;

/// Generate a cryptographically secure random session token.
pub fn generate_session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Session duration in seconds.
pub enum SessionDuration {
    /// 1 hour
    Short,
    /// 30 days
    Long,
}

impl SessionDuration {
    #[must_use]
    pub const fn as_seconds(&self) -> i64 {
        match self {
            Self::Short => 3600,
            Self::Long => 2_592_000,
        }
    }
}

/// Store a fresh session for `user_id` and return its token.
///
/// Sign-in lives outside this service; whatever provisions accounts calls
/// this and hands the token to the browser as the `session` cookie.
pub async fn issue_session(
    pool: &SqlitePool,
    user_id: i64,
    duration: SessionDuration,
) -> Result<String> {
    let token = generate_session_token();
    let expires_at =
        (chrono::Utc::now() + chrono::Duration::seconds(duration.as_seconds())).to_rfc3339();
    db::create_session(pool, user_id, &token, &expires_at).await?;
    tracing::debug!(user_id, "Session issued");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_token() {
        let token1 = generate_session_token();
        let token2 = generate_session_token();

        assert_eq!(token1.len(), 64);
        assert_eq!(token2.len(), 64);
        assert_ne!(token1, token2);
        assert!(token1.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn test_session_duration() {
        assert_eq!(SessionDuration::Short.as_seconds(), 3600);
        assert_eq!(SessionDuration::Long.as_seconds(), 2_592_000);
    }
}
