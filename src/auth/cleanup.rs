//! Background sweep of expired sessions.

use sqlx::SqlitePool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn cleanup_once(pool: &SqlitePool) {
    match crate::db::delete_expired_sessions(pool).await {
        Ok(count) => {
            if count > 0 {
                tracing::info!(expired_sessions = count, "Cleaned up expired sessions");
            }
        }
        Err(e) => {
            tracing::error!("Failed to delete expired sessions: {e:#}");
        }
    }
}

/// Run the cleanup worker until `shutdown` fires.
/// Cleans once immediately, then every `interval`.
pub async fn run_cleanup_worker(pool: SqlitePool, interval: Duration, shutdown: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Starting session cleanup worker"
    );

    cleanup_once(&pool).await;

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // first tick is immediate

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cleanup_once(&pool).await;
            }
            () = shutdown.cancelled() => {
                tracing::info!("Session cleanup worker shutting down");
                break;
            }
        }
    }
}
