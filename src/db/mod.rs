//! SQLite storage for users, sessions, posts and threaded comments.

mod migrations;
mod models;
mod queries;

pub use models::*;
pub use queries::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::info;

/// Handle to the board's database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `path` and migrate it.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened for writing, a migration fails, or
    /// the connection does not enforce foreign keys.
    pub async fn new(path: &Path) -> Result<Self> {
        // Deleting a comment removes its replies, and deleting a post removes
        // its discussion, through ON DELETE CASCADE. That needs foreign keys
        // switched on for every pooled connection.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open board database at {}", path.display()))?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        db.check_cascades().await?;
        info!(path = %path.display(), "Board database ready");

        Ok(db)
    }

    /// Refuse to run on a connection that would leave orphaned replies behind.
    async fn check_cascades(&self) -> Result<()> {
        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read foreign key setting")?;
        if enabled != 1 {
            bail!("SQLite foreign keys are disabled; comment cascades would not run");
        }
        Ok(())
    }

    /// Round-trip a trivial query. Used by the health check.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can serve the query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
