use anyhow::anyhow;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::comments::error::CommentError;
use crate::comments::view::{MutationOutcome, PendingAction};
use crate::constants::MAX_COMMENT_CHARS;
use crate::db::{self, Comment, Database};

/// Persistence and authorization for comments.
///
/// `actor` is the signed-in user performing a mutation, if any. The view
/// layer hides controls a viewer may not use, but every implementation must
/// enforce the same rules itself.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// All comments on a post. Implementations return them oldest first but
    /// callers must not depend on the order.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, CommentError>;

    async fn create_comment(
        &self,
        actor: Option<i64>,
        post_id: i64,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment, CommentError>;

    /// Allowed for the comment author and the post author.
    async fn update_comment(
        &self,
        actor: Option<i64>,
        comment_id: i64,
        content: &str,
    ) -> Result<Comment, CommentError>;

    /// Allowed for the comment author and the post author. Replies go too.
    async fn delete_comment(&self, actor: Option<i64>, comment_id: i64)
        -> Result<(), CommentError>;

    async fn count_comments(&self, post_id: i64) -> Result<i64, CommentError>;
}

/// Run a view submission against a store.
pub async fn execute<S>(
    store: &S,
    actor: Option<i64>,
    action: &PendingAction,
) -> Result<MutationOutcome, CommentError>
where
    S: CommentStore + ?Sized,
{
    match action {
        PendingAction::Create {
            post_id,
            parent_id,
            content,
        } => store
            .create_comment(actor, *post_id, content, *parent_id)
            .await
            .map(MutationOutcome::Created),
        PendingAction::Update {
            comment_id,
            content,
        } => store
            .update_comment(actor, *comment_id, content)
            .await
            .map(MutationOutcome::Updated),
        PendingAction::Delete { comment_id } => store
            .delete_comment(actor, *comment_id)
            .await
            .map(|()| MutationOutcome::Deleted),
    }
}

/// Trim and bound comment content.
pub fn validate_content(content: &str) -> Result<&str, CommentError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CommentError::Validation(
            "Comment cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(CommentError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(content)
}

impl Database {
    /// Load a comment the actor may moderate.
    async fn moderated_comment(
        &self,
        actor: Option<i64>,
        comment_id: i64,
    ) -> Result<Comment, CommentError> {
        let actor = actor.ok_or(CommentError::Unauthorized)?;
        let comment = db::get_comment(self.pool(), comment_id)
            .await?
            .ok_or(CommentError::NotFoundOrUnauthorized)?;

        if comment.author_id == actor {
            return Ok(comment);
        }
        let post = db::get_post(self.pool(), comment.post_id)
            .await?
            .ok_or(CommentError::NotFoundOrUnauthorized)?;
        if post.author_id == actor {
            Ok(comment)
        } else {
            debug!(
                comment_id,
                user_id = actor,
                "Comment moderation refused"
            );
            Err(CommentError::NotFoundOrUnauthorized)
        }
    }
}

#[async_trait]
impl CommentStore for Database {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, CommentError> {
        Ok(db::get_comments_for_post(self.pool(), post_id).await?)
    }

    async fn create_comment(
        &self,
        actor: Option<i64>,
        post_id: i64,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment, CommentError> {
        let actor = actor.ok_or(CommentError::Unauthorized)?;
        if db::get_post(self.pool(), post_id).await?.is_none() {
            return Err(CommentError::NotFoundOrUnauthorized);
        }
        let content = validate_content(content)?;

        if let Some(parent_id) = parent_id {
            let parent = db::get_comment(self.pool(), parent_id).await?;
            if parent.map_or(true, |p| p.post_id != post_id) {
                return Err(CommentError::Validation(
                    "That comment is no longer available to reply to".to_string(),
                ));
            }
        }

        let id = db::insert_comment(self.pool(), post_id, actor, parent_id, content).await?;
        info!(post_id, comment_id = id, user_id = actor, ?parent_id, "Comment created");

        db::get_comment(self.pool(), id)
            .await?
            .ok_or_else(|| CommentError::Store(anyhow!("Comment {id} missing after insert")))
    }

    async fn update_comment(
        &self,
        actor: Option<i64>,
        comment_id: i64,
        content: &str,
    ) -> Result<Comment, CommentError> {
        let existing = self.moderated_comment(actor, comment_id).await?;
        let content = validate_content(content)?;

        db::update_comment_content(self.pool(), comment_id, content).await?;
        info!(
            post_id = existing.post_id,
            comment_id,
            user_id = ?actor,
            "Comment updated"
        );

        db::get_comment(self.pool(), comment_id)
            .await?
            .ok_or(CommentError::NotFoundOrUnauthorized)
    }

    async fn delete_comment(
        &self,
        actor: Option<i64>,
        comment_id: i64,
    ) -> Result<(), CommentError> {
        let existing = self.moderated_comment(actor, comment_id).await?;

        let removed = db::delete_comment(self.pool(), comment_id).await?;
        if removed == 0 {
            return Err(CommentError::NotFoundOrUnauthorized);
        }
        info!(
            post_id = existing.post_id,
            comment_id,
            user_id = ?actor,
            "Comment deleted"
        );
        Ok(())
    }

    async fn count_comments(&self, post_id: i64) -> Result<i64, CommentError> {
        Ok(db::count_comments_for_post(self.pool(), post_id).await?)
    }
}
