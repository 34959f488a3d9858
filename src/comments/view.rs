//! Interactive state for one viewer looking at one post's discussion.
//!
//! [`CommentTreeView`] owns the fetched comments, the derived forest and all
//! per-node UI state: which threads are expanded, which composers are open,
//! and which mutations are in flight. It never talks to the store itself.
//! [`CommentTreeView::submit`] hands back a [`Submission`] describing the
//! call to make, and the host reports the result through
//! [`CommentTreeView::complete`]. The host can therefore drop its lock on the
//! view while the store call is awaited.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::comments::error::CommentError;
use crate::comments::tree::{build_forest, descendant_ids, CommentNode};
use crate::db::Comment;

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Where a composer writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposeTarget {
    /// A new top-level comment on the post.
    Post,
    /// A reply to the comment with this id.
    Reply(i64),
    /// New content for the comment with this id.
    Edit(i64),
}

impl ComposeTarget {
    const fn comment_id(self) -> Option<i64> {
        match self {
            Self::Post => None,
            Self::Reply(id) | Self::Edit(id) => Some(id),
        }
    }
}

/// Lifecycle of one composer. A missing entry means idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composer {
    Idle,
    Composing { draft: String },
    Submitting { draft: String },
}

impl Composer {
    #[must_use]
    pub fn draft(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Composing { draft } | Self::Submitting { draft } => draft,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }
}

static IDLE: Composer = Composer::Idle;

/// The in-flight action a ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketAction {
    Compose(ComposeTarget),
    Delete(i64),
}

/// Identifies one in-flight mutation of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub epoch: u64,
    pub action: TicketAction,
}

/// The store call a host must perform for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Create {
        post_id: i64,
        parent_id: Option<i64>,
        content: String,
    },
    Update {
        comment_id: i64,
        content: String,
    },
    Delete {
        comment_id: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: Ticket,
    pub action: PendingAction,
}

/// Successful result of a store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Created(Comment),
    Updated(Comment),
    Deleted,
}

/// Why [`CommentTreeView::submit`] produced no store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    EmptyContent,
    AlreadySubmitting,
    UnknownComment,
    NotPermitted,
}

impl SubmitRejection {
    /// Notice text shown to the viewer.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::EmptyContent => "Comment cannot be empty",
            Self::AlreadySubmitting => "Still saving your previous change",
            Self::UnknownComment => "That comment no longer exists",
            Self::NotPermitted => "You can only change your own comments or comments on your posts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message for the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// One comment as the host should draw it.
#[derive(Debug, Clone)]
pub struct VisibleRow<'a> {
    pub comment: &'a Comment,
    pub depth: usize,
    pub reply_count: usize,
    pub expanded: bool,
    pub can_moderate: bool,
    pub reply: &'a Composer,
    pub edit: &'a Composer,
    pub deleting: bool,
}

#[derive(Debug)]
pub struct CommentTreeView {
    post_id: i64,
    post_author_id: i64,
    viewer: Option<i64>,
    comments: Vec<Comment>,
    forest: Vec<CommentNode>,
    expanded: HashSet<i64>,
    composers: HashMap<ComposeTarget, Composer>,
    deleting: HashSet<i64>,
    notices: Vec<Notice>,
    epoch: u64,
    active: bool,
}

impl CommentTreeView {
    /// Hand out an epoch no other view in this process has used.
    pub fn next_epoch() -> u64 {
        NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
    }

    #[must_use]
    pub fn new(
        post_id: i64,
        post_author_id: i64,
        viewer: Option<i64>,
        comments: Vec<Comment>,
        epoch: u64,
    ) -> Self {
        let forest = build_forest(&comments);
        Self {
            post_id,
            post_author_id,
            viewer,
            comments,
            forest,
            expanded: HashSet::new(),
            composers: HashMap::new(),
            deleting: HashSet::new(),
            notices: Vec::new(),
            epoch,
            active: true,
        }
    }

    #[must_use]
    pub const fn post_id(&self) -> i64 {
        self.post_id
    }

    #[must_use]
    pub const fn viewer(&self) -> Option<i64> {
        self.viewer
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn forest(&self) -> &[CommentNode] {
        &self.forest
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    #[must_use]
    pub fn comment(&self, id: i64) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Switch identity. Open edit composers the new viewer may not use are
    /// closed.
    pub fn set_viewer(&mut self, viewer: Option<i64>) {
        if self.viewer == viewer {
            return;
        }
        self.viewer = viewer;
        let allowed: HashSet<i64> = self
            .comments
            .iter()
            .filter(|c| self.can_moderate(c))
            .map(|c| c.id)
            .collect();
        self.composers.retain(|target, composer| match target {
            ComposeTarget::Edit(id) => composer.is_submitting() || allowed.contains(id),
            _ => true,
        });
    }

    /// Replace the comment list with a fresh fetch.
    ///
    /// Expansion and composer state survive for comments that still exist.
    pub fn refresh(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
        self.rebuild();
        let ids: HashSet<i64> = self.comments.iter().map(|c| c.id).collect();
        self.expanded.retain(|id| ids.contains(id));
        self.composers.retain(|target, composer| {
            composer.is_submitting() || target.comment_id().map_or(true, |id| ids.contains(&id))
        });
    }

    fn rebuild(&mut self) {
        self.forest = build_forest(&self.comments);
    }

    // ==================== Expansion ====================

    pub fn expand(&mut self, id: i64) {
        self.expanded.insert(id);
    }

    pub fn collapse(&mut self, id: i64) {
        self.expanded.remove(&id);
    }

    pub fn toggle(&mut self, id: i64) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    #[must_use]
    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded.contains(&id)
    }

    // ==================== Composition ====================

    /// True iff the viewer wrote the comment or owns the post.
    #[must_use]
    pub fn can_moderate(&self, comment: &Comment) -> bool {
        self.viewer
            .is_some_and(|v| v == comment.author_id || v == self.post_author_id)
    }

    #[must_use]
    pub fn composer(&self, target: ComposeTarget) -> &Composer {
        self.composers.get(&target).unwrap_or(&IDLE)
    }

    #[must_use]
    pub fn is_deleting(&self, id: i64) -> bool {
        self.deleting.contains(&id)
    }

    /// Open the reply composer under `id`. The thread is expanded so the
    /// composer is visible.
    pub fn start_reply(&mut self, id: i64) -> Result<(), SubmitRejection> {
        if self.comment(id).is_none() {
            return Err(self.reject(SubmitRejection::UnknownComment));
        }
        self.expand(id);
        self.open(ComposeTarget::Reply(id), String::new());
        Ok(())
    }

    /// Open the edit composer for `id`, seeded with its current content.
    pub fn start_edit(&mut self, id: i64) -> Result<(), SubmitRejection> {
        if let Err(rejection) = self.check_target(ComposeTarget::Edit(id)) {
            return Err(self.reject(rejection));
        }
        let seed = self
            .comment(id)
            .map(|c| c.content.clone())
            .unwrap_or_default();
        self.open(ComposeTarget::Edit(id), seed);
        Ok(())
    }

    // An already open composer keeps its draft.
    fn open(&mut self, target: ComposeTarget, seed: String) {
        self.composers
            .entry(target)
            .or_insert(Composer::Composing { draft: seed });
    }

    /// Replace the draft of a composer, opening it if needed.
    pub fn set_draft(
        &mut self,
        target: ComposeTarget,
        draft: impl Into<String>,
    ) -> Result<(), SubmitRejection> {
        if let Err(rejection) = self.check_target(target) {
            return Err(self.reject(rejection));
        }
        if self.composer(target).is_submitting() {
            return Err(self.reject(SubmitRejection::AlreadySubmitting));
        }
        self.composers.insert(
            target,
            Composer::Composing {
                draft: draft.into(),
            },
        );
        Ok(())
    }

    /// Close a composer and discard its draft. In-flight composers cannot
    /// be cancelled; returns whether anything was closed.
    pub fn cancel(&mut self, target: ComposeTarget) -> bool {
        match self.composers.get(&target) {
            Some(Composer::Submitting { .. }) | None => false,
            Some(_) => {
                self.composers.remove(&target);
                true
            }
        }
    }

    fn reject(&mut self, rejection: SubmitRejection) -> SubmitRejection {
        self.notices.push(Notice::error(rejection.message()));
        rejection
    }

    fn check_target(&self, target: ComposeTarget) -> Result<(), SubmitRejection> {
        match target {
            ComposeTarget::Post => Ok(()),
            ComposeTarget::Reply(id) => self
                .comment(id)
                .map(|_| ())
                .ok_or(SubmitRejection::UnknownComment),
            ComposeTarget::Edit(id) => {
                let comment = self.comment(id).ok_or(SubmitRejection::UnknownComment)?;
                if self.can_moderate(comment) {
                    Ok(())
                } else {
                    Err(SubmitRejection::NotPermitted)
                }
            }
        }
    }

    /// Turn the composer's draft into a store call.
    ///
    /// Every rejection leaves a notice. Blank drafts never reach the store
    /// and their composer stays open.
    pub fn submit(&mut self, target: ComposeTarget) -> Result<Submission, SubmitRejection> {
        if let Err(rejection) = self.check_target(target) {
            return Err(self.reject(rejection));
        }

        let draft = match self.composers.get(&target) {
            Some(Composer::Submitting { .. }) => {
                debug!(post_id = self.post_id, ?target, "Submit while in flight ignored");
                return Err(self.reject(SubmitRejection::AlreadySubmitting));
            }
            Some(Composer::Composing { draft }) => draft.clone(),
            Some(Composer::Idle) | None => String::new(),
        };

        let content = draft.trim();
        if content.is_empty() {
            self.composers
                .insert(target, Composer::Composing { draft: draft.clone() });
            return Err(self.reject(SubmitRejection::EmptyContent));
        }

        let action = match target {
            ComposeTarget::Post => PendingAction::Create {
                post_id: self.post_id,
                parent_id: None,
                content: content.to_string(),
            },
            ComposeTarget::Reply(id) => PendingAction::Create {
                post_id: self.post_id,
                parent_id: Some(id),
                content: content.to_string(),
            },
            ComposeTarget::Edit(id) => PendingAction::Update {
                comment_id: id,
                content: content.to_string(),
            },
        };

        self.composers
            .insert(target, Composer::Submitting { draft });
        Ok(Submission {
            ticket: Ticket {
                epoch: self.epoch,
                action: TicketAction::Compose(target),
            },
            action,
        })
    }

    /// Ask to delete `id` and its replies.
    pub fn request_delete(&mut self, id: i64) -> Result<Submission, SubmitRejection> {
        // Same rule as editing.
        if let Err(rejection) = self.check_target(ComposeTarget::Edit(id)) {
            return Err(self.reject(rejection));
        }
        if !self.deleting.insert(id) {
            return Err(self.reject(SubmitRejection::AlreadySubmitting));
        }
        Ok(Submission {
            ticket: Ticket {
                epoch: self.epoch,
                action: TicketAction::Delete(id),
            },
            action: PendingAction::Delete { comment_id: id },
        })
    }

    // ==================== Completion ====================

    /// Apply the store's answer to an earlier submission.
    ///
    /// Results for another epoch, for a deactivated view, or for an action
    /// that is no longer in flight are ignored.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<MutationOutcome, CommentError>,
    ) -> Completion {
        if !self.active || ticket.epoch != self.epoch {
            debug!(
                post_id = self.post_id,
                epoch = ticket.epoch,
                "Ignoring stale mutation result"
            );
            return Completion::Stale;
        }

        match ticket.action {
            TicketAction::Compose(target) => self.complete_compose(target, result),
            TicketAction::Delete(id) => self.complete_delete(id, result),
        }
    }

    fn complete_compose(
        &mut self,
        target: ComposeTarget,
        result: Result<MutationOutcome, CommentError>,
    ) -> Completion {
        let draft = match self.composers.get(&target) {
            Some(Composer::Submitting { draft }) => draft.clone(),
            _ => return Completion::Stale,
        };

        match result {
            Ok(outcome) => {
                self.composers.remove(&target);
                match outcome {
                    MutationOutcome::Created(comment) => {
                        if let Some(parent) = comment.parent_id {
                            self.expand(parent);
                        }
                        if self.comment(comment.id).is_none() {
                            self.comments.push(comment);
                        }
                        self.notices.push(Notice::success("Comment posted"));
                    }
                    MutationOutcome::Updated(comment) => {
                        if let Some(existing) = self.comments.iter_mut().find(|c| c.id == comment.id)
                        {
                            *existing = comment;
                        }
                        self.notices.push(Notice::success("Comment updated"));
                    }
                    MutationOutcome::Deleted => {}
                }
                self.rebuild();
            }
            Err(err) => {
                self.composers.insert(target, Composer::Composing { draft });
                self.notices.push(Notice::error(err.user_message()));
            }
        }
        Completion::Applied
    }

    fn complete_delete(
        &mut self,
        id: i64,
        result: Result<MutationOutcome, CommentError>,
    ) -> Completion {
        if !self.deleting.remove(&id) {
            return Completion::Stale;
        }

        match result {
            Ok(_) => {
                let removed = descendant_ids(&self.comments, id);
                self.comments.retain(|c| !removed.contains(&c.id));
                self.expanded.retain(|c| !removed.contains(c));
                self.composers.retain(|target, _| {
                    target.comment_id().map_or(true, |c| !removed.contains(&c))
                });
                self.deleting.retain(|c| !removed.contains(c));
                self.rebuild();
                self.notices.push(Notice::success("Comment deleted"));
            }
            Err(err) => {
                self.notices.push(Notice::error(err.user_message()));
            }
        }
        Completion::Applied
    }

    /// Stop accepting results. Used when the host evicts the view.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Drain pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Rows to draw, in display order. Replies appear only beneath an
    /// expanded parent.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<VisibleRow<'_>> {
        let mut rows = Vec::new();
        let mut stack: Vec<(&CommentNode, usize)> =
            self.forest.iter().rev().map(|n| (n, 0)).collect();

        while let Some((node, depth)) = stack.pop() {
            let id = node.comment.id;
            let expanded = self.is_expanded(id);
            rows.push(VisibleRow {
                comment: &node.comment,
                depth,
                reply_count: node.reply_count(),
                expanded,
                can_moderate: self.can_moderate(&node.comment),
                reply: self.composer(ComposeTarget::Reply(id)),
                edit: self.composer(ComposeTarget::Edit(id)),
                deleting: self.is_deleting(id),
            });
            if expanded {
                stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::tree::tests::comment;

    const POST_AUTHOR: i64 = 20;
    const COMMENT_AUTHOR: i64 = 10;

    fn view_with(viewer: Option<i64>, comments: Vec<Comment>) -> CommentTreeView {
        CommentTreeView::new(1, POST_AUTHOR, viewer, comments, 7)
    }

    fn sample() -> Vec<Comment> {
        vec![comment(1, None), comment(2, Some(1)), comment(3, None)]
    }

    fn created(id: i64, parent: Option<i64>, content: &str) -> MutationOutcome {
        let mut c = comment(id, parent);
        c.content = content.to_string();
        MutationOutcome::Created(c)
    }

    #[test]
    fn test_toggle_twice_restores_expansion() {
        let mut view = view_with(None, sample());
        assert!(!view.is_expanded(1));
        view.toggle(1);
        assert!(view.is_expanded(1));
        view.toggle(1);
        assert!(!view.is_expanded(1));
    }

    #[test]
    fn test_expand_and_collapse_are_idempotent() {
        let mut view = view_with(None, sample());
        view.expand(1);
        view.expand(1);
        assert!(view.is_expanded(1));
        view.collapse(1);
        view.collapse(1);
        assert!(!view.is_expanded(1));
    }

    #[test]
    fn test_collapse_all_clears_every_expansion() {
        let mut view = view_with(None, sample());
        view.expand(1);
        view.expand(2);
        view.expand(3);
        view.collapse_all();
        assert!(!view.is_expanded(1));
        assert!(!view.is_expanded(2));
        assert!(!view.is_expanded(3));
    }

    #[test]
    fn test_start_reply_expands_parent() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.start_reply(1).unwrap();
        assert!(view.is_expanded(1));
        assert!(view.composer(ComposeTarget::Reply(1)).is_open());
    }

    #[test]
    fn test_start_reply_on_unknown_comment() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        assert_eq!(view.start_reply(99), Err(SubmitRejection::UnknownComment));
        let notices = view.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, SubmitRejection::UnknownComment.message());
    }

    #[test]
    fn test_whitespace_reply_produces_no_submission() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.start_reply(1).unwrap();
        view.set_draft(ComposeTarget::Reply(1), "   \n\t ").unwrap();

        let result = view.submit(ComposeTarget::Reply(1));

        assert_eq!(result, Err(SubmitRejection::EmptyContent));
        assert!(view.composer(ComposeTarget::Reply(1)).is_open());
        assert!(!view.composer(ComposeTarget::Reply(1)).is_submitting());
        let notices = view.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_submit_builds_trimmed_create_action() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Reply(1), "  thanks!  ").unwrap();

        let submission = view.submit(ComposeTarget::Reply(1)).unwrap();

        assert_eq!(
            submission.action,
            PendingAction::Create {
                post_id: 1,
                parent_id: Some(1),
                content: "thanks!".to_string(),
            }
        );
        assert_eq!(submission.ticket.epoch, 7);
        assert!(view.composer(ComposeTarget::Reply(1)).is_submitting());
    }

    #[test]
    fn test_top_level_submit_has_no_parent() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Post, "first").unwrap();
        let submission = view.submit(ComposeTarget::Post).unwrap();
        assert!(matches!(
            submission.action,
            PendingAction::Create { parent_id: None, .. }
        ));
    }

    #[test]
    fn test_second_submit_while_in_flight_is_rejected() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Reply(1), "hello").unwrap();
        view.submit(ComposeTarget::Reply(1)).unwrap();

        assert_eq!(
            view.submit(ComposeTarget::Reply(1)),
            Err(SubmitRejection::AlreadySubmitting)
        );
        assert_eq!(
            view.set_draft(ComposeTarget::Reply(1), "other"),
            Err(SubmitRejection::AlreadySubmitting)
        );
    }

    #[test]
    fn test_successful_reply_is_inserted_locally() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Reply(3), "reply to three").unwrap();
        let submission = view.submit(ComposeTarget::Reply(3)).unwrap();

        let outcome = created(4, Some(3), "reply to three");
        assert_eq!(view.complete(submission.ticket, Ok(outcome)), Completion::Applied);

        assert_eq!(view.composer(ComposeTarget::Reply(3)), &Composer::Idle);
        assert!(view.is_expanded(3));
        let three = view.forest().iter().find(|n| n.comment.id == 3).unwrap();
        assert_eq!(three.children.len(), 1);
        assert_eq!(three.children[0].comment.id, 4);
    }

    #[test]
    fn test_failure_keeps_draft_and_reports() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Reply(1), "keep me").unwrap();
        let submission = view.submit(ComposeTarget::Reply(1)).unwrap();

        let completion = view.complete(
            submission.ticket,
            Err(CommentError::Validation("Comment is too long".to_string())),
        );

        assert_eq!(completion, Completion::Applied);
        assert_eq!(
            view.composer(ComposeTarget::Reply(1)),
            &Composer::Composing {
                draft: "keep me".to_string()
            }
        );
        let notices = view.take_notices();
        assert_eq!(notices[0].message, "Comment is too long");
        assert!(view.take_notices().is_empty());
    }

    #[test]
    fn test_result_for_other_epoch_is_stale() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Post, "x").unwrap();
        let mut submission = view.submit(ComposeTarget::Post).unwrap();
        submission.ticket.epoch += 1;

        let completion = view.complete(submission.ticket, Ok(created(9, None, "x")));

        assert_eq!(completion, Completion::Stale);
        assert!(view.comment(9).is_none());
    }

    #[test]
    fn test_deactivated_view_ignores_results() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Post, "x").unwrap();
        let submission = view.submit(ComposeTarget::Post).unwrap();
        view.deactivate();

        assert_eq!(
            view.complete(submission.ticket, Ok(created(9, None, "x"))),
            Completion::Stale
        );
        assert!(view.comment(9).is_none());
    }

    #[test]
    fn test_independent_replies_can_be_in_flight_together() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Reply(1), "a").unwrap();
        view.set_draft(ComposeTarget::Reply(3), "b").unwrap();
        let first = view.submit(ComposeTarget::Reply(1)).unwrap();
        let second = view.submit(ComposeTarget::Reply(3)).unwrap();

        assert_eq!(
            view.complete(second.ticket, Ok(created(11, Some(3), "b"))),
            Completion::Applied
        );
        assert!(view.composer(ComposeTarget::Reply(1)).is_submitting());
        assert_eq!(
            view.complete(first.ticket, Ok(created(10, Some(1), "a"))),
            Completion::Applied
        );
        assert_eq!(view.comments().len(), 5);
    }

    #[test]
    fn test_edit_requires_moderation_rights() {
        let mut stranger = view_with(Some(99), sample());
        assert_eq!(stranger.start_edit(1), Err(SubmitRejection::NotPermitted));
        assert_eq!(stranger.request_delete(1), Err(SubmitRejection::NotPermitted));

        let mut owner = view_with(Some(POST_AUTHOR), sample());
        owner.start_edit(1).unwrap();
        assert_eq!(
            owner.composer(ComposeTarget::Edit(1)).draft(),
            "comment 1"
        );
    }

    #[test]
    fn test_signed_out_viewer_cannot_moderate() {
        let view = view_with(None, sample());
        assert!(!view.can_moderate(&sample()[0]));
    }

    #[test]
    fn test_successful_edit_replaces_content() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.start_edit(2).unwrap();
        view.set_draft(ComposeTarget::Edit(2), "edited").unwrap();
        let submission = view.submit(ComposeTarget::Edit(2)).unwrap();
        assert_eq!(
            submission.action,
            PendingAction::Update {
                comment_id: 2,
                content: "edited".to_string()
            }
        );

        let mut updated = comment(2, Some(1));
        updated.content = "edited".to_string();
        view.complete(submission.ticket, Ok(MutationOutcome::Updated(updated)));

        assert_eq!(view.comment(2).unwrap().content, "edited");
        assert!(!view.composer(ComposeTarget::Edit(2)).is_open());
    }

    #[test]
    fn test_delete_removes_subtree_locally() {
        let mut view = view_with(Some(POST_AUTHOR), sample());
        view.expand(1);
        view.start_reply(2).unwrap();
        let submission = view.request_delete(1).unwrap();
        assert!(view.is_deleting(1));
        assert_eq!(
            view.request_delete(1),
            Err(SubmitRejection::AlreadySubmitting)
        );

        view.complete(submission.ticket, Ok(MutationOutcome::Deleted));

        assert!(view.comment(1).is_none());
        assert!(view.comment(2).is_none());
        assert!(view.comment(3).is_some());
        assert!(!view.is_deleting(1));
        assert!(!view.composer(ComposeTarget::Reply(2)).is_open());
    }

    #[test]
    fn test_failed_delete_keeps_comment() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        let submission = view.request_delete(3).unwrap();
        view.complete(submission.ticket, Err(CommentError::NotFoundOrUnauthorized));

        assert!(view.comment(3).is_some());
        assert!(!view.is_deleting(3));
        assert_eq!(view.take_notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.set_draft(ComposeTarget::Reply(1), "draft").unwrap();
        assert!(view.cancel(ComposeTarget::Reply(1)));
        assert!(!view.composer(ComposeTarget::Reply(1)).is_open());
        assert!(!view.cancel(ComposeTarget::Reply(1)));
    }

    #[test]
    fn test_visible_rows_hide_collapsed_replies() {
        let mut view = view_with(None, sample());
        let ids: Vec<i64> = view.visible_rows().iter().map(|r| r.comment.id).collect();
        assert_eq!(ids, vec![1, 3]);

        view.expand(1);
        let rows = view.visible_rows();
        let ids: Vec<i64> = rows.iter().map(|r| r.comment.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(rows[1].depth, 1);
        assert_eq!(rows[0].reply_count, 1);
    }

    #[test]
    fn test_refresh_keeps_state_for_surviving_comments() {
        let mut view = view_with(Some(COMMENT_AUTHOR), sample());
        view.expand(1);
        view.expand(3);
        view.refresh(vec![comment(1, None), comment(2, Some(1))]);

        assert!(view.is_expanded(1));
        assert!(!view.is_expanded(3));
        assert_eq!(view.forest().len(), 1);
    }

    #[test]
    fn test_epochs_are_unique() {
        let a = CommentTreeView::next_epoch();
        let b = CommentTreeView::next_epoch();
        assert_ne!(a, b);
    }
}
