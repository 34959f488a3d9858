//! Threaded comment section rendered from a [`CommentTreeView`].
//!
//! Every interaction is a plain form post to one of the endpoints produced by
//! [`CommentCallbacks`]; the handler updates the view and redirects back, so
//! the section works without scripts.

use maud::{html, Markup, Render};

use crate::comments::{CommentTreeView, ComposeTarget, Composer, VisibleRow};
use crate::components::{ActionButton, Button, TextArea};
use crate::constants::MAX_COMMENT_CHARS;

/// Interaction endpoints of one post's comment section.
#[derive(Debug, Clone, Copy)]
pub struct CommentCallbacks {
    post_id: i64,
}

impl CommentCallbacks {
    #[must_use]
    pub const fn new(post_id: i64) -> Self {
        Self { post_id }
    }

    fn comment_path(&self, comment_id: i64, action: &str) -> String {
        format!("/posts/{}/comments/{comment_id}/{action}", self.post_id)
    }

    /// New top-level comment.
    #[must_use]
    pub fn on_post(&self) -> String {
        format!("/posts/{}/comments", self.post_id)
    }

    /// Open the reply composer under a comment.
    #[must_use]
    pub fn on_reply(&self, comment_id: i64) -> String {
        self.comment_path(comment_id, "reply/start")
    }

    #[must_use]
    pub fn on_submit_reply(&self, comment_id: i64) -> String {
        self.comment_path(comment_id, "reply")
    }

    #[must_use]
    pub fn on_cancel_reply(&self, comment_id: i64) -> String {
        self.comment_path(comment_id, "reply/cancel")
    }

    #[must_use]
    pub fn on_toggle_expand(&self, comment_id: i64) -> String {
        self.comment_path(comment_id, "toggle")
    }

    #[must_use]
    pub fn on_collapse_all(&self) -> String {
        format!("/posts/{}/comments/collapse", self.post_id)
    }

    #[must_use]
    pub fn on_start_edit(&self, comment_id: i64) -> String {
        self.comment_path(comment_id, "edit/start")
    }

    #[must_use]
    pub fn on_cancel_edit(&self, comment_id: i64) -> String {
        self.comment_path(comment_id, "edit/cancel")
    }

    #[must_use]
    pub fn on_update(&self, comment_id: i64) -> String {
        self.comment_path(comment_id, "edit")
    }

    #[must_use]
    pub fn on_delete(&self, comment_id: i64) -> String {
        self.comment_path(comment_id, "delete")
    }

    #[must_use]
    pub fn diagram(&self) -> String {
        format!("/posts/{}/diagram.mmd", self.post_id)
    }
}

/// Render the discussion: header, top-level composer and visible threads.
#[must_use]
pub fn render_comment_section(view: &CommentTreeView, callbacks: &CommentCallbacks) -> Markup {
    let rows = view.visible_rows();
    let total = view.comments().len();
    let signed_in = view.viewer().is_some();
    let any_expanded = rows.iter().any(|r| r.expanded);

    html! {
        section class="comments" id="comments" aria-label="Comments" {
            header class="comments-header" {
                h2 { "Comments (" (total) ")" }
                div class="comments-tools" {
                    @if any_expanded {
                        (ActionButton::new(&callbacks.on_collapse_all(), Button::small("Collapse all")))
                    }
                    a class="btn btn-sm outline" href=(callbacks.diagram()) { "Diagram" }
                }
            }

            @if signed_in {
                (render_composer(
                    &callbacks.on_post(),
                    None,
                    view.composer(ComposeTarget::Post),
                    "Join the discussion",
                    "Post comment",
                ))
            } @else {
                p class="muted" { "Sign in to join the discussion." }
            }

            @if rows.is_empty() {
                p class="empty-state" { "No comments yet. Start the conversation." }
            } @else {
                ol class="comment-list" {
                    @for row in &rows {
                        (CommentRow { row, callbacks, signed_in })
                    }
                }
            }
        }
    }
}

/// Textarea form for one composer.
fn render_composer(
    action: &str,
    cancel: Option<&str>,
    composer: &Composer,
    label: &str,
    submit_label: &str,
) -> Markup {
    let submitting = composer.is_submitting();
    let mut textarea = TextArea::new("content")
        .value(composer.draft())
        .rows(3)
        .label(label)
        .placeholder(label)
        .maxlength(MAX_COMMENT_CHARS)
        .required();
    if submitting {
        textarea = textarea.disabled();
    }
    let submit = if submitting {
        Button::primary("Posting...").r#type("submit").disabled()
    } else {
        Button::primary(submit_label).r#type("submit")
    };

    html! {
        div class="composer" {
            form method="post" action=(action) {
                (textarea)
                div class="composer-actions" {
                    (submit)
                }
            }
            @if let Some(cancel) = cancel {
                @if !submitting {
                    (ActionButton::new(cancel, Button::secondary("Cancel")))
                }
            }
        }
    }
}

struct CommentRow<'a> {
    row: &'a VisibleRow<'a>,
    callbacks: &'a CommentCallbacks,
    signed_in: bool,
}

impl Render for CommentRow<'_> {
    fn render(&self) -> Markup {
        let row = self.row;
        let comment = row.comment;
        let callbacks = self.callbacks;
        let edited = comment.updated_at != comment.created_at;
        let toggle_label = if row.expanded {
            "Hide replies".to_string()
        } else if row.reply_count == 1 {
            "Show 1 reply".to_string()
        } else {
            format!("Show {} replies", row.reply_count)
        };

        html! {
            li
                class="comment"
                id=(format!("c{}", comment.id))
                data-depth=(row.depth)
                style=(format!("--depth: {}", row.depth.min(8)))
            {
                header class="comment-meta" {
                    strong { (comment.author_name) }
                    " "
                    time datetime=(comment.created_at) { (comment.created_at) }
                    @if edited {
                        " " span class="muted" { "(edited)" }
                    }
                }

                @if row.edit.is_open() {
                    (render_composer(
                        &callbacks.on_update(comment.id),
                        Some(&callbacks.on_cancel_edit(comment.id)),
                        row.edit,
                        "Edit comment",
                        "Save",
                    ))
                } @else {
                    p class="comment-body" { (comment.content) }
                }

                div class="comment-actions" {
                    @if row.reply_count > 0 {
                        (ActionButton::new(
                            &callbacks.on_toggle_expand(comment.id),
                            Button::small(&toggle_label).expanded(row.expanded),
                        ))
                    }
                    @if self.signed_in && !row.reply.is_open() {
                        (ActionButton::new(&callbacks.on_reply(comment.id), Button::small("Reply")))
                    }
                    @if row.can_moderate && !row.edit.is_open() {
                        (ActionButton::new(&callbacks.on_start_edit(comment.id), Button::small("Edit")))
                    }
                    @if row.can_moderate {
                        @if row.deleting {
                            span class="muted" { "Deleting..." }
                        } @else {
                            (ActionButton::new(
                                &callbacks.on_delete(comment.id),
                                Button::small("Delete").class("danger"),
                            ))
                        }
                    }
                }

                @if row.reply.is_open() {
                    (render_composer(
                        &callbacks.on_submit_reply(comment.id),
                        Some(&callbacks.on_cancel_reply(comment.id)),
                        row.reply,
                        "Write a reply",
                        "Post reply",
                    ))
                }
            }
        }
    }
}
