//! Post page: the post itself followed by its discussion.

use maud::{html, Markup};

use super::comment::{render_comment_section, CommentCallbacks};
use crate::comments::{CommentTreeView, Notice};
use crate::components::{ActionButton, Alert, BaseLayout, Button, Markdown};
use crate::db::{PostWithAuthor, User};

/// Parameters for the post page.
#[derive(Debug)]
pub struct PostPageParams<'a> {
    pub post: &'a PostWithAuthor,
    pub view: &'a CommentTreeView,
    pub notices: &'a [Notice],
    pub user: Option<&'a User>,
    pub site_name: &'a str,
}

#[must_use]
pub fn render_post_page(params: &PostPageParams<'_>) -> Markup {
    let post = params.post;
    let is_author = params.user.is_some_and(|u| u.id == post.author_id);
    let callbacks = CommentCallbacks::new(post.id);
    let edit_href = format!("/posts/{}/edit", post.id);
    let delete_action = format!("/posts/{}/delete", post.id);

    let content = html! {
        article class="post" {
            header {
                h1 { (post.title) }
                p class="meta" {
                    "by "
                    a href=(format!("/users/{}", post.author_id)) { (post.author_name) }
                    " · "
                    time datetime=(post.created_at) { (post.created_at) }
                    @if post.updated_at != post.created_at {
                        " · " span class="muted" { "edited " (post.updated_at) }
                    }
                }
                @if is_author {
                    div class="post-actions" {
                        (Button::outline("Edit post").href(&edit_href))
                        (ActionButton::new(&delete_action, Button::danger("Delete post")))
                    }
                }
            }
            div class="post-body" { (Markdown(&post.content)) }
        }

        @if !params.notices.is_empty() {
            div class="notices" aria-live="polite" {
                @for notice in params.notices {
                    (Alert::from(notice))
                }
            }
        }

        (render_comment_section(params.view, &callbacks))
    };

    BaseLayout::new(&post.title, params.site_name, params.user).render(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::NoticeLevel;

    fn sample_post() -> PostWithAuthor {
        PostWithAuthor {
            id: 9,
            author_id: 3,
            title: "On threads".to_string(),
            content: "Some thoughts".to_string(),
            created_at: "2024-01-15 12:00:00".to_string(),
            updated_at: "2024-01-15 12:00:00".to_string(),
            author_name: "carol".to_string(),
            comment_count: 0,
        }
    }

    fn sample_user(id: i64) -> User {
        User {
            id,
            username: format!("user{id}"),
            display_name: None,
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_post_page_renders_post_and_notices() {
        let post = sample_post();
        let view = CommentTreeView::new(9, 3, None, Vec::new(), 1);
        let notices = vec![Notice {
            level: NoticeLevel::Success,
            message: "Comment posted".to_string(),
        }];
        let html = render_post_page(&PostPageParams {
            post: &post,
            view: &view,
            notices: &notices,
            user: None,
            site_name: "Quillboard",
        })
        .into_string();

        assert!(html.contains("<h1>On threads</h1>"));
        assert!(html.contains("Comment posted"));
        assert!(html.contains("Comments (0)"));
        assert!(!html.contains("Edit post"));
    }

    #[test]
    fn test_post_body_renders_markdown() {
        let mut post = sample_post();
        post.content = "# Title\n\nA *point* <script>alert(1)</script>".to_string();
        let view = CommentTreeView::new(9, 3, None, Vec::new(), 1);
        let html = render_post_page(&PostPageParams {
            post: &post,
            view: &view,
            notices: &[],
            user: None,
            site_name: "Quillboard",
        })
        .into_string();

        assert!(html.contains(r#"<div class="post-body"><h1>Title</h1>"#));
        assert!(html.contains("<em>point</em>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_author_sees_post_controls() {
        let post = sample_post();
        let user = sample_user(3);
        let view = CommentTreeView::new(9, 3, Some(3), Vec::new(), 1);
        let html = render_post_page(&PostPageParams {
            post: &post,
            view: &view,
            notices: &[],
            user: Some(&user),
            site_name: "Quillboard",
        })
        .into_string();

        assert!(html.contains(r#"href="/posts/9/edit""#));
        assert!(html.contains(r#"action="/posts/9/delete""#));
    }
}
