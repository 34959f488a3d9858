//! Front page listing recent posts.

use maud::{html, Markup, Render};

use crate::components::{BaseLayout, Button};
use crate::db::{PostWithAuthor, User};

/// Summary card for one post.
pub struct PostCard<'a> {
    pub post: &'a PostWithAuthor,
}

impl Render for PostCard<'_> {
    fn render(&self) -> Markup {
        let post = self.post;
        let comments = match post.comment_count {
            1 => "1 comment".to_string(),
            n => format!("{n} comments"),
        };

        html! {
            article class="post-card" {
                h3 {
                    a href=(format!("/posts/{}", post.id)) { (post.title) }
                }
                p class="meta" {
                    "by "
                    a href=(format!("/users/{}", post.author_id)) { (post.author_name) }
                    " · "
                    time datetime=(post.created_at) { (post.created_at) }
                    " · "
                    (comments)
                }
            }
        }
    }
}

/// Render the home page.
#[must_use]
pub fn render_home_page(posts: &[PostWithAuthor], user: Option<&User>, site_name: &str) -> Markup {
    let content = html! {
        header class="page-header" {
            h1 { "Latest posts" }
            @if user.is_some() {
                (Button::primary("Write a post").href("/posts/new"))
            }
        }

        @if posts.is_empty() {
            p class="empty-state" { "Nothing has been posted yet." }
        } @else {
            div class="post-list" {
                @for post in posts {
                    (PostCard { post })
                }
            }
        }
    };

    BaseLayout::new("Home", site_name, user).render(content)
}
