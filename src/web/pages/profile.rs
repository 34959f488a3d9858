//! User profile page.

use maud::{html, Markup, Render};

use super::home::PostCard;
use crate::components::{Alert, BaseLayout, Button, Form, FormGroup, Input};
use crate::constants::MAX_DISPLAY_NAME_CHARS;
use crate::db::{PostWithAuthor, User};

#[derive(Debug)]
pub struct ProfilePageParams<'a> {
    pub profile: &'a User,
    pub posts: &'a [PostWithAuthor],
    /// The signed-in visitor, if any.
    pub user: Option<&'a User>,
    pub message: Option<&'a str>,
    pub site_name: &'a str,
}

#[must_use]
pub fn render_profile_page(params: &ProfilePageParams<'_>) -> Markup {
    let profile = params.profile;
    let own_profile = params.user.is_some_and(|u| u.id == profile.id);

    let content = html! {
        header class="page-header" {
            h1 { (profile.name()) }
            p class="meta" { "@" (profile.username) " · joined " (profile.created_at) }
        }

        @if let Some(message) = params.message {
            (Alert::info(message))
        }

        @if own_profile {
            section class="account" {
                h2 { "Display name" }
                (Form::post("/account/name", html! {
                    (FormGroup::new(
                        "Shown next to your posts and comments",
                        "display_name",
                        Input::text("display_name")
                            .id("display_name")
                            .value(profile.display_name.as_deref().unwrap_or(""))
                            .placeholder(&profile.username)
                            .maxlength(MAX_DISPLAY_NAME_CHARS)
                            .render(),
                    ))
                    (Button::primary("Save").r#type("submit"))
                }))
            }
        }

        section {
            h2 { "Posts" }
            @if params.posts.is_empty() {
                p class="empty-state" { "No posts yet." }
            } @else {
                div class="post-list" {
                    @for post in params.posts {
                        (PostCard { post })
                    }
                }
            }
        }
    };

    BaseLayout::new(profile.name(), params.site_name, params.user).render(content)
}
