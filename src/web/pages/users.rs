//! Directory of everyone with an account.

use maud::{html, Markup, Render};

use crate::components::BaseLayout;
use crate::db::{User, UserSummary};

/// One entry in the directory.
pub struct PersonCard<'a> {
    pub person: &'a UserSummary,
}

impl Render for PersonCard<'_> {
    fn render(&self) -> Markup {
        let user = &self.person.user;
        let posts = match self.person.post_count {
            1 => "1 post".to_string(),
            n => format!("{n} posts"),
        };

        html! {
            article class="person-card" {
                h3 {
                    a href=(format!("/users/{}", user.id)) { (user.name()) }
                }
                p class="meta" { "@" (user.username) " · " (posts) }
            }
        }
    }
}

#[must_use]
pub fn render_users_page(people: &[UserSummary], user: Option<&User>, site_name: &str) -> Markup {
    let content = html! {
        header class="page-header" {
            h1 { "People" }
        }

        @if people.is_empty() {
            p class="empty-state" { "No profiles found." }
        } @else {
            div class="person-list" {
                @for person in people {
                    (PersonCard { person })
                }
            }
        }
    };

    BaseLayout::new("People", site_name, user).render(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64, display_name: Option<&str>, post_count: i64) -> UserSummary {
        UserSummary {
            user: User {
                id,
                username: format!("user{id}"),
                display_name: display_name.map(str::to_string),
                created_at: "2024-01-01 00:00:00".to_string(),
            },
            post_count,
        }
    }

    #[test]
    fn test_directory_links_each_profile() {
        let people = vec![summary(1, Some("Ada"), 1), summary(2, None, 3)];
        let html = render_users_page(&people, None, "Quillboard").into_string();

        assert!(html.contains(r#"<a href="/users/1">Ada</a>"#));
        assert!(html.contains(r#"<a href="/users/2">user2</a>"#));
        assert!(html.contains("@user1 · 1 post"));
        assert!(html.contains("3 posts"));
    }

    #[test]
    fn test_directory_empty_state() {
        let html = render_users_page(&[], None, "Quillboard").into_string();
        assert!(html.contains("No profiles found."));
    }
}
