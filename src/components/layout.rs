//! Base layout components for the web UI.
//!
//! This module provides the main page layout structure including
//! the HTML skeleton, navigation, and footer.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::db::User;

/// Critical theme initialization script that runs in <head> to prevent flash of wrong theme.
const THEME_INIT_SCRIPT: &str = r"(function() {
    if (window.matchMedia('(prefers-color-scheme: dark)').matches) {
        document.documentElement.setAttribute('data-theme', 'dark');
    }
})();";

/// Base page layout builder.
///
/// # Example
///
/// ```ignore
/// use maud::html;
/// use crate::components::layout::BaseLayout;
///
/// let content = html! { h1 { "Hello World" } };
/// let page = BaseLayout::new("My Page", "Quillboard", user.as_ref())
///     .render(content);
/// ```
#[derive(Debug, Clone)]
pub struct BaseLayout<'a> {
    title: &'a str,
    site_name: &'a str,
    user: Option<&'a User>,
}

impl<'a> BaseLayout<'a> {
    /// Create a new base layout with the given page title and user.
    ///
    /// Pass `None` for anonymous visitors.
    #[must_use]
    pub fn new(title: &'a str, site_name: &'a str, user: Option<&'a User>) -> Self {
        Self {
            title,
            site_name,
            user,
        }
    }

    /// Render the complete HTML page with the given content.
    ///
    /// The content will be placed inside the `<main class="container">` element.
    #[must_use]
    pub fn render(self, content: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" data-theme="light" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    meta name="color-scheme" content="light dark";
                    title { (self.title) " - " (self.site_name) }
                    link rel="stylesheet" href="/static/css/style.css";
                    script { (PreEscaped(THEME_INIT_SCRIPT)) }
                }
                body {
                    (self.render_header())
                    main class="container" {
                        (content)
                    }
                    (self.render_footer())
                }
            }
        }
    }

    fn render_header(&self) -> Markup {
        html! {
            header class="container" {
                nav {
                    ul {
                        li {
                            a href="/" {
                                strong class="site-logo" { (self.site_name) }
                            }
                        }
                    }
                    ul {
                        li { a href="/" { "Posts" } }
                        li { a href="/users" { "People" } }
                        (self.render_auth_nav())
                    }
                }
            }
        }
    }

    fn render_auth_nav(&self) -> Markup {
        match self.user {
            Some(u) => html! {
                li { a href="/posts/new" { "Write" } }
                li { a href=(format!("/users/{}", u.id)) { (u.name()) } }
            },
            None => html! {
                li { span class="muted" { "Reading as guest" } }
            },
        }
    }

    fn render_footer(&self) -> Markup {
        html! {
            footer class="container" {
                small { (self.site_name) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 4,
            username: "alice".to_string(),
            display_name: Some("Alice A.".to_string()),
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_base_layout_basic_structure() {
        let page = BaseLayout::new("Test Page", "Quillboard", None)
            .render(html! { h1 { "Test Content" } });
        let html = page.into_string();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Test Page - Quillboard</title>"));
        assert!(html.contains(r#"<link rel="stylesheet" href="/static/css/style.css">"#));
        assert!(html.contains(r#"<main class="container">"#));
        assert!(html.contains("<h1>Test Content</h1>"));
    }

    #[test]
    fn test_base_layout_anonymous_user() {
        let html = BaseLayout::new("Anon", "Quillboard", None)
            .render(html! {})
            .into_string();
        assert!(html.contains("Reading as guest"));
        assert!(html.contains(r#"<a href="/users">People</a>"#));
        assert!(!html.contains(r#"href="/posts/new""#));
    }

    #[test]
    fn test_base_layout_signed_in_user() {
        let user = test_user();
        let html = BaseLayout::new("User", "Quillboard", Some(&user))
            .render(html! {})
            .into_string();
        assert!(html.contains(r#"<a href="/users/4">Alice A.</a>"#));
        assert!(html.contains(r#"href="/posts/new""#));
    }
}
