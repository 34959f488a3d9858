//! Button component for the web UI.
//!
//! [`Button`] renders as either a `<button>` or `<a>` element based on
//! whether an href is provided. [`ActionButton`] wraps a single submit button
//! in its own POST form, which is how every comment interaction is wired.

use maud::{html, Markup, Render};

/// Button style variants matching CSS classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonVariant {
    #[default]
    Primary,
    Outline,
    Secondary,
    Danger,
    /// Compact inline button used in comment toolbars
    Small,
}

impl ButtonVariant {
    /// Returns the CSS class(es) for this variant.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Primary => "btn btn-primary",
            Self::Outline => "btn outline",
            Self::Secondary => "btn btn-secondary",
            Self::Danger => "btn btn-danger",
            Self::Small => "btn btn-sm",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Button<'a> {
    pub label: &'a str,
    pub variant: ButtonVariant,
    /// Renders as `<a>` if present
    pub href: Option<&'a str>,
    pub disabled: bool,
    pub r#type: Option<&'a str>,
    pub class: Option<&'a str>,
    pub aria_expanded: Option<bool>,
}

impl<'a> Button<'a> {
    #[must_use]
    pub const fn new(label: &'a str, variant: ButtonVariant) -> Self {
        Self {
            label,
            variant,
            href: None,
            disabled: false,
            r#type: None,
            class: None,
            aria_expanded: None,
        }
    }

    #[must_use]
    pub const fn primary(label: &'a str) -> Self {
        Self::new(label, ButtonVariant::Primary)
    }

    #[must_use]
    pub const fn outline(label: &'a str) -> Self {
        Self::new(label, ButtonVariant::Outline)
    }

    #[must_use]
    pub const fn secondary(label: &'a str) -> Self {
        Self::new(label, ButtonVariant::Secondary)
    }

    #[must_use]
    pub const fn danger(label: &'a str) -> Self {
        Self::new(label, ButtonVariant::Danger)
    }

    #[must_use]
    pub const fn small(label: &'a str) -> Self {
        Self::new(label, ButtonVariant::Small)
    }

    /// Sets the href, rendering the button as an `<a>` element.
    #[must_use]
    pub const fn href(mut self, href: &'a str) -> Self {
        self.href = Some(href);
        self
    }

    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Sets the button type attribute.
    #[must_use]
    pub const fn r#type(mut self, r#type: &'a str) -> Self {
        self.r#type = Some(r#type);
        self
    }

    /// Adds additional CSS classes.
    #[must_use]
    pub const fn class(mut self, class: &'a str) -> Self {
        self.class = Some(class);
        self
    }

    /// Marks the button as a disclosure control.
    #[must_use]
    pub const fn expanded(mut self, expanded: bool) -> Self {
        self.aria_expanded = Some(expanded);
        self
    }

    fn build_class(&self) -> String {
        let mut classes = self.variant.class().to_string();
        if let Some(extra) = self.class {
            classes.push(' ');
            classes.push_str(extra);
        }
        classes
    }
}

impl Render for Button<'_> {
    fn render(&self) -> Markup {
        let classes = self.build_class();
        let expanded = self.aria_expanded.map(|e| if e { "true" } else { "false" });

        if let Some(href) = self.href {
            html! {
                a
                    class=(classes)
                    href=(href)
                    aria-disabled=[self.disabled.then_some("true")]
                {
                    (self.label)
                }
            }
        } else {
            html! {
                button
                    class=(classes)
                    type=(self.r#type.unwrap_or("button"))
                    disabled[self.disabled]
                    aria-expanded=[expanded]
                {
                    (self.label)
                }
            }
        }
    }
}

/// A single button posting to `action`.
#[derive(Debug, Clone)]
pub struct ActionButton<'a> {
    pub action: &'a str,
    pub button: Button<'a>,
}

impl<'a> ActionButton<'a> {
    #[must_use]
    pub const fn new(action: &'a str, button: Button<'a>) -> Self {
        Self { action, button }
    }
}

impl Render for ActionButton<'_> {
    fn render(&self) -> Markup {
        let button = self.button.clone().r#type("submit");
        html! {
            form class="inline-form" method="post" action=(self.action) {
                (button)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_button() {
        let html = Button::primary("Post").render().into_string();
        assert!(html.contains("btn btn-primary"));
        assert!(html.contains("<button"));
        assert!(html.contains("type=\"button\""));
    }

    #[test]
    fn test_button_with_href() {
        let html = Button::outline("Back").href("/").render().into_string();
        assert!(html.contains("<a"));
        assert!(html.contains("href=\"/\""));
        assert!(!html.contains("<button"));
    }

    #[test]
    fn test_button_disabled() {
        let html = Button::primary("Posting...").disabled().render().into_string();
        assert!(html.contains("disabled"));
    }

    #[test]
    fn test_button_with_extra_class() {
        let html = Button::danger("Delete").class("wide").render().into_string();
        assert!(html.contains("btn btn-danger wide"));
    }

    #[test]
    fn test_disclosure_button_state() {
        let html = Button::small("Hide replies").expanded(true).render().into_string();
        assert!(html.contains("aria-expanded=\"true\""));
    }

    #[test]
    fn test_action_button_posts_to_action() {
        let html = ActionButton::new("/posts/1/comments/2/toggle", Button::small("Show"))
            .render()
            .into_string();
        assert!(html.contains("method=\"post\""));
        assert!(html.contains("action=\"/posts/1/comments/2/toggle\""));
        assert!(html.contains("type=\"submit\""));
    }
}
