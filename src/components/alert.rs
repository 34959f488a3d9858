//! Alert components for notices and error messages.

use maud::{html, Markup, Render};

use crate::comments::{Notice, NoticeLevel};

/// Alert variant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertVariant {
    Success,
    Error,
    Info,
}

impl AlertVariant {
    /// CSS class for the alert article element.
    #[must_use]
    pub const fn article_class(&self) -> &'static str {
        match self {
            Self::Success => "alert success",
            Self::Error => "alert error",
            Self::Info => "alert info",
        }
    }
}

/// An alert message component.
///
/// Error alerts carry `role="alert"` so assistive technology announces them.
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub variant: AlertVariant,
    pub title: Option<&'a str>,
    pub message: &'a str,
}

impl<'a> Alert<'a> {
    #[must_use]
    pub const fn new(variant: AlertVariant, message: &'a str) -> Self {
        Self {
            variant,
            title: None,
            message,
        }
    }

    #[must_use]
    pub const fn success(message: &'a str) -> Self {
        Self::new(AlertVariant::Success, message)
    }

    #[must_use]
    pub const fn error(message: &'a str) -> Self {
        Self::new(AlertVariant::Error, message)
    }

    #[must_use]
    pub const fn info(message: &'a str) -> Self {
        Self::new(AlertVariant::Info, message)
    }

    /// Add a title to the alert.
    #[must_use]
    pub const fn with_title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }
}

impl<'a> From<&'a Notice> for Alert<'a> {
    fn from(notice: &'a Notice) -> Self {
        match notice.level {
            NoticeLevel::Success => Self::success(&notice.message),
            NoticeLevel::Error => Self::error(&notice.message),
        }
    }
}

impl Render for Alert<'_> {
    fn render(&self) -> Markup {
        let role = matches!(self.variant, AlertVariant::Error).then_some("alert");

        html! {
            article class=(self.variant.article_class()) role=[role] {
                @if let Some(title) = self.title {
                    strong { (title) }
                    " "
                }
                (self.message)
            }
        }
    }
}
