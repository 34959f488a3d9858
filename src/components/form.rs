//! Form components for maud templates.
//!
//! These match the styles defined in `static/css/style.css`.

use maud::{html, Markup, Render};

/// A form container element.
#[derive(Debug)]
pub struct Form<'a> {
    pub action: &'a str,
    /// HTTP method ("get" or "post")
    pub method: &'a str,
    pub content: Markup,
    pub class: Option<&'a str>,
}

impl<'a> Form<'a> {
    #[must_use]
    pub fn new(action: &'a str, method: &'a str, content: Markup) -> Self {
        Self {
            action,
            method,
            content,
            class: None,
        }
    }

    /// Create a POST form.
    #[must_use]
    pub fn post(action: &'a str, content: Markup) -> Self {
        Self::new(action, "post", content)
    }

    #[must_use]
    pub fn class(mut self, class: &'a str) -> Self {
        self.class = Some(class);
        self
    }
}

impl Render for Form<'_> {
    fn render(&self) -> Markup {
        html! {
            form action=(self.action) method=(self.method) class=[self.class] {
                (self.content)
            }
        }
    }
}

/// An input element.
#[derive(Debug, Clone)]
pub struct Input<'a> {
    pub name: &'a str,
    pub r#type: &'a str,
    pub value: Option<&'a str>,
    pub placeholder: Option<&'a str>,
    pub required: bool,
    pub id: Option<&'a str>,
    pub maxlength: Option<usize>,
}

impl<'a> Input<'a> {
    #[must_use]
    pub fn new(name: &'a str, r#type: &'a str) -> Self {
        Self {
            name,
            r#type,
            value: None,
            placeholder: None,
            required: false,
            id: None,
            maxlength: None,
        }
    }

    #[must_use]
    pub fn text(name: &'a str) -> Self {
        Self::new(name, "text")
    }

    /// Create a hidden input with a value.
    #[must_use]
    pub fn hidden(name: &'a str, value: &'a str) -> Self {
        Self::new(name, "hidden").value(value)
    }

    #[must_use]
    pub fn value(mut self, value: &'a str) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn maxlength(mut self, maxlength: usize) -> Self {
        self.maxlength = Some(maxlength);
        self
    }
}

impl Render for Input<'_> {
    fn render(&self) -> Markup {
        html! {
            input
                type=(self.r#type)
                name=(self.name)
                value=[self.value]
                placeholder=[self.placeholder]
                required[self.required]
                id=[self.id]
                maxlength=[self.maxlength];
        }
    }
}

/// A textarea element.
#[derive(Debug)]
pub struct TextArea<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
    pub placeholder: Option<&'a str>,
    pub rows: Option<u32>,
    pub required: bool,
    pub disabled: bool,
    pub id: Option<&'a str>,
    pub label: Option<&'a str>,
    pub maxlength: Option<usize>,
}

impl<'a> TextArea<'a> {
    #[must_use]
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            value: None,
            placeholder: None,
            rows: None,
            required: false,
            disabled: false,
            id: None,
            label: None,
            maxlength: None,
        }
    }

    #[must_use]
    pub fn value(mut self, value: &'a str) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    #[must_use]
    pub fn rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    /// Accessible name, rendered as `aria-label`.
    #[must_use]
    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    #[must_use]
    pub fn maxlength(mut self, maxlength: usize) -> Self {
        self.maxlength = Some(maxlength);
        self
    }
}

impl Render for TextArea<'_> {
    fn render(&self) -> Markup {
        html! {
            textarea
                name=(self.name)
                placeholder=[self.placeholder]
                rows=[self.rows]
                required[self.required]
                disabled[self.disabled]
                id=[self.id]
                aria-label=[self.label]
                maxlength=[self.maxlength]
            {
                @if let Some(value) = self.value {
                    (value)
                }
            }
        }
    }
}

/// A label plus control pair.
#[derive(Debug)]
pub struct FormGroup<'a> {
    pub label: &'a str,
    pub for_id: &'a str,
    pub control: Markup,
}

impl<'a> FormGroup<'a> {
    #[must_use]
    pub fn new(label: &'a str, for_id: &'a str, control: Markup) -> Self {
        Self {
            label,
            for_id,
            control,
        }
    }
}

impl Render for FormGroup<'_> {
    fn render(&self) -> Markup {
        html! {
            div class="form-group" {
                label for=(self.for_id) { (self.label) }
                (self.control)
            }
        }
    }
}
