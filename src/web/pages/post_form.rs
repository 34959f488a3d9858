//! Create and edit forms for posts.

use maud::{html, Markup, Render};

use crate::components::{Alert, BaseLayout, Button, Form, FormGroup, Input, TextArea};
use crate::constants::{MAX_POST_CHARS, MAX_TITLE_CHARS};
use crate::db::User;

#[derive(Debug)]
pub struct PostFormParams<'a> {
    /// `None` when writing a new post.
    pub post_id: Option<i64>,
    pub title: &'a str,
    pub content: &'a str,
    pub error: Option<&'a str>,
    pub user: &'a User,
    pub site_name: &'a str,
}

#[must_use]
pub fn render_post_form_page(params: &PostFormParams<'_>) -> Markup {
    let (heading, action, submit) = match params.post_id {
        Some(id) => ("Edit post", format!("/posts/{id}/edit"), "Save changes"),
        None => ("New post", "/posts".to_string(), "Publish"),
    };

    let fields = html! {
        (FormGroup::new(
            "Title",
            "title",
            Input::text("title")
                .id("title")
                .value(params.title)
                .maxlength(MAX_TITLE_CHARS)
                .required()
                .render(),
        ))
        (FormGroup::new(
            "Content",
            "content",
            TextArea::new("content")
                .id("content")
                .value(params.content)
                .rows(12)
                .maxlength(MAX_POST_CHARS)
                .required()
                .render(),
        ))
        (Button::primary(submit).r#type("submit"))
    };

    let content = html! {
        h1 { (heading) }
        @if let Some(error) = params.error {
            (Alert::error(error))
        }
        (Form::post(&action, fields).class("post-form"))
    };

    BaseLayout::new(heading, params.site_name, Some(params.user)).render(content)
}
