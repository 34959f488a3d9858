//! Markdown rendering for post bodies.
//!
//! Raw HTML in the source is shown as text and links or images with a
//! scheme other than http, https or mailto are neutralised, so the output
//! can be emitted unescaped.

use maud::{Markup, PreEscaped, Render};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Link schemes allowed through to the rendered page.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Post body written in Markdown.
#[derive(Debug, Clone, Copy)]
pub struct Markdown<'a>(pub &'a str);

impl Render for Markdown<'_> {
    fn render(&self) -> Markup {
        PreEscaped(render_markdown(self.0))
    }
}

/// Convert Markdown to HTML safe to embed in a page.
#[must_use]
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;
    let events = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Relative links pass; absolute ones must use a known scheme.
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let unsafe_scheme = url
        .split_once(':')
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.contains(&['/', '?', '#'][..]))
        .is_some_and(|scheme| !SAFE_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()));
    if unsafe_scheme {
        CowStr::Borrowed("#")
    } else {
        url
    }
}
