//! Maud HTML template components for the web UI.
//!
//! - `layout`: Base page layout and navigation
//! - `button`: Buttons, link buttons and one-click action forms
//! - `alert`: Alert messages and notices
//! - `form`: Form elements and input components
//! - `markdown`: Post bodies rendered from Markdown
//!
//! # Example
//!
//! ```ignore
//! use maud::html;
//! use crate::components::{Alert, BaseLayout, Button};
//!
//! let content = html! {
//!     (Alert::success("Comment posted"))
//!     (Button::primary("New post").href("/posts/new"))
//! };
//! let page = BaseLayout::new("Home", "Quillboard", None).render(content);
//! ```

pub mod alert;
pub mod button;
pub mod form;
pub mod layout;
pub mod markdown;

pub use alert::{Alert, AlertVariant};
pub use button::{ActionButton, Button, ButtonVariant};
pub use form::{Form, FormGroup, Input, TextArea};
pub use layout::BaseLayout;
pub use markdown::Markdown;

/// Re-export maud for convenience
pub use maud::{html, Markup, PreEscaped, DOCTYPE};
