//! Maud-based page templates for the web UI.
//!
//! Each page module exports a render function that produces the complete HTML.

pub mod comment;
pub mod home;
pub mod post;
pub mod post_form;
pub mod profile;
pub mod users;

pub use comment::{render_comment_section, CommentCallbacks};
pub use home::render_home_page;
pub use post::{render_post_page, PostPageParams};
pub use post_form::{render_post_form_page, PostFormParams};
pub use profile::{render_profile_page, ProfilePageParams};
pub use users::render_users_page;
