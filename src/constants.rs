//! Shared constants used across the application.

/// Maximum number of characters of comment or post text shown in a diagram label.
pub const DIAGRAM_LABEL_MAX_CHARS: usize = 40;

/// Maximum accepted comment length, in characters.
pub const MAX_COMMENT_CHARS: usize = 10_000;

/// Maximum accepted post title length, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum accepted post body length, in characters.
pub const MAX_POST_CHARS: usize = 100_000;

/// Maximum accepted display name length, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// Cookie carrying the authenticated session token.
pub const SESSION_COOKIE: &str = "session";

/// Cookie identifying a browser's comment view state.
pub const VIEW_COOKIE: &str = "qb_view";
