pub mod cleanup;
pub mod middleware;
pub mod session;

pub use middleware::{cookie_value, MaybeUser, RequireUser};
pub use session::{generate_session_token, issue_session, SessionDuration};
