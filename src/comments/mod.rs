//! Threaded discussions: forest construction, diagram export, the
//! interactive view state machine, and the store seam it talks through.

pub mod diagram;
mod error;
mod store;
pub mod tree;
pub mod view;

pub use diagram::{generate_diagram, DiagramPost};
pub use error::CommentError;
pub use store::{execute, validate_content, CommentStore};
pub use tree::{build_forest, count_nodes, CommentNode};
pub use view::{
    CommentTreeView, Completion, ComposeTarget, Composer, MutationOutcome, Notice, NoticeLevel,
    PendingAction, Submission, SubmitRejection, Ticket, VisibleRow,
};
