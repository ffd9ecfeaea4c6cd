//! Domain entities - the core business objects.

mod admission;
mod comment;
mod task;

pub use admission::{ClientKey, Decision};
pub use comment::{CommentQuery, CommentSummary, NewComment, TaskComment};
pub use task::TaskId;
