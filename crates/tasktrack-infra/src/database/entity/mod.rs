//! SeaORM entities.

pub mod task_comment;
