//! Transfer API service implementations.

mod submission;
mod tasks;

pub use submission::acquire_submission_id;
pub use tasks::*;
