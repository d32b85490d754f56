//! Role-based static review of changed Python files.
//!
//! [`engine::Reviewer`] fans every file out to the roles in a
//! [`roles::RoleRegistry`] and folds the results into a
//! [`report::ReviewReport`]. Violations are data: only the final report
//! decides whether the review failed.

pub mod branch_guard;
pub mod engine;
pub mod report;
pub mod roles;
pub mod source;

pub use engine::{Reviewer, load_sources};
pub use report::{ReportFormat, ReviewReport};
