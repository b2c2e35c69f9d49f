//! API types for the issue service.
//!
//! This crate contains:
//! - Row types (e.g., `TargetIssue`, `Comment`) - the API representation of database entities
//! - Write entities (e.g., `TargetIssueEntity`, `CommentEntity`) - API input types
//! - Shared enums and list envelopes

pub mod comment;
pub mod issue;
pub mod pagination;
pub mod project;
pub mod target;
pub mod user;

pub use comment::*;
pub use issue::*;
pub use pagination::*;
pub use project::*;
pub use target::*;
pub use user::*;
