pub mod definition;
pub mod error;
pub mod guard;
pub mod issues;
pub mod pagination;
mod permissions;
