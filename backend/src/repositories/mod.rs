//! Database repositories.
//!
//! Each repository owns the persistence operations for one entity and keeps
//! query logic out of the service layer.

pub mod user_repository;
