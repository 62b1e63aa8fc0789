//! API module for shared HTTP response plumbing.

pub mod common;
