//! Authentication module for managing accounts, sessions, and password resets.
//!
//! This module provides the public interface for authentication-related
//! functionality: signup, signin, session-token issuance, and the single-use
//! time-boxed password-reset flow.

pub mod handlers;
pub mod models;
pub mod reset;
pub mod routes;
pub mod service;
