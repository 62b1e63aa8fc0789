//! Service layer for external collaborators.

pub mod email_service;
