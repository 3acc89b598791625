//! Module for user self-service API endpoints.
//!
//! This module handles the authenticated user's own profile: retrieval,
//! updates, password changes, and account deletion.

pub mod handlers;
pub mod routes;
