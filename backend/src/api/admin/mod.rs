//! Module for administrative user-management API endpoints.
//!
//! This module handles listing, inspecting, and overriding the lifecycle of
//! user accounts.

pub mod handlers;
pub mod models;
pub mod routes;
