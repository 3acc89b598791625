//! Authentication module for managing user accounts, sessions, and access control.
//!
//! This module provides the public interface for user authentication-related functionalities
//! such as signup, signin, email confirmation, password reset, token refresh,
//! and the authorization middleware protecting the rest of the API.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
