//! Module for database access repositories.
//!
//! Repositories own the SQL for one table each and expose typed operations to
//! the service layer. They never enforce business rules; that stays in the
//! services composing them.

pub mod confirmation_token_repository;
pub mod refresh_token_repository;
pub mod user_repository;
