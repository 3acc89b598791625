//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business operations
//! and orchestrate interactions between different parts of the application,
//! such as minting tokens, mutating account lifecycle state, or delivering
//! email.

pub mod admin_service;
pub mod confirmation_token_service;
pub mod email_service;
pub mod refresh_token_service;
pub mod user_service;
