//! Collection of general utility functions and common traits.
//!
//! This module serves as a repository for small, reusable helper functions
//! or traits that do not fit into other specific domain modules.

pub mod generate_random_string;
pub mod jwt;
