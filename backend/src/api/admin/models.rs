//! Data structures for the administrative user-management endpoints.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Query parameters for the admin user listing
#[derive(Debug, Deserialize)]
pub struct UserListFilter {
    /// Page number (1-indexed)
    pub page: Option<u32>,
    /// Number of items per page
    pub per_page: Option<u32>,
    /// Sort column, restricted to [`UserSortBy`]
    pub sort_by: Option<String>,
    /// Sort direction, ascending by default
    pub ascending: Option<bool>,
}

/// Query parameters for the lifecycle override endpoint
#[derive(Debug, Deserialize)]
pub struct UserStatusParams {
    pub locked: Option<bool>,
    pub enabled: Option<bool>,
}

/// Whitelisted sort columns for the user listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortBy {
    Email,
    FirstName,
    LastName,
    CreatedAt,
}

impl UserSortBy {
    /// Column name interpolated into the ORDER BY clause. Only values from
    /// this whitelist ever reach the SQL text.
    pub fn column(&self) -> &'static str {
        match self {
            UserSortBy::Email => "email",
            UserSortBy::FirstName => "first_name",
            UserSortBy::LastName => "last_name",
            UserSortBy::CreatedAt => "created_at",
        }
    }
}

impl FromStr for UserSortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(UserSortBy::Email),
            "first_name" => Ok(UserSortBy::FirstName),
            "last_name" => Ok(UserSortBy::LastName),
            "created_at" => Ok(UserSortBy::CreatedAt),
            other => Err(format!(
                "Invalid sort field: {}. Allowed values: email, first_name, last_name, created_at",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_parsing_is_whitelisted() {
        assert!(matches!(
            "email".parse::<UserSortBy>(),
            Ok(UserSortBy::Email)
        ));
        assert!(matches!(
            "created_at".parse::<UserSortBy>(),
            Ok(UserSortBy::CreatedAt)
        ));
        assert!("password_hash".parse::<UserSortBy>().is_err());
        assert!("email; DROP TABLE users".parse::<UserSortBy>().is_err());
    }

    #[test]
    fn sort_columns_match_schema_names() {
        assert_eq!(UserSortBy::Email.column(), "email");
        assert_eq!(UserSortBy::FirstName.column(), "first_name");
        assert_eq!(UserSortBy::LastName.column(), "last_name");
        assert_eq!(UserSortBy::CreatedAt.column(), "created_at");
    }
}
