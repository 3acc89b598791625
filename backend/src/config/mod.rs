//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, token lifetimes, and optional SMTP delivery
//! credentials.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expires_in_seconds: u64,
    pub confirmation_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    /// When true, signup responses carry the raw confirmation token. Meant for
    /// test and development environments where no mail relay is wired up.
    pub expose_confirmation_tokens: bool,
    pub server_port: u16,
    email: Option<EmailConfig>,
}

/// SMTP settings, present only when mail delivery is configured.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub base_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:authgate.db?mode=rwc".to_string());

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;

        let jwt_expires_in_seconds = env::var("JWT_EXPIRES_IN_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<u64>()
            .context("JWT_EXPIRES_IN_SECONDS must be a valid number")?;

        let confirmation_token_ttl_minutes = env::var("CONFIRMATION_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<i64>()
            .context("CONFIRMATION_TOKEN_TTL_MINUTES must be a valid number")?;

        let refresh_token_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<i64>()
            .context("REFRESH_TOKEN_TTL_DAYS must be a valid number")?;

        let expose_confirmation_tokens = env::var("EXPOSE_CONFIRMATION_TOKENS")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .context("EXPOSE_CONFIRMATION_TOKENS must be true or false")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{server_port}"));

        let email = match env::var("SMTP_HOST") {
            Ok(smtp_host) => {
                let smtp_port = env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse::<u16>()
                    .context("SMTP_PORT must be a valid number")?;
                let smtp_username = env::var("SMTP_USERNAME").context("SMTP_USERNAME not set")?;
                let smtp_password = env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not set")?;
                let from_email = env::var("SMTP_FROM_EMAIL").context("SMTP_FROM_EMAIL not set")?;
                let from_name =
                    env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "AuthGate".to_string());

                Some(EmailConfig {
                    smtp_host,
                    smtp_port,
                    smtp_username,
                    smtp_password,
                    from_email,
                    from_name,
                    base_url,
                })
            }
            Err(_) => None,
        };

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            jwt_secret,
            jwt_expires_in_seconds,
            confirmation_token_ttl_minutes,
            refresh_token_ttl_days,
            expose_confirmation_tokens,
            server_port,
            email,
        })
    }

    /// SMTP delivery settings, when configured. Callers run without email when
    /// this is `None`.
    pub fn email_config(&self) -> Option<EmailConfig> {
        self.email.clone()
    }

    /// A config with no mail relay, for wiring services in tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            jwt_secret: "test-secret-key-for-unit-tests".to_string(),
            jwt_expires_in_seconds: 3600,
            confirmation_token_ttl_minutes: 15,
            refresh_token_ttl_days: 30,
            expose_confirmation_tokens: true,
            server_port: 0,
            email: None,
        }
    }
}
