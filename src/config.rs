use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::leave::{ApprovalScope, LeavePolicy};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub default_leave_allotment: u32,
    pub approval_scope: ApprovalScope,

    pub log_dir: String,
    pub log_level: String,

    /// Seeded at start-up when both are present.
    pub seed_admin_email: Option<String>,
    pub seed_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", 3600)?,

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            default_leave_allotment: parsed_or("DEFAULT_LEAVE_ALLOTMENT", 25)?,
            approval_scope: match env::var("APPROVAL_SCOPE") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|e: String| anyhow!(e))
                    .context("APPROVAL_SCOPE")?,
                Err(_) => ApprovalScope::default(),
            },

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            seed_admin_email: env::var("SEED_ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            seed_admin_password: env::var("SEED_ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }

    pub fn leave_policy(&self) -> LeavePolicy {
        LeavePolicy {
            approval_scope: self.approval_scope,
            default_allotment: self.default_leave_allotment,
        }
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value {raw:?}")),
        Err(_) => Ok(default),
    }
}
