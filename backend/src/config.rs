//! Server configuration loaded from environment variables.
//!
//! Repository selection has its own configuration in [`crate::db::repo_config`]
//! and [`crate::db::factory`].

use std::env;

use chrono::Duration;

use crate::services::mailer::DEFAULT_FROM;

pub const DEFAULT_PLATFORM_COMPANY: &str = "Nuloop";

/// Rules about the reserved platform company super admins belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPolicy {
    pub platform_company: String,
}

impl PlatformPolicy {
    pub fn new(platform_company: impl Into<String>) -> Self {
        Self {
            platform_company: platform_company.into(),
        }
    }

    /// Whether a company with this name is the platform company.
    pub fn is_platform(&self, company_name: &str) -> bool {
        company_name.trim().eq_ignore_ascii_case(self.platform_company.trim())
    }
}

impl Default for PlatformPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORM_COMPANY)
    }
}

/// Credentials of a super admin created at startup if missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// Resend API key; email is only logged when absent.
    pub resend_api_key: Option<String>,
    pub from: String,
}

/// Everything the HTTP server needs besides the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub session_ttl_hours: i64,
    pub draft_ttl_hours: i64,
    pub policy: PlatformPolicy,
    pub mail: MailConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            session_ttl_hours: 12,
            draft_ttl_hours: 24,
            policy: PlatformPolicy::default(),
            mail: MailConfig {
                resend_api_key: None,
                from: DEFAULT_FROM.to_string(),
            },
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `HOST` (default: 0.0.0.0), `PORT` (default: 8080)
    /// - `SESSION_TTL_HOURS` (default: 12): admin token lifetime
    /// - `DRAFT_TTL_HOURS` (default: 24): idle tally draft lifetime
    /// - `PLATFORM_COMPANY_NAME` (default: Nuloop)
    /// - `RESEND_API_KEY`, `RESEND_FROM_EMAIL`
    /// - `BOOTSTRAP_ADMIN_EMAIL` and `BOOTSTRAP_ADMIN_PASSWORD` (both or neither)
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = parse_var("PORT", defaults.port)?;
        let session_ttl_hours = parse_var("SESSION_TTL_HOURS", defaults.session_ttl_hours)?;
        let draft_ttl_hours = parse_var("DRAFT_TTL_HOURS", defaults.draft_ttl_hours)?;
        if session_ttl_hours <= 0 || draft_ttl_hours <= 0 {
            return Err("SESSION_TTL_HOURS and DRAFT_TTL_HOURS must be positive".to_string());
        }

        let policy = env::var("PLATFORM_COMPANY_NAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| PlatformPolicy::new(v.trim()))
            .unwrap_or(defaults.policy);

        let mail = MailConfig {
            resend_api_key: non_empty_var("RESEND_API_KEY"),
            from: non_empty_var("RESEND_FROM_EMAIL").unwrap_or(defaults.mail.from),
        };

        let bootstrap_admin = match (
            non_empty_var("BOOTSTRAP_ADMIN_EMAIL"),
            non_empty_var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            _ => {
                return Err(
                    "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                        .to_string(),
                )
            }
        };

        Ok(Self {
            host,
            port,
            session_ttl_hours,
            draft_ttl_hours,
            policy,
            mail,
            bootstrap_admin,
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }

    pub fn draft_ttl(&self) -> Duration {
        Duration::hours(self.draft_ttl_hours)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_match_ignores_case_and_spaces() {
        let policy = PlatformPolicy::default();
        assert!(policy.is_platform(" nuloop "));
        assert!(!policy.is_platform("Nuloop Cleaning"));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.session_ttl(), Duration::hours(12));
        assert_eq!(config.mail.from, "Bin Tally <onboarding@resend.dev>");
    }
}
