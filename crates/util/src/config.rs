use std::{env, fmt, net::SocketAddr};

use super::server_bind_address;

pub const DEFAULT_EMAIL_API_BASE_URL: &str = "https://api.resend.com/";
pub const DEFAULT_NOTIFY_FROM: &str = "Jewelry Back Office <onboarding@resend.dev>";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";

/// Deployment mode, from `APP_ENV`. Production refuses to start without
/// an email API key and logs JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Only production refuses to start without an email API key.
    pub fn requires_email_key(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Name written to the `env` field of the startup log line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Settings for the outbound transactional email API.
#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub from_address: String,
    pub admin_address: String,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("from_address", &self.from_address)
            .field("admin_address", &self.admin_address)
            .finish()
    }
}

impl EmailConfig {
    fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        let api_key = non_empty_var("RESEND_API_KEY");
        if api_key.is_none() && environment.requires_email_key() {
            return Err(ConfigError::MissingVariable("RESEND_API_KEY"));
        }

        let api_base_url = non_empty_var("EMAIL_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_EMAIL_API_BASE_URL.to_string());
        if !(api_base_url.starts_with("https://") || api_base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidApiBaseUrl(api_base_url));
        }

        Ok(Self {
            api_key,
            api_base_url,
            from_address: non_empty_var("NOTIFY_FROM")
                .unwrap_or_else(|| DEFAULT_NOTIFY_FROM.to_string()),
            admin_address: non_empty_var("NOTIFY_ADMIN_EMAIL")
                .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
        })
    }
}

/// Everything the notification service needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub email: EmailConfig,
}

impl AppConfig {
    /// Reads `APP_ENV`, `APP_BIND_ADDR` and the email settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;
        let email = EmailConfig::from_env(environment)?;

        Ok(Self {
            bind_addr,
            environment,
            email,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Startup configuration problems; each message names the variable to fix.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    MissingVariable(&'static str),
    InvalidApiBaseUrl(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::MissingVariable(name) => {
                write!(f, "{name} must be set when APP_ENV is production")
            }
            Self::InvalidApiBaseUrl(value) => {
                write!(f, "EMAIL_API_BASE_URL must be an http(s) url (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_BIND_ADDR, ENV_GUARD};

    const VARS: [&str; 6] = [
        "APP_ENV",
        "APP_BIND_ADDR",
        "RESEND_API_KEY",
        "EMAIL_API_BASE_URL",
        "NOTIFY_FROM",
        "NOTIFY_ADMIN_EMAIL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_defaults_in_development() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();

        let config = AppConfig::from_env().expect("config should load with defaults");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.email.api_key, None);
        assert_eq!(config.email.api_base_url, DEFAULT_EMAIL_API_BASE_URL);
        assert_eq!(config.email.from_address, DEFAULT_NOTIFY_FROM);
        assert_eq!(config.email.admin_address, DEFAULT_ADMIN_EMAIL);
    }

    #[test]
    fn rejects_invalid_environment() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("APP_ENV", "invalid");

        let err = AppConfig::from_env().expect_err("invalid env should error");
        assert!(matches!(err, ConfigError::InvalidEnvironment(value) if value == "invalid"));

        clear_env();
    }

    #[test]
    fn production_requires_api_key() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("APP_ENV", "production");

        let err = AppConfig::from_env().expect_err("missing key should error");
        assert!(matches!(err, ConfigError::MissingVariable("RESEND_API_KEY")));

        clear_env();
    }

    #[test]
    fn parses_production_environment() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("APP_ENV", "production");
        env::set_var("APP_BIND_ADDR", "0.0.0.0:9000");
        env::set_var("RESEND_API_KEY", "re_live");
        env::set_var("NOTIFY_ADMIN_EMAIL", "owner@shop.example");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9000");
        assert_eq!(config.email.api_key.as_deref(), Some("re_live"));
        assert_eq!(config.email.admin_address, "owner@shop.example");
        assert!(!format!("{:?}", config.email).contains("re_live"));

        clear_env();
    }

    #[test]
    fn only_production_requires_email_key() {
        assert!(Environment::Production.requires_email_key());
        assert!(!Environment::Development.requires_email_key());
        assert!(!Environment::Test.requires_email_key());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("EMAIL_API_BASE_URL", "ftp://mail.example");

        let err = AppConfig::from_env().expect_err("bad url should error");
        assert!(matches!(err, ConfigError::InvalidApiBaseUrl(_)));

        clear_env();
    }
}
