//! Environment handling shared by the gemdesk notification service.

pub mod config;

use std::{env, net::SocketAddr};

pub use config::{AppConfig, ConfigError, EmailConfig, Environment};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Reads a local `.env` into the process environment before configuration
/// is resolved. A missing file is not an error: deployed notification
/// services get their email API key from the host.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

/// Socket the notification endpoints listen on: `APP_BIND_ADDR`, or
/// [`DEFAULT_BIND_ADDR`] for local runs.
pub fn server_bind_address() -> Result<SocketAddr, std::net::AddrParseError> {
    let value = env::var("APP_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    value.parse()
}

// Tests in every module of this crate mutate the same process environment.
#[cfg(test)]
pub(crate) static ENV_GUARD: std::sync::LazyLock<std::sync::Mutex<()>> =
    std::sync::LazyLock::new(|| std::sync::Mutex::new(()));
