mod error;
mod notify;
mod router;
mod telemetry;

use std::{net::SocketAddr, time::Duration};

use gemdesk_mailer::{parse_base_url, EmailClient};
use gemdesk_util::{load_env_file, AppConfig};
use tracing::{info, warn};

const EMAIL_API_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let http = reqwest::Client::builder()
        .timeout(EMAIL_API_TIMEOUT)
        .build()?;
    let base_url = parse_base_url(&config.email.api_base_url)?;
    if config.email.api_key.is_none() {
        warn!(stage = "app", "RESEND_API_KEY is not set; notification emails will fail");
    }
    let mailer = EmailClient::new(
        config.email.api_key.clone(),
        config.email.from_address.clone(),
        base_url,
        http,
    );

    let state = router::AppState::new(metrics, mailer, config.email.admin_address.clone());

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
