use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Parses the API base url, making sure relative endpoint joins stay below
/// its path.
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

/// Client for the transactional email API used by the notification endpoints.
#[derive(Clone)]
pub struct EmailClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    from: String,
}

impl EmailClient {
    /// Creates a new client. Without an API key every send fails with
    /// [`MailerError::MissingApiKey`].
    pub fn new(
        api_key: Option<String>,
        from: impl Into<String>,
        base_url: Url,
        http: Client,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            from: from.into(),
        }
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    /// Sends a single message and returns the API's JSON reply verbatim.
    pub async fn send(&self, email: &OutgoingEmail) -> Result<Value, MailerError> {
        let api_key = self.api_key.as_deref().ok_or(MailerError::MissingApiKey)?;
        let url = self.base_url.join("emails")?;

        let body = SendEmailBody {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };
        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        parse_json(response).await
    }
}

/// A rendered message ready to hand to [`EmailClient::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

/// Errors produced by the email client.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("email API key is not configured")]
    MissingApiKey,
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

async fn parse_json(response: Response) -> Result<Value, MailerError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(MailerError::Status { status, body });
    }

    Ok(response.json().await?)
}
