use std::time::Instant;

use axum::{body::Bytes, extract::State, Json};
use gemdesk_mailer::{ApprovalNotice, OutgoingEmail, SignupNotice};
use metrics::{counter, histogram};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::error::ErrorResponse;
use crate::router::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotificationKind {
    Signup,
    Approval,
}

impl NotificationKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Approval => "approval",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSent {
    success: bool,
    email_response: Value,
}

/// Notifies the administrator that a new account is waiting for review.
pub async fn signup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NotificationSent>, ErrorResponse> {
    let notice: SignupNotice = parse_body(NotificationKind::Signup, &body)?;
    let email = notice.render(state.admin_address());
    deliver(&state, NotificationKind::Signup, email).await
}

/// Tells a user whether their account was approved or rejected.
pub async fn approval(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NotificationSent>, ErrorResponse> {
    let notice: ApprovalNotice = parse_body(NotificationKind::Approval, &body)?;
    info!(
        stage = "notify",
        kind = NotificationKind::Approval.as_str(),
        action = notice.action.as_str(),
        "rendering approval notification"
    );
    let email = notice.render();
    deliver(&state, NotificationKind::Approval, email).await
}

fn parse_body<T>(kind: NotificationKind, body: &[u8]) -> Result<T, ErrorResponse>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|err| {
        counter!("notifications_sent_total", "kind" => kind.as_str(), "result" => "invalid")
            .increment(1);
        ErrorResponse::bad_request(format!("invalid request body: {err}"))
    })
}

async fn deliver(
    state: &AppState,
    kind: NotificationKind,
    email: OutgoingEmail,
) -> Result<Json<NotificationSent>, ErrorResponse> {
    let start = Instant::now();
    let result = state.mailer().send(&email).await;
    histogram!("email_api_latency_seconds", "kind" => kind.as_str())
        .record(start.elapsed().as_secs_f64());

    match result {
        Ok(email_response) => {
            counter!("notifications_sent_total", "kind" => kind.as_str(), "result" => "sent")
                .increment(1);
            info!(
                stage = "notify",
                kind = kind.as_str(),
                recipients = email.to.len(),
                subject = %email.subject,
                "notification email sent"
            );
            Ok(Json(NotificationSent {
                success: true,
                email_response,
            }))
        }
        Err(err) => {
            counter!("notifications_sent_total", "kind" => kind.as_str(), "result" => "failed")
                .increment(1);
            error!(
                stage = "notify",
                kind = kind.as_str(),
                error = %err,
                "failed to send notification email"
            );
            Err(ErrorResponse::internal(err.to_string()))
        }
    }
}
