use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::client::OutgoingEmail;

/// Payload of the signup notification sent to the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupNotice {
    pub user_email: String,
    pub user_name: String,
    pub signup_date: String,
}

/// Outcome of an account review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approved,
    Rejected,
}

impl ApprovalAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Payload of the approval/rejection notification sent to the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalNotice {
    pub user_email: String,
    pub user_name: String,
    pub action: ApprovalAction,
    #[serde(default)]
    pub reason: Option<String>,
}

impl SignupNotice {
    /// Renders the fixed administrator email for a new signup.
    pub fn render(&self, admin_email: &str) -> OutgoingEmail {
        let name = escape_html(&self.user_name);
        let email = escape_html(&self.user_email);
        let date = escape_html(&display_date(&self.signup_date));

        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">New User Signup Pending Approval</h2>
  <p>A new user has signed up and is waiting for approval:</p>
  <div style="background-color: #f5f5f5; padding: 16px; border-radius: 8px; margin: 16px 0;">
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> {email}</p>
    <p><strong>Signup Date:</strong> {date}</p>
  </div>
  <p>Please log in to the admin dashboard to approve or reject this user.</p>
</div>"#
        );

        OutgoingEmail {
            to: vec![admin_email.to_string()],
            subject: format!("New User Signup: {}", self.user_name),
            html,
        }
    }
}

impl ApprovalNotice {
    /// Renders the approval or rejection email addressed to the user.
    pub fn render(&self) -> OutgoingEmail {
        let name = escape_html(&self.user_name);

        let (subject, html) = match self.action {
            ApprovalAction::Approved => (
                "Your account has been approved".to_string(),
                format!(
                    r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #16a34a;">Account Approved</h2>
  <p>Hello {name},</p>
  <p>Your account has been approved. You can now sign in and start using the dashboard.</p>
  <p>Welcome aboard!</p>
</div>"#
                ),
            ),
            ApprovalAction::Rejected => {
                let reason = self
                    .reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty())
                    .map(|reason| {
                        format!(
                            "\n  <p><strong>Reason:</strong> {}</p>",
                            escape_html(reason)
                        )
                    })
                    .unwrap_or_default();
                (
                    "Your account application was not approved".to_string(),
                    format!(
                        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #dc2626;">Account Not Approved</h2>
  <p>Hello {name},</p>
  <p>Unfortunately, your account application has not been approved at this time.</p>{reason}
  <p>If you believe this is a mistake, please contact the administrator.</p>
</div>"#
                    ),
                )
            }
        };

        OutgoingEmail {
            to: vec![self.user_email.clone()],
            subject,
            html,
        }
    }
}

fn display_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| {
            parsed
                .with_timezone(&Utc)
                .format("%B %-d, %Y %H:%M UTC")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
