pub mod client;
pub mod templates;

pub use client::{parse_base_url, EmailClient, MailerError, OutgoingEmail};
pub use templates::{ApprovalAction, ApprovalNotice, SignupNotice};
