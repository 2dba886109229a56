use async_trait::async_trait;
use std::sync::Mutex;

/// A rendered outbound email. Templates live here so the auth and OTP
/// services only decide *when* to send, not what the copy looks like.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn otp_code(to: &str, code: &str, expiry_minutes: i64) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your login code".to_string(),
            body: format!(
                "Your one-time login code is {}. It expires in {} minutes.",
                code, expiry_minutes
            ),
        }
    }

    pub fn invitation(to: &str, role: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "You have been invited".to_string(),
            body: format!(
                "You have been invited to join the portal as {}. Accept here: {}",
                role, link
            ),
        }
    }

    pub fn password_reset(to: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            body: format!(
                "A password reset was requested for your account. Reset here: {}\n\
                 The link expires in one hour. If you did not request this, ignore this email.",
                link
            ),
        }
    }

    pub fn role_changed(to: &str, role: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your role has changed".to_string(),
            body: format!("An administrator changed your portal role to {}.", role),
        }
    }

    pub fn role_revoked(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your role has been revoked".to_string(),
            body: "An administrator revoked your elevated role. Your account is now a player account."
                .to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Email dispatch failed: {0}")]
    Dispatch(String),
}

/// Delivery boundary. Production wires an SES-backed sender here; the
/// portal only depends on this trait.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Logs instead of delivering. Default sender for local development.
pub struct TracingMailer;

#[async_trait]
impl EmailSender for TracingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "email (not delivered, no mailer configured)");
        Ok(())
    }
}

/// Records every message. The integration suite reads codes and links
/// back out of this mailbox.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailbox poisoned").clone()
    }

    pub fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.sent
            .lock()
            .expect("mailbox poisoned")
            .iter()
            .rev()
            .find(|m| m.to == to)
            .cloned()
    }
}

#[async_trait]
impl EmailSender for MemoryMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().expect("mailbox poisoned").push(message);
        Ok(())
    }
}
