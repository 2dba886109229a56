use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Stored secret value for codes owned by Twilio Verify rather than us.
pub const TWILIO_VERIFY_SENTINEL: &str = "TWILIO_VERIFY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpChannel {
    Email,
    Sms,
    None,
}

impl OtpChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            OtpChannel::Email => "EMAIL",
            OtpChannel::Sms => "SMS",
            OtpChannel::None => "NONE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "EMAIL" => Some(OtpChannel::Email),
            "SMS" => Some(OtpChannel::Sms),
            "NONE" => Some(OtpChannel::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Otp {
    pub id: String,
    pub user_id: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub channel: String,
    pub secret: String,
    pub expires_at: DateTime<Utc>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Otp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn uses_twilio_verify(&self) -> bool {
        self.secret == TWILIO_VERIFY_SENTINEL
    }
}
