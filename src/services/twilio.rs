use serde::Deserialize;
use std::collections::HashMap;

use crate::config::TwilioConfig;

const VERIFY_BASE_URL: &str = "https://verify.twilio.com/v2";

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("Twilio request failed: {0}")]
    Request(String),

    #[error("Twilio rejected the request ({status}): {body}")]
    Provider { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    status: String,
}

/// Thin client for the Twilio Verify REST API. Verify owns code
/// generation and comparison; we only start and check verifications.
pub struct TwilioVerifyClient {
    http: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioVerifyClient {
    pub fn new(http: reqwest::Client, config: TwilioConfig) -> Self {
        Self { http, config }
    }

    pub async fn start_verification(&self, to: &str, channel: &str) -> Result<(), TwilioError> {
        let url = format!(
            "{}/Services/{}/Verifications",
            VERIFY_BASE_URL, self.config.verify_service_sid
        );

        let mut form: HashMap<&str, &str> = HashMap::new();
        form.insert("To", to);
        form.insert("Channel", channel);

        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| TwilioError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TwilioError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    pub async fn check_verification(&self, to: &str, code: &str) -> Result<bool, TwilioError> {
        let url = format!(
            "{}/Services/{}/VerificationCheck",
            VERIFY_BASE_URL, self.config.verify_service_sid
        );

        let mut form: HashMap<&str, &str> = HashMap::new();
        form.insert("To", to);
        form.insert("Code", code);

        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| TwilioError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TwilioError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: VerificationResponse = response
            .json()
            .await
            .map_err(|e| TwilioError::Request(format!("unparseable Verify response: {}", e)))?;

        Ok(parsed.status == "approved")
    }
}
