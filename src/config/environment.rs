use std::env;

/// Twilio Verify credentials. Absent when SMS OTP delivery is not configured.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub verify_service_sid: String,
}

/// Environment configuration
/// Loads and validates environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub otp_expiry_minutes: i64,
    pub invitation_expiry_days: i64,
    pub inactivity_threshold_days: i64,
    pub signup_cache_ttl_secs: u64,
    pub rate_limit_burst: u32,
    pub test_identifiers: Vec<String>,
    pub test_otp_code: String,
    pub twilio: Option<TwilioConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let otp_expiry_minutes = parse_var("OTP_EXPIRY_MINUTES", 10)?;
        let invitation_expiry_days = parse_var("INVITATION_EXPIRY_DAYS", 7)?;
        let inactivity_threshold_days = parse_var("INACTIVITY_THRESHOLD_DAYS", 90)?;
        let signup_cache_ttl_secs = parse_var("SIGNUP_CACHE_TTL_SECS", 300)?;
        let rate_limit_burst = parse_var("RATE_LIMIT_BURST", 60)?;

        // Fixed-code OTP accounts used by app-store reviewers and e2e suites
        let test_identifiers = env::var("TEST_IDENTIFIERS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let test_otp_code =
            env::var("TEST_OTP_CODE").unwrap_or_else(|_| "000000".to_string());

        let twilio = match (
            env::var("TWILIO_ACCOUNT_SID"),
            env::var("TWILIO_AUTH_TOKEN"),
            env::var("TWILIO_VERIFY_SERVICE_SID"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(verify_service_sid)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                verify_service_sid,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            frontend_url,
            otp_expiry_minutes,
            invitation_expiry_days,
            inactivity_threshold_days,
            signup_cache_ttl_secs,
            rate_limit_burst,
            test_identifiers,
            test_otp_code,
            twilio,
        })
    }

    pub fn is_test_identifier(&self, identifier: &str) -> bool {
        self.test_identifiers.iter().any(|t| t == identifier)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}
