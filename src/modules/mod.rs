pub mod admin;
pub mod analytics;
pub mod auth;
pub mod games;
pub mod metrics;
pub mod otp;
