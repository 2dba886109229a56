pub mod crud;
pub mod model;
pub mod service;

pub use model::OtpChannel;
pub use service::{OtpError, OtpService};
