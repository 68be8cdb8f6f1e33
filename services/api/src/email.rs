//! Invitation mail dispatch
//!
//! No real message transport is wired up: the mailer builds the
//! verification URL and logs it. Callers treat dispatch as best-effort and
//! never roll back on failure.

use anyhow::Result;
use tracing::info;

/// Which verification page the token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteKind {
    Nominee,
    Trustee,
}

impl InviteKind {
    fn verify_path(self) -> &'static str {
        match self {
            InviteKind::Nominee => "verify-nominee",
            InviteKind::Trustee => "verify-trustee",
        }
    }
}

/// Log-only mailer carrying the application base URL
#[derive(Debug, Clone)]
pub struct Mailer {
    app_url: String,
}

impl Mailer {
    pub fn new(app_url: String) -> Self {
        Self {
            app_url: app_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a new Mailer from environment variables
    ///
    /// # Environment Variables
    /// - `APP_URL`: Base URL of the dashboard (default: "http://localhost:3000")
    pub fn from_env() -> Self {
        let app_url =
            std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        Self::new(app_url)
    }

    /// Verification URL embedded in the invitation message
    pub fn verification_url(&self, kind: InviteKind, token: &str) -> String {
        format!("{}/{}?token={}", self.app_url, kind.verify_path(), token)
    }

    /// Dispatch an invitation message to the invitee
    pub fn send_invitation(&self, kind: InviteKind, recipient: &str, token: &str) -> Result<String> {
        let url = self.verification_url(kind, token);
        info!("Sending {:?} invitation to {}: {}", kind, recipient, url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_url_shape() {
        let mailer = Mailer::new("https://legacy.example.com/".to_string());
        assert_eq!(
            mailer.verification_url(InviteKind::Nominee, "abc123"),
            "https://legacy.example.com/verify-nominee?token=abc123"
        );
        assert_eq!(
            mailer.verification_url(InviteKind::Trustee, "abc123"),
            "https://legacy.example.com/verify-trustee?token=abc123"
        );
    }
}
