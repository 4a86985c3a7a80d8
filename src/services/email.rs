//! Outbound email rendering
//!
//! Renders the reset-password and verify-email messages with their token
//! links. Delivery is an external collaborator; the transport here logs the
//! rendered mail instead of sending it.

/// Email renderer with a logging transport.
#[derive(Debug, Clone)]
pub struct EmailService {
    frontend_url: String,
}

impl EmailService {
    pub fn new(frontend_url: String) -> Self {
        Self { frontend_url }
    }

    pub fn send_reset_password_email(&self, to: &str, token: &str) {
        let link = format!("{}/reset-password?token={}", self.frontend_url, token);
        let body = format!(
            "Dear user,\n\
             To reset your password, click on this link: {link}\n\
             If you did not request any password resets, then ignore this email."
        );
        self.deliver(to, "Reset password", &body);
    }

    pub fn send_verification_email(&self, to: &str, token: &str) {
        let link = format!("{}/verify-email?token={}", self.frontend_url, token);
        let body = format!(
            "Dear user,\n\
             To verify your email, click on this link: {link}\n\
             If you did not create an account, then ignore this email."
        );
        self.deliver(to, "Email Verification", &body);
    }

    fn deliver(&self, to: &str, subject: &str, body: &str) {
        tracing::info!(to = %to, subject = %subject, bytes = body.len(), "outbound email rendered");
        tracing::debug!(body = %body, "outbound email body");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_constructs() {
        let mailer = EmailService::new("https://app.driftmarket.example".to_string());
        mailer.send_reset_password_email("a@b.com", "tok");
        mailer.send_verification_email("a@b.com", "tok");
    }
}
