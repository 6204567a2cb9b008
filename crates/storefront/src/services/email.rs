//! OTP delivery over SMTP.
//!
//! Uses lettre for delivery with Askama HTML and plain-text templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::registration::OTP_TTL;

pub const OTP_SUBJECT: &str = "Amazon Clone - Email Verification";

#[derive(Template)]
#[template(path = "email/otp.html")]
struct OtpEmailHtml<'a> {
    name: &'a str,
    otp: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/otp.txt")]
struct OtpEmailText<'a> {
    name: &'a str,
    otp: &'a str,
    valid_minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends one-time codes to prospective customers.
#[trait_variant::make(OtpMailer: Send)]
pub trait LocalOtpMailer {
    async fn send_otp(&self, to: &str, name: &str, otp: &str) -> Result<(), EmailError>;
}

/// SMTP-backed mailer for transactional email.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host cannot be resolved into a transport.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

impl OtpMailer for EmailService {
    async fn send_otp(&self, to: &str, name: &str, otp: &str) -> Result<(), EmailError> {
        let (html, text) = render_otp(name, otp)?;
        self.send_multipart_email(to, OTP_SUBJECT, text, html).await
    }
}

fn render_otp(name: &str, otp: &str) -> Result<(String, String), askama::Error> {
    let valid_minutes = OTP_TTL.num_minutes();
    let html = OtpEmailHtml {
        name,
        otp,
        valid_minutes,
    }
    .render()?;
    let text = OtpEmailText {
        name,
        otp,
        valid_minutes,
    }
    .render()?;
    Ok((html, text))
}

/// Generate a 6-digit one-time code, uniform over 100000..=999999.
#[must_use]
pub fn generate_otp() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_format() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            let value: u32 = otp.parse().unwrap();
            assert!((100_000..1_000_000).contains(&value));
        }
    }

    #[test]
    fn test_otp_templates_render_code_and_expiry() {
        let (html, text) = render_otp("Asha", "482913").unwrap();
        assert!(html.contains("482913"));
        assert!(html.contains("expire in 5 minutes"));
        assert!(text.contains("Hi Asha,"));
        assert!(text.contains("482913"));
    }

    #[test]
    fn test_html_template_escapes_name() {
        let (html, _) = render_otp("<script>", "111111").unwrap();
        assert!(!html.contains("<script>"));
    }
}
