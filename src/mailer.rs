use std::path::Path;

use eyre::{Result, WrapErr, eyre};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info};

use crate::config::SmtpConfig;

pub const SUBJECT: &str = "Your Podcast Summary PDF";
pub const BODY: &str = "Please find attached the PDF summarizing the podcast you requested.";

/// Resolved SMTP login, ready to connect
#[derive(Debug, Clone)]
pub struct Mailer {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
}

impl Mailer {
    /// Check that the config carries everything needed to send
    pub fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self> {
        let smtp = smtp.ok_or_else(|| eyre!("no [smtp] section in config; cannot send email"))?;
        let username = smtp
            .username
            .clone()
            .ok_or_else(|| eyre!("smtp.username is not set"))?;
        let password = smtp
            .password()
            .ok_or_else(|| eyre!("smtp.password is not set (or export YTDIGEST_SMTP_PASSWORD)"))?;
        let from = smtp.from_address().unwrap_or(&username).to_string();

        Ok(Self {
            host: smtp.host().to_string(),
            port: smtp.port(),
            username,
            password,
            from,
        })
    }

    /// Mail `pdf_path` to `to` as an attachment over STARTTLS
    pub async fn send_pdf(&self, to: &str, pdf_path: &Path) -> Result<()> {
        let pdf = tokio::fs::read(pdf_path)
            .await
            .wrap_err_with(|| format!("failed to read {}", pdf_path.display()))?;
        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "summary.pdf".to_string());

        let message = build_message(&self.from, to, &file_name, pdf)?;

        debug!("Connecting to {}:{} as {}", self.host, self.port, self.username);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
            .port(self.port)
            .credentials(Credentials::new(self.username.clone(), self.password.clone()))
            .build();

        let response = transport.send(message).await.wrap_err("SMTP delivery failed")?;
        info!("Mail to {to} accepted: {:?}", response.code());
        Ok(())
    }
}

fn build_message(from: &str, to: &str, file_name: &str, pdf: Vec<u8>) -> Result<Message> {
    let pdf_type = ContentType::parse("application/pdf").map_err(|e| eyre!("invalid content type: {e}"))?;

    let message = Message::builder()
        .from(from.parse().wrap_err_with(|| format!("invalid sender address: {from}"))?)
        .to(to.parse().wrap_err_with(|| format!("invalid recipient address: {to}"))?)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(Attachment::new(file_name.to_string()).body(pdf, pdf_type)),
        )?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_smtp() {
        assert!(Mailer::from_config(None).is_err());
    }

    #[test]
    fn test_from_config_defaults_sender_to_username() {
        let smtp = SmtpConfig {
            username: Some("me@example.com".to_string()),
            password: Some("app-password".to_string()),
            ..Default::default()
        };
        let mailer = Mailer::from_config(Some(&smtp)).unwrap();
        assert_eq!(mailer.from, "me@example.com");
        assert_eq!(mailer.host, crate::config::DEFAULT_SMTP_HOST);
        assert_eq!(mailer.port, crate::config::DEFAULT_SMTP_PORT);
    }

    #[test]
    fn test_build_message_has_attachment() {
        let message = build_message("me@example.com", "you@example.com", "digest.pdf", b"%PDF-1.5".to_vec()).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("Subject: Your Podcast Summary PDF"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("digest.pdf"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        assert!(build_message("me@example.com", "not an address", "a.pdf", Vec::new()).is_err());
    }
}
