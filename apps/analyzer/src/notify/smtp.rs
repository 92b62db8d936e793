use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;
use crate::notify::{NotificationSink, NotifyError};

const SUBJECT: &str = "New Resume Uploaded";
const BODY: &str = "A new resume has been uploaded.";
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Emails each uploaded file as an attachment over implicit-TLS SMTP.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn from_config(config: &EmailConfig) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.sender)?;
        let to = parse_mailbox(&config.receiver)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            "Upload notifier initialized (SMTP over TLS)"
        );

        Ok(Self { mailer, from, to })
    }
}

#[async_trait]
impl NotificationSink for SmtpNotifier {
    async fn notify(&self, bytes: &[u8], filename: &str) -> Result<(), NotifyError> {
        let message = build_message(self.from.clone(), self.to.clone(), bytes, filename)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        info!(filename, "Resume copy emailed to operator");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

fn build_message(
    from: Mailbox,
    to: Mailbox,
    bytes: &[u8],
    filename: &str,
) -> Result<Message, NotifyError> {
    let octet_stream = ContentType::parse("application/octet-stream")
        .map_err(|e| NotifyError::Message(e.to_string()))?;
    let attachment = Attachment::new(filename.to_string()).body(bytes.to_vec(), octet_stream);

    Message::builder()
        .from(from)
        .to(to)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(attachment),
        )
        .map_err(|e| NotifyError::Message(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_carries_attachment_and_subject() {
        let message = build_message(
            "sender@example.com".parse().unwrap(),
            "ops@example.com".parse().unwrap(),
            b"%PDF-1.4 fake",
            "jane_doe.pdf",
        )
        .unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("Subject: New Resume Uploaded"));
        assert!(raw.contains("jane_doe.pdf"));
        assert!(raw.contains("application/octet-stream"));
        assert!(raw.contains(BODY));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let config = EmailConfig {
            sender: "not-an-address".to_string(),
            password: "secret".to_string(),
            receiver: "ops@example.com".to_string(),
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 465,
        };
        let err = SmtpNotifier::from_config(&config).err().unwrap();
        assert!(matches!(err, NotifyError::Address { address, .. } if address == "not-an-address"));
    }
}
