//! SMTP transport implementation.
//!
//! Builds RFC 5322 messages with `lettre` and submits them over implicit
//! TLS or STARTTLS depending on the account's `secure` flag. A transport
//! is built per send; nothing is pooled.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Body, Mailbox, MessageBuilder, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::traits::{ProviderError, Result};
use crate::config::AccountSettings;

/// One outgoing message, already validated by the service layer.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub from_name: String,
    pub from_email: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<OutgoingAttachment>,
}

/// Decoded attachment payload for an outgoing message.
#[derive(Debug, Clone)]
pub struct OutgoingAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Sends outgoing mail. The seam the services use so tests never open a
/// socket.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, settings: &AccountSettings, mail: &OutgoingMail) -> Result<()>;
}

/// SMTP submission via lettre.
#[derive(Debug, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    pub fn new() -> Self {
        Self
    }

    /// Builds the RFC 5322 message: plain text body, plus a mixed
    /// multipart when attachments are present.
    fn build_message(mail: &OutgoingMail) -> Result<Message> {
        let from_mailbox: Mailbox = if mail.from_name.is_empty() {
            mail.from_email.parse()
        } else {
            format!("{} <{}>", mail.from_name, mail.from_email).parse()
        }
        .map_err(|e| ProviderError::InvalidRequest(format!("invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = mail
            .to
            .parse()
            .map_err(|e| ProviderError::InvalidRequest(format!("invalid to address: {}", e)))?;

        let builder = MessageBuilder::new()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&mail.subject);

        if mail.attachments.is_empty() {
            return builder
                .singlepart(SinglePart::plain(mail.body.clone()))
                .map_err(|e| {
                    ProviderError::InvalidRequest(format!("failed to build message: {}", e))
                });
        }

        let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone()));
        for attachment in &mail.attachments {
            let content_type = match ContentType::parse(&attachment.content_type) {
                Ok(ct) => ct,
                Err(_) => ContentType::parse("application/octet-stream").map_err(|e| {
                    ProviderError::InvalidRequest(format!("invalid content type: {}", e))
                })?,
            };
            multipart = multipart.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(Body::new(attachment.data.clone()), content_type),
            );
        }

        builder
            .multipart(multipart)
            .map_err(|e| ProviderError::InvalidRequest(format!("failed to build message: {}", e)))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, settings: &AccountSettings, mail: &OutgoingMail) -> Result<()> {
        let message = Self::build_message(mail)?;

        let credentials =
            SmtpCredentials::new(settings.email.clone(), settings.password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> = if settings.smtp.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp.host)
                .map_err(|e| ProviderError::Connection(format!("SMTP relay error: {}", e)))?
                .credentials(credentials)
                .port(settings.smtp.port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp.host)
                .map_err(|e| ProviderError::Connection(format!("SMTP relay error: {}", e)))?
                .credentials(credentials)
                .port(settings.smtp.port)
                .build()
        };

        mailer
            .send(message)
            .await
            .map_err(|e| ProviderError::Connection(format!("SMTP send failed: {}", e)))?;

        info!(to = %mail.to, "mail sent via SMTP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outgoing() -> OutgoingMail {
        OutgoingMail {
            from_name: "Me".to_string(),
            from_email: "me@example.com".to_string(),
            to: "you@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Hi there".to_string(),
            attachments: vec![],
        }
    }

    #[test]
    fn builds_plain_message() {
        let message = SmtpMailer::build_message(&outgoing()).unwrap();
        let rendered = String::from_utf8(message.formatted()).unwrap();
        assert!(rendered.contains("Subject: Hello"));
        assert!(rendered.contains("To: you@example.com"));
        assert!(rendered.contains("Me <me@example.com>"));
    }

    #[test]
    fn builds_multipart_with_attachment() {
        let mut mail = outgoing();
        mail.attachments.push(OutgoingAttachment {
            filename: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            data: b"some notes".to_vec(),
        });

        let message = SmtpMailer::build_message(&mail).unwrap();
        let rendered = String::from_utf8(message.formatted()).unwrap();
        assert!(rendered.contains("multipart/mixed"));
        assert!(rendered.contains("notes.txt"));
    }

    #[test]
    fn rejects_invalid_recipient() {
        let mut mail = outgoing();
        mail.to = "not an address".to_string();
        let err = SmtpMailer::build_message(&mail).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }
}
