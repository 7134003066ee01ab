//! Digest delivery over SMTP.
//!
//! [`Notify`] is the only seam the pipeline sees; [`SmtpNotifier`] delivers
//! through a STARTTLS relay with lettre. Messages are `multipart/alternative`
//! (plain text and HTML), wrapped in `multipart/mixed` with a `jobs.csv`
//! attachment when the digest has rows.

use crate::config::SmtpSettings;
use crate::digest::{CSV_FILENAME, Digest};
use crate::error::NotifyError;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

/// A digest addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMessage {
    pub recipient: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub csv: Option<String>,
}

impl DigestMessage {
    pub fn new(recipient: &str, digest: Digest) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: digest.subject,
            html: digest.html,
            text: digest.text,
            csv: digest.csv,
        }
    }
}

/// Trait for delivering a digest.
pub trait Notify {
    async fn send(&self, message: &DigestMessage) -> Result<(), NotifyError>;
}

/// STARTTLS SMTP delivery, authenticated as the sender.
pub struct SmtpNotifier {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let sender = parse_mailbox(&settings.user)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.pass.clone(),
            ))
            .build();
        Ok(Self { sender, transport })
    }
}

impl Notify for SmtpNotifier {
    #[instrument(level = "info", skip_all, fields(recipient = %message.recipient))]
    async fn send(&self, message: &DigestMessage) -> Result<(), NotifyError> {
        let email = build_message(&self.sender, message)?;
        self.transport.send(email).await?;
        info!(subject = %message.subject, "Digest sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

/// Assemble the MIME message for `message`, sent from `sender`.
pub fn build_message(sender: &Mailbox, message: &DigestMessage) -> Result<Message, NotifyError> {
    let body = MultiPart::alternative_plain_html(message.text.clone(), message.html.clone());
    let body = match &message.csv {
        Some(csv) => MultiPart::mixed().multipart(body).singlepart(
            Attachment::new(CSV_FILENAME.to_string()).body(
                csv.clone(),
                ContentType::parse("text/csv; charset=utf-8").expect("static content type"),
            ),
        ),
        None => body,
    };
    Ok(Message::builder()
        .from(sender.clone())
        .to(parse_mailbox(&message.recipient)?)
        .subject(message.subject.clone())
        .multipart(body)?)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`Notify`] for tests.

    use super::*;
    use std::sync::Mutex;

    /// Records every message instead of sending it; optionally fails.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<DigestMessage>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn sent(&self) -> Vec<DigestMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notify for RecordingNotifier {
        async fn send(&self, message: &DigestMessage) -> Result<(), NotifyError> {
            if self.fail {
                return Err(parse_mailbox("not an address").unwrap_err());
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}
