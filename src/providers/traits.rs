//! Provider abstractions for the remote mailbox.
//!
//! The sync service talks to the remote server only through these traits,
//! so tests can substitute an in-memory mailbox and the IMAP plumbing
//! stays contained in [`super::imap`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::AccountSettings;

/// Errors from remote mailbox providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Authentication failed or credentials rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network, TLS, or protocol error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Envelope fields available even when the full message fails to parse.
#[derive(Debug, Clone, Default)]
pub struct RemoteEnvelope {
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub subject: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// One message as fetched from the remote mailbox.
#[derive(Debug, Clone)]
pub struct RemoteMessage {
    /// IMAP UID within the selected mailbox.
    pub uid: u32,
    /// Full RFC 5322 payload, when the server returned one.
    pub raw: Option<Vec<u8>>,
    /// Envelope summary, used as a fallback when `raw` cannot be parsed.
    pub envelope: RemoteEnvelope,
}

/// Opens sessions against a remote mailbox.
#[async_trait]
pub trait MailboxConnector: Send + Sync {
    /// Connects and authenticates, returning a live session.
    async fn connect(&self, settings: &AccountSettings) -> Result<Box<dyn MailboxSession>>;
}

/// A live, authenticated session on the remote inbox.
///
/// Callers must invoke [`close`](MailboxSession::close) when done,
/// including after a failed fetch.
#[async_trait]
pub trait MailboxSession: Send {
    /// Fetches the most recent messages from the inbox, oldest first,
    /// at most `limit` of them.
    async fn fetch_recent(&mut self, limit: usize) -> Result<Vec<RemoteMessage>>;

    /// Logs out and releases the connection.
    async fn close(&mut self) -> Result<()>;
}
