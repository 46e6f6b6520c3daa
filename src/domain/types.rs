//! Core identifier types for domain entities.
//!
//! These newtype wrappers provide type safety for entity identifiers,
//! preventing accidental mixing of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a mail item.
///
/// Remote-synced mail derives its id deterministically from the account
/// email and IMAP UID (`imap-{email}-{uid}`), which makes repeated syncs
/// idempotent. Locally authored mail (sent/drafts) uses a timestamp id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MailId(pub String);

impl MailId {
    /// Derives the id for a remote message fetched over IMAP.
    pub fn for_remote(account_email: &str, uid: u32) -> Self {
        Self(format!("imap-{}-{}", account_email, uid))
    }

    /// Generates an id for locally authored mail from the current wall clock.
    pub fn for_local() -> Self {
        Self(chrono::Utc::now().timestamp_millis().to_string())
    }
}

impl fmt::Display for MailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MailId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MailId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Unique identifier for a folder (system id like `inbox` or `custom-...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(pub String);

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FolderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FolderId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Unique identifier for an attachment.
///
/// Derived deterministically from the owning mail id and the attachment's
/// ordinal position, so re-processing the same message is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentId(pub String);

impl AttachmentId {
    /// Derives the id for the `index`-th attachment of a mail.
    pub fn derive(mail_id: &MailId, index: usize) -> Self {
        Self(format!("{}-att-{}", sanitize_id(&mail_id.0), index))
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AttachmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AttachmentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Replaces path-unsafe characters so an id can be used in file names.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
