//! Mail domain types.
//!
//! Represents individual mail items and their attachment metadata.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{AttachmentId, FolderId, MailId};

/// Sender display fallback when both name and address are missing.
pub const UNKNOWN_SENDER: &str = "unknown";

/// An individual mail item, local or remote-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mail {
    /// Stable unique identifier (dedup key for synced mail).
    pub id: MailId,
    /// Sender display name; falls back to the address, then `"unknown"`.
    pub sender_name: String,
    /// Sender email address (may be empty for malformed remote mail).
    pub sender_email: String,
    /// Recipient address.
    pub recipient: String,
    /// Subject; `"(no subject)"` when the remote message has none.
    pub subject: String,
    /// First ~80 characters of the plain body, whitespace collapsed.
    /// Always recomputed from `body`, never independent ground truth.
    pub snippet: String,
    /// Plain text body, capped at 5000 characters.
    pub body: String,
    /// HTML body if present, capped at 200,000 characters.
    pub html_body: Option<String>,
    /// Minute-resolution local date string (`YYYY-MM-DD HH:MM`).
    pub date: String,
    /// Read flag.
    pub read: bool,
    /// Starred flag; orthogonal to folder membership.
    pub starred: bool,
    /// The one folder this mail lives in.
    pub folder: FolderId,
    /// Attachment metadata, loaded on demand for single-mail queries.
    #[serde(default)]
    pub attachments: Vec<MailAttachment>,
}

impl Mail {
    /// Resolves the sender display name from optional envelope parts.
    pub fn sender_display(name: Option<&str>, email: Option<&str>) -> String {
        match name.filter(|s| !s.is_empty()) {
            Some(n) => n.to_string(),
            None => match email.filter(|s| !s.is_empty()) {
                Some(e) => e.to_string(),
                None => UNKNOWN_SENDER.to_string(),
            },
        }
    }
}

/// Metadata for one binary attachment owned by exactly one mail.
///
/// The binary content lives out-of-band on disk; this record only carries
/// the path reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailAttachment {
    /// Deterministic id derived from `(mail_id, index)`.
    pub id: AttachmentId,
    /// Owning mail.
    pub mail_id: MailId,
    /// Original filename as reported by the message.
    pub filename: String,
    /// MIME content type.
    pub content_type: String,
    /// Size of the stored content in bytes.
    pub size: u64,
    /// Content-ID for inline images referenced via `cid:` in the HTML body.
    pub content_id: Option<String>,
    /// Location of the stored bytes. Not part of the API shape.
    #[serde(skip)]
    pub content_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_display_prefers_name() {
        assert_eq!(
            Mail::sender_display(Some("Alice"), Some("alice@example.com")),
            "Alice"
        );
    }

    #[test]
    fn sender_display_falls_back_to_email() {
        assert_eq!(
            Mail::sender_display(None, Some("alice@example.com")),
            "alice@example.com"
        );
        assert_eq!(
            Mail::sender_display(Some(""), Some("alice@example.com")),
            "alice@example.com"
        );
    }

    #[test]
    fn sender_display_unknown_when_both_absent() {
        assert_eq!(Mail::sender_display(None, None), UNKNOWN_SENDER);
        assert_eq!(Mail::sender_display(Some(""), Some("")), UNKNOWN_SENDER);
    }

    #[test]
    fn attachment_path_not_serialized() {
        let att = MailAttachment {
            id: AttachmentId::from("m1-att-0"),
            mail_id: MailId::from("m1"),
            filename: "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size: 42,
            content_id: None,
            content_path: PathBuf::from("/tmp/secret/location"),
        };

        let json = serde_json::to_string(&att).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("report.pdf"));
    }
}
