//! Inbox synchronization.
//!
//! Pulls the most recent messages from the remote inbox into the local
//! store. Sync is pull-only and additive: local rows are never modified
//! or deleted, and a mail id that already exists locally is skipped, so
//! running sync twice in a row is a no-op.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::{Result, ServiceError};
use crate::config::AccountSettings;
use crate::domain::{FolderId, Mail, MailId};
use crate::providers::parser::{self, ParsedAttachment};
use crate::providers::{MailboxConnector, MailboxSession, RemoteMessage};
use crate::storage::queries::{mails, settings};
use crate::storage::{AttachmentStore, Database, StorageLayer};
use crate::text;

/// How many of the newest inbox messages each sync considers.
pub const SYNC_WINDOW: usize = 100;

/// Result of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Number of mails newly added to the local store.
    pub synced: usize,
}

/// Pulls recent remote mail into local storage.
pub struct SyncService {
    db: Database,
    attachments: AttachmentStore,
    connector: Arc<dyn MailboxConnector>,
}

impl SyncService {
    pub fn new(storage: &StorageLayer, connector: Arc<dyn MailboxConnector>) -> Self {
        Self {
            db: storage.db.clone(),
            attachments: storage.attachments.clone(),
            connector,
        }
    }

    /// Runs one sync pass against the configured account.
    ///
    /// The session is always closed before returning, whether the fetch
    /// phase succeeded or not. Attachment persistence failures are logged
    /// and skipped; they never fail the sync.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let settings = settings::get(&self.db)
            .await?
            .filter(AccountSettings::can_sync)
            .ok_or_else(|| {
                ServiceError::Config(
                    "account email, password, and IMAP host must be configured first".to_string(),
                )
            })?;

        let mut session = self.connector.connect(&settings).await?;

        let fetched = self.fetch_new_mails(session.as_mut(), &settings).await;

        if let Err(err) = session.close().await {
            warn!(error = %err, "IMAP logout failed");
        }

        let (new_mails, attachments) = fetched?;
        let synced = mails::insert_missing(&self.db, &new_mails).await?;

        for (mail_id, parts) in attachments {
            self.save_attachments(&mail_id, parts).await;
        }

        info!(synced, "sync complete");
        Ok(SyncOutcome { synced })
    }

    /// Fetch phase: pulls the newest messages and builds local mail rows
    /// for the ones not yet stored.
    async fn fetch_new_mails(
        &self,
        session: &mut dyn MailboxSession,
        settings: &AccountSettings,
    ) -> Result<(Vec<Mail>, Vec<(MailId, Vec<ParsedAttachment>)>)> {
        let messages = session.fetch_recent(SYNC_WINDOW).await?;
        let existing = mails::all_ids(&self.db).await?;

        let mut new_mails = Vec::new();
        let mut pending_attachments = Vec::new();

        for message in messages {
            let id = MailId::for_remote(&settings.email, message.uid);
            if existing.contains(&id) {
                continue;
            }

            let (mail, attachments) = build_mail(id, &message, settings);
            if !attachments.is_empty() {
                pending_attachments.push((mail.id.clone(), attachments));
            }
            new_mails.push(mail);
        }

        Ok((new_mails, pending_attachments))
    }

    /// Persists one mail's attachments; failures are per-attachment and
    /// non-fatal.
    async fn save_attachments(&self, mail_id: &MailId, parts: Vec<ParsedAttachment>) {
        for (index, part) in parts.into_iter().enumerate() {
            let filename = part
                .filename
                .clone()
                .or_else(|| {
                    part.content_type
                        .as_deref()
                        .and_then(|ct| ct.split('/').nth(1))
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "attachment".to_string());
            let content_type = part
                .content_type
                .as_deref()
                .unwrap_or("application/octet-stream");

            if let Err(err) = self
                .attachments
                .save(
                    mail_id,
                    index,
                    &filename,
                    content_type,
                    part.content_id.as_deref(),
                    &part.data,
                )
                .await
            {
                error!(mail = %mail_id, filename, error = %err, "failed to save attachment");
            }
        }
    }
}

/// Builds a local mail row from one remote message.
///
/// Header fields come from the envelope; the body comes from parsing the
/// raw payload, degrading to a placeholder when the payload is missing or
/// unparsable.
fn build_mail(
    id: MailId,
    message: &RemoteMessage,
    settings: &AccountSettings,
) -> (Mail, Vec<ParsedAttachment>) {
    let envelope = &message.envelope;

    let sender_name = Mail::sender_display(
        envelope.from_name.as_deref(),
        envelope.from_email.as_deref(),
    );
    let sender_email = envelope.from_email.clone().unwrap_or_default();

    let recipient = envelope
        .to_email
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| settings.email.clone());

    let subject = envelope
        .subject
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "(no subject)".to_string());

    let parsed = message
        .raw
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .and_then(parser::parse);

    let (body, html_body, attachments) = match parsed {
        Some(parsed) => {
            let text_body = parsed
                .body_text
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| text::truncate_chars(s, text::BODY_MAX_CHARS));

            let body = match text_body {
                Some(body) => body,
                None => match parsed.body_html.as_deref() {
                    Some(html) => {
                        let derived = text::html_to_plain_text(html, text::BODY_MAX_CHARS);
                        if derived.is_empty() {
                            "(no body)".to_string()
                        } else {
                            derived
                        }
                    }
                    None => "(no body)".to_string(),
                },
            };

            let html_body = parsed.body_html.as_deref().map(text::cap_html);
            (body, html_body, parsed.attachments)
        }
        None => ("(unable to parse body)".to_string(), None, vec![]),
    };

    let snippet = text::snippet(&body);
    let date = envelope
        .date
        .unwrap_or_else(chrono::Utc::now)
        .format("%Y-%m-%d %H:%M")
        .to_string();

    let mail = Mail {
        id,
        sender_name,
        sender_email,
        recipient,
        subject,
        snippet,
        body,
        html_body,
        date,
        read: false,
        starred: false,
        folder: FolderId::from("inbox"),
        attachments: vec![],
    };

    (mail, attachments)
}
