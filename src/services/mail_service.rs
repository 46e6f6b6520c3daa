//! Mail operations: listing, reading, state changes, compose and send.
//!
//! Sits on top of the mail queries and the attachment store, adding the
//! validation rules the storage layer does not enforce: folder existence,
//! patch shape, and the compose requirements. Sending goes SMTP-first;
//! only an accepted message is recorded locally.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use tracing::{info, warn};

use super::{Result, ServiceError};
use crate::domain::{
    is_custom_folder_id, is_system_folder, is_virtual_folder, FolderId, Mail, MailAttachment,
    MailId,
};
use crate::providers::{MailTransport, OutgoingAttachment, OutgoingMail};
use crate::storage::queries::mails::MailPatch;
use crate::storage::queries::{folders, mails, settings};
use crate::storage::{AttachmentStore, Database, StorageLayer};
use crate::text;

/// Most attachments accepted on one outgoing mail; extras are dropped.
pub const MAX_SEND_ATTACHMENTS: usize = 20;

/// One attachment on an outgoing mail, base64 at the boundary.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SendAttachment {
    pub filename: String,
    #[serde(default)]
    pub content_type: String,
    /// Base64-encoded payload.
    pub content: String,
}

/// A compose/send request.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SendMailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<SendAttachment>,
}

/// Mail listing, reading, updating, and sending.
pub struct MailService {
    db: Database,
    attachments: AttachmentStore,
    transport: Arc<dyn MailTransport>,
}

impl MailService {
    pub fn new(storage: &StorageLayer, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            db: storage.db.clone(),
            attachments: storage.attachments.clone(),
            transport,
        }
    }

    /// Lists the mails of a folder, newest first.
    ///
    /// Accepts system ids, the virtual `starred`/`important` views, and
    /// existing custom folders.
    pub async fn list_mails(&self, folder_id: &FolderId) -> Result<Vec<Mail>> {
        let known = is_system_folder(&folder_id.0)
            || is_virtual_folder(&folder_id.0)
            || (is_custom_folder_id(&folder_id.0)
                && folders::get_by_id(&self.db, folder_id).await?.is_some());
        if !known {
            return Err(ServiceError::Validation(format!(
                "invalid folder: {}",
                folder_id
            )));
        }

        Ok(mails::list_by_folder(&self.db, folder_id).await?)
    }

    /// Loads one mail with its attachment metadata.
    pub async fn get_mail(&self, mail_id: &MailId) -> Result<Mail> {
        let mut mail = mails::get_by_id(&self.db, mail_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("mail {}", mail_id)))?;
        mail.attachments = self.attachments.list_for_mail(mail_id).await?;
        Ok(mail)
    }

    /// Per-folder counts, including zeroed system folders and the virtual
    /// starred/important views.
    pub async fn folder_counts(&self) -> Result<HashMap<String, i64>> {
        Ok(mails::folder_counts(&self.db).await?)
    }

    /// Applies a partial update to a mail's read/starred/folder state.
    ///
    /// All-or-nothing: an empty patch or an unknown target folder rejects
    /// the whole request and nothing is written.
    pub async fn patch_mail(&self, mail_id: &MailId, patch: MailPatch) -> Result<Mail> {
        if patch.is_empty() {
            return Err(ServiceError::Validation(
                "no valid fields to update".to_string(),
            ));
        }

        if let Some(folder) = &patch.folder {
            let valid = is_system_folder(&folder.0)
                || (is_custom_folder_id(&folder.0)
                    && folders::get_by_id(&self.db, folder).await?.is_some());
            if !valid {
                return Err(ServiceError::Validation(format!(
                    "invalid target folder: {}",
                    folder
                )));
            }
        }

        mails::patch(&self.db, mail_id, patch)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("mail {}", mail_id)))
    }

    /// Sends a mail via SMTP, then records it in the sent folder.
    ///
    /// SMTP goes first: a transport failure persists nothing. The inverse
    /// failure (sent but not saved) is reported as [`ServiceError::SentNotSaved`]
    /// since the message is already on the wire.
    pub async fn send_mail(&self, request: SendMailRequest) -> Result<Mail> {
        let to = request.to.trim().to_string();
        let subject = request.subject.trim().to_string();
        let body = request.body.trim().to_string();

        if to.is_empty() {
            return Err(ServiceError::Validation("missing recipient".to_string()));
        }

        let account = settings::get(&self.db)
            .await?
            .filter(|s| s.can_send())
            .ok_or_else(|| {
                ServiceError::Config(
                    "sending is not configured: set the account email, SMTP server, and password first"
                        .to_string(),
                )
            })?;

        let outgoing_attachments = decode_attachments(&request.attachments)?;
        if request.attachments.len() > MAX_SEND_ATTACHMENTS {
            warn!(
                dropped = request.attachments.len() - MAX_SEND_ATTACHMENTS,
                "attachment limit exceeded, extras dropped"
            );
        }

        let from_name = if account.display_name.is_empty() {
            account.email.clone()
        } else {
            account.display_name.clone()
        };

        let outgoing = OutgoingMail {
            from_name,
            from_email: account.email.clone(),
            to: to.clone(),
            subject: subject.clone(),
            body: body.clone(),
            attachments: outgoing_attachments,
        };

        self.transport.send(&account, &outgoing).await?;

        let mail = Mail {
            id: MailId::for_local(),
            sender_name: outgoing.from_name.clone(),
            sender_email: account.email,
            recipient: to,
            subject,
            snippet: text::snippet(&body),
            body,
            html_body: None,
            date: now_minute(),
            read: true,
            starred: false,
            folder: FolderId::from("sent"),
            attachments: vec![],
        };

        mails::insert_or_replace(&self.db, &mail)
            .await
            .map_err(|e| ServiceError::SentNotSaved(e.to_string()))?;

        info!(mail = %mail.id, "sent mail recorded");
        Ok(mail)
    }

    /// Creates or updates a draft.
    ///
    /// With an id that exists, the draft's content and date are updated in
    /// place. Otherwise a fresh draft is created (a stale id is ignored).
    pub async fn save_draft(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        id: Option<MailId>,
    ) -> Result<Mail> {
        let date = now_minute();
        let snippet = text::snippet(body);

        if let Some(id) = id {
            let updated =
                mails::update_draft(&self.db, &id, to, subject, body, &snippet, &date).await?;
            if updated {
                return mails::get_by_id(&self.db, &id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("mail {}", id)));
            }
        }

        let account = settings::get(&self.db).await?;
        let mail = Mail {
            id: MailId::for_local(),
            sender_name: account
                .as_ref()
                .map(|a| a.display_name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Me".to_string()),
            sender_email: account
                .map(|a| a.email)
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "me@unimail.app".to_string()),
            recipient: to.to_string(),
            subject: subject.to_string(),
            snippet,
            body: body.to_string(),
            html_body: None,
            date,
            read: true,
            starred: false,
            folder: FolderId::from("drafts"),
            attachments: vec![],
        };

        mails::insert_or_replace(&self.db, &mail).await?;
        Ok(mail)
    }

    /// Loads attachment metadata and its payload for download.
    pub async fn open_attachment(
        &self,
        attachment_id: &crate::domain::AttachmentId,
    ) -> Result<(MailAttachment, Vec<u8>)> {
        let attachment = self
            .attachments
            .get(attachment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("attachment {}", attachment_id)))?;

        let bytes = self.attachments.read(&attachment).await.map_err(|_| {
            ServiceError::NotFound(format!("attachment content for {}", attachment_id))
        })?;

        Ok((attachment, bytes))
    }

    /// Resolves an inline image of a mail by Content-ID, for `cid:`
    /// references in the HTML body.
    pub async fn open_inline_image(
        &self,
        mail_id: &MailId,
        content_id: &str,
    ) -> Result<(MailAttachment, Vec<u8>)> {
        let attachment = self
            .attachments
            .get_by_content_id(mail_id, content_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("inline image {} in {}", content_id, mail_id))
            })?;

        // Metadata without a readable file is indistinguishable from missing.
        let bytes = self.attachments.read(&attachment).await.map_err(|_| {
            ServiceError::NotFound(format!("inline image {} in {}", content_id, mail_id))
        })?;
        Ok((attachment, bytes))
    }

    /// Seeds a welcome mail into an otherwise empty store, once.
    pub async fn ensure_welcome_mail(&self) -> Result<()> {
        if mails::any_exist(&self.db).await? {
            return Ok(());
        }

        let mail = Mail {
            id: MailId::from("welcome-1"),
            sender_name: "Unimail".to_string(),
            sender_email: "noreply@unimail.app".to_string(),
            recipient: "me@unimail.app".to_string(),
            subject: "Welcome to Unimail".to_string(),
            snippet: "Your mailbox is ready. Configure your account in Settings to start syncing."
                .to_string(),
            body: "Your mailbox is ready.\n\nConfigure your account in Settings to start \
                   syncing your inbox.\n\n— The Unimail team"
                .to_string(),
            html_body: None,
            date: now_minute(),
            read: false,
            starred: false,
            folder: FolderId::from("inbox"),
            attachments: vec![],
        };

        mails::insert_missing(&self.db, &[mail]).await?;
        Ok(())
    }
}

/// Decodes the base64 attachment payloads, enforcing the count cap.
fn decode_attachments(attachments: &[SendAttachment]) -> Result<Vec<OutgoingAttachment>> {
    attachments
        .iter()
        .take(MAX_SEND_ATTACHMENTS)
        .map(|a| {
            let data = BASE64.decode(a.content.as_bytes()).map_err(|e| {
                ServiceError::Validation(format!("invalid attachment encoding for {}: {}", a.filename, e))
            })?;
            let content_type = if a.content_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                a.content_type.clone()
            };
            Ok(OutgoingAttachment {
                filename: a.filename.clone(),
                content_type,
                data,
            })
        })
        .collect()
}

fn now_minute() -> String {
    Utc::now().format("%Y-%m-%d %H:%M").to_string()
}
