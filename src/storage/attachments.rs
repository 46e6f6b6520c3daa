//! Attachment payload storage.
//!
//! Attachment bytes live as files under a dedicated directory, keyed by
//! the derived attachment id; only metadata and the file path go in
//! SQLite. Rows cascade away with their mail, files are cleaned up lazily.

use std::path::{Path, PathBuf};

use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::domain::{AttachmentId, MailAttachment, MailId};
use crate::storage::database::{Database, Result};

/// Stores attachment payloads on disk and their metadata in the database.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    db: Database,
    root: PathBuf,
}

impl AttachmentStore {
    /// Creates a store rooted at the given directory, creating it if needed.
    pub async fn new(db: Database, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { db, root })
    }

    /// Persists one attachment: bytes to disk first, then the metadata row.
    ///
    /// The index is the attachment's position within its mail and feeds the
    /// derived id, so re-saving the same mail overwrites rather than
    /// duplicates.
    pub async fn save(
        &self,
        mail_id: &MailId,
        index: usize,
        filename: &str,
        content_type: &str,
        content_id: Option<&str>,
        bytes: &[u8],
    ) -> Result<MailAttachment> {
        let id = AttachmentId::derive(mail_id, index);
        let path = self.root.join(&id.0);

        tokio::fs::write(&path, bytes).await?;
        debug!(attachment = %id, size = bytes.len(), "wrote attachment payload");

        let attachment = MailAttachment {
            id,
            mail_id: mail_id.clone(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            content_id: content_id.map(str::to_string),
            content_path: path,
        };

        let row = attachment.clone();
        self.db
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO mail_attachments \
                     (id, mail_id, filename, content_type, size, content_id, content_path, \
                      ordinal) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        row.id.0,
                        row.mail_id.0,
                        row.filename,
                        row.content_type,
                        row.size as i64,
                        row.content_id,
                        row.content_path.to_string_lossy(),
                        index as i64,
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(attachment)
    }

    /// Lists attachment metadata for a mail, in stored (index) order.
    ///
    /// Ordering uses the numeric ordinal column; the derived id would sort
    /// index 10 between 1 and 2.
    pub async fn list_for_mail(&self, mail_id: &MailId) -> Result<Vec<MailAttachment>> {
        let mail_id = mail_id.clone();

        self.db
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, mail_id, filename, content_type, size, content_id, content_path \
                     FROM mail_attachments WHERE mail_id = ?1 ORDER BY ordinal",
                )?;
                let rows = stmt.query_map([&mail_id.0], row_to_attachment)?;
                let attachments: std::result::Result<Vec<_>, _> = rows.collect();
                Ok(attachments?)
            })
            .await
    }

    /// Retrieves one attachment's metadata by id.
    pub async fn get(&self, attachment_id: &AttachmentId) -> Result<Option<MailAttachment>> {
        let attachment_id = attachment_id.clone();

        self.db
            .with_conn(move |conn| {
                let result = conn
                    .prepare(
                        "SELECT id, mail_id, filename, content_type, size, content_id, content_path \
                         FROM mail_attachments WHERE id = ?1",
                    )?
                    .query_row([&attachment_id.0], row_to_attachment)
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Finds an inline attachment of a mail by Content-ID.
    ///
    /// Senders vary on whether the id is stored angle-bracket wrapped, so
    /// both the raw value and `<value>` match.
    pub async fn get_by_content_id(
        &self,
        mail_id: &MailId,
        content_id: &str,
    ) -> Result<Option<MailAttachment>> {
        let mail_id = mail_id.clone();
        let raw = content_id.to_string();
        let wrapped = format!("<{raw}>");

        self.db
            .with_conn(move |conn| {
                let result = conn
                    .prepare(
                        "SELECT id, mail_id, filename, content_type, size, content_id, content_path \
                         FROM mail_attachments \
                         WHERE mail_id = ?1 AND (content_id = ?2 OR content_id = ?3)",
                    )?
                    .query_row(params![mail_id.0, raw, wrapped], row_to_attachment)
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Reads an attachment's payload from disk.
    pub async fn read(&self, attachment: &MailAttachment) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(&attachment.content_path).await?;
        Ok(bytes)
    }
}

fn row_to_attachment(row: &Row<'_>) -> std::result::Result<MailAttachment, rusqlite::Error> {
    let path: String = row.get(6)?;
    Ok(MailAttachment {
        id: AttachmentId(row.get(0)?),
        mail_id: MailId(row.get(1)?),
        filename: row.get(2)?,
        content_type: row.get(3)?,
        size: row.get::<_, i64>(4)? as u64,
        content_id: row.get(5)?,
        content_path: PathBuf::from(path),
    })
}
