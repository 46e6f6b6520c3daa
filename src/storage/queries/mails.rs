//! Mail CRUD operations.
//!
//! The authoritative local mailbox state: listing by folder (including the
//! starred/important virtual views), folder count aggregation, the
//! insert-if-absent dedup primitive used by sync, and the partial patch
//! used by the folder/state machine.

use rusqlite::{params, OptionalExtension, Row};
use serde::Deserialize;

use crate::domain::{is_virtual_folder, FolderId, Mail, MailId, SYSTEM_FOLDER_IDS};
use crate::storage::database::{Database, Result};
use std::collections::{HashMap, HashSet};

const MAIL_COLUMNS: &str = "id, sender_name, sender_email, recipient, subject, snippet, \
     body, html_body, date, read, starred, folder_id";

/// A partial update to a mail's mutable state.
///
/// Only the provided fields are applied. Folder validity is the caller's
/// responsibility; the store applies whatever folder id it is given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailPatch {
    pub read: Option<bool>,
    pub starred: Option<bool>,
    pub folder: Option<FolderId>,
}

impl MailPatch {
    /// True when no recognized field is present.
    pub fn is_empty(&self) -> bool {
        self.read.is_none() && self.starred.is_none() && self.folder.is_none()
    }
}

/// Lists mails in a folder, newest date first.
///
/// The virtual ids `starred` and `important` ignore folder membership and
/// return every starred mail instead.
pub async fn list_by_folder(db: &Database, folder_id: &FolderId) -> Result<Vec<Mail>> {
    let folder_id = folder_id.clone();

    db.with_conn(move |conn| {
        let (sql, bind_folder) = if is_virtual_folder(&folder_id.0) {
            (
                format!(
                    "SELECT {MAIL_COLUMNS} FROM mails WHERE starred = 1 ORDER BY date DESC"
                ),
                false,
            )
        } else {
            (
                format!(
                    "SELECT {MAIL_COLUMNS} FROM mails WHERE folder_id = ?1 ORDER BY date DESC"
                ),
                true,
            )
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows = if bind_folder {
            stmt.query_map([&folder_id.0], row_to_mail)?
        } else {
            stmt.query_map([], row_to_mail)?
        };
        let mails: std::result::Result<Vec<_>, _> = rows.collect();
        Ok(mails?)
    })
    .await
}

/// Computes per-folder mail counts.
///
/// Every system folder id appears even when zero, and the virtual
/// `starred`/`important` entries carry the starred count regardless of
/// folder, so callers never have to special-case missing keys.
pub async fn folder_counts(db: &Database) -> Result<HashMap<String, i64>> {
    db.with_conn(|conn| {
        let mut counts: HashMap<String, i64> = SYSTEM_FOLDER_IDS
            .iter()
            .map(|id| (id.to_string(), 0))
            .collect();

        let mut stmt =
            conn.prepare("SELECT folder_id, COUNT(*) FROM mails GROUP BY folder_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (folder_id, count) = row?;
            counts.insert(folder_id, count);
        }

        let starred: i64 =
            conn.query_row("SELECT COUNT(*) FROM mails WHERE starred = 1", [], |row| {
                row.get(0)
            })?;
        counts.insert("starred".to_string(), starred);
        counts.insert("important".to_string(), starred);

        Ok(counts)
    })
    .await
}

/// Retrieves a mail by its ID.
pub async fn get_by_id(db: &Database, mail_id: &MailId) -> Result<Option<Mail>> {
    let mail_id = mail_id.clone();

    db.with_conn(move |conn| {
        let sql = format!("SELECT {MAIL_COLUMNS} FROM mails WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let result = stmt.query_row([&mail_id.0], row_to_mail).optional()?;
        Ok(result)
    })
    .await
}

/// Returns every stored mail id.
///
/// Used by sync as a fast membership snapshot; not transactionally
/// consistent with concurrent inserts.
pub async fn all_ids(db: &Database) -> Result<HashSet<MailId>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM mails")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let ids: std::result::Result<HashSet<_>, _> =
            rows.map(|r| r.map(MailId)).collect();
        Ok(ids?)
    })
    .await
}

/// Inserts each mail only if no row with that id exists.
///
/// The core dedup primitive: existing rows are never overwritten, each
/// row's insert-or-skip is independent, and the whole batch runs in one
/// transaction. Returns the number of rows actually inserted.
pub async fn insert_missing(db: &Database, mails: &[Mail]) -> Result<usize> {
    let mails = mails.to_vec();

    db.transaction(move |tx| {
        let mut inserted = 0;
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO mails \
             (id, sender_name, sender_email, recipient, subject, snippet, \
              body, html_body, date, read, starred, folder_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for mail in &mails {
            inserted += stmt.execute(params![
                mail.id.0,
                mail.sender_name,
                mail.sender_email,
                mail.recipient,
                mail.subject,
                mail.snippet,
                mail.body,
                mail.html_body,
                mail.date,
                mail.read as i32,
                mail.starred as i32,
                mail.folder.0,
            ])?;
        }
        Ok(inserted)
    })
    .await
}

/// Inserts or replaces a mail by id.
///
/// Used for locally authored mail where overwriting the same id is
/// intentional (re-saving a draft). Synced mail must go through
/// [`insert_missing`] instead.
pub async fn insert_or_replace(db: &Database, mail: &Mail) -> Result<()> {
    let mail = mail.clone();

    db.with_conn(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO mails \
             (id, sender_name, sender_email, recipient, subject, snippet, \
              body, html_body, date, read, starred, folder_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                mail.id.0,
                mail.sender_name,
                mail.sender_email,
                mail.recipient,
                mail.subject,
                mail.snippet,
                mail.body,
                mail.html_body,
                mail.date,
                mail.read as i32,
                mail.starred as i32,
                mail.folder.0,
            ],
        )?;
        Ok(())
    })
    .await
}

/// Applies the provided patch fields to a mail.
///
/// Returns the updated mail, or `None` when the id does not exist. The
/// whole read-update-read runs in one transaction, so a failure mid-patch
/// never leaves a partially applied update.
pub async fn patch(db: &Database, mail_id: &MailId, patch: MailPatch) -> Result<Option<Mail>> {
    let mail_id = mail_id.clone();

    db.transaction(move |tx| {
        let sql = format!("SELECT {MAIL_COLUMNS} FROM mails WHERE id = ?1");
        let existing = tx
            .prepare(&sql)?
            .query_row([&mail_id.0], row_to_mail)
            .optional()?;
        if existing.is_none() {
            return Ok(None);
        }

        if let Some(read) = patch.read {
            tx.execute(
                "UPDATE mails SET read = ?1 WHERE id = ?2",
                params![read as i32, mail_id.0],
            )?;
        }
        if let Some(starred) = patch.starred {
            tx.execute(
                "UPDATE mails SET starred = ?1 WHERE id = ?2",
                params![starred as i32, mail_id.0],
            )?;
        }
        if let Some(folder) = &patch.folder {
            tx.execute(
                "UPDATE mails SET folder_id = ?1 WHERE id = ?2",
                params![folder.0, mail_id.0],
            )?;
        }

        let updated = tx
            .prepare(&sql)?
            .query_row([&mail_id.0], row_to_mail)
            .optional()?;
        Ok(updated)
    })
    .await
}

/// Updates an existing draft's content in place, refreshing the snippet.
pub async fn update_draft(
    db: &Database,
    mail_id: &MailId,
    recipient: &str,
    subject: &str,
    body: &str,
    snippet: &str,
    date: &str,
) -> Result<bool> {
    let mail_id = mail_id.clone();
    let (recipient, subject, body, snippet, date) = (
        recipient.to_string(),
        subject.to_string(),
        body.to_string(),
        snippet.to_string(),
        date.to_string(),
    );

    db.with_conn(move |conn| {
        let changed = conn.execute(
            "UPDATE mails SET recipient = ?1, subject = ?2, body = ?3, snippet = ?4, date = ?5 \
             WHERE id = ?6",
            params![recipient, subject, body, snippet, date, mail_id.0],
        )?;
        Ok(changed > 0)
    })
    .await
}

/// True when the mails table has at least one row.
pub async fn any_exist(db: &Database) -> Result<bool> {
    db.with_conn(|conn| {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM mails LIMIT 1)",
            [],
            |row| row.get(0),
        )?;
        Ok(exists)
    })
    .await
}

fn row_to_mail(row: &Row<'_>) -> std::result::Result<Mail, rusqlite::Error> {
    Ok(Mail {
        id: MailId(row.get(0)?),
        sender_name: row.get(1)?,
        sender_email: row.get(2)?,
        recipient: row.get(3)?,
        subject: row.get(4)?,
        snippet: row.get(5)?,
        body: row.get(6)?,
        html_body: row.get(7)?,
        date: row.get(8)?,
        read: row.get::<_, i32>(9)? != 0,
        starred: row.get::<_, i32>(10)? != 0,
        folder: FolderId(row.get(11)?),
        attachments: vec![],
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::FolderId;

    pub(crate) fn make_mail(id: &str, folder: &str, date: &str) -> Mail {
        Mail {
            id: MailId::from(id),
            sender_name: "Sender".to_string(),
            sender_email: "sender@example.com".to_string(),
            recipient: "me@example.com".to_string(),
            subject: "Test Subject".to_string(),
            snippet: "Test body".to_string(),
            body: "Test body".to_string(),
            html_body: None,
            date: date.to_string(),
            read: false,
            starred: false,
            folder: FolderId::from(folder),
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn insert_missing_and_get() {
        let db = Database::open_in_memory().await.unwrap();
        let mail = make_mail("m1", "inbox", "2025-01-01 10:00");

        let inserted = insert_missing(&db, &[mail.clone()]).await.unwrap();
        assert_eq!(inserted, 1);

        let fetched = get_by_id(&db, &mail.id).await.unwrap().unwrap();
        assert_eq!(fetched.subject, mail.subject);
        assert_eq!(fetched.folder, FolderId::from("inbox"));
        assert!(!fetched.read);
    }

    #[tokio::test]
    async fn insert_missing_never_overwrites() {
        let db = Database::open_in_memory().await.unwrap();
        let mut original = make_mail("m1", "inbox", "2025-01-01 10:00");
        original.subject = "Original".to_string();
        insert_missing(&db, &[original]).await.unwrap();

        let mut replacement = make_mail("m1", "inbox", "2025-01-02 10:00");
        replacement.subject = "Replacement".to_string();
        let inserted = insert_missing(&db, &[replacement]).await.unwrap();

        assert_eq!(inserted, 0);
        let stored = get_by_id(&db, &MailId::from("m1")).await.unwrap().unwrap();
        assert_eq!(stored.subject, "Original");
    }

    #[tokio::test]
    async fn insert_missing_counts_only_new_rows() {
        let db = Database::open_in_memory().await.unwrap();
        insert_missing(&db, &[make_mail("m1", "inbox", "2025-01-01 10:00")])
            .await
            .unwrap();

        let batch = vec![
            make_mail("m1", "inbox", "2025-01-01 10:00"),
            make_mail("m2", "inbox", "2025-01-01 11:00"),
        ];
        let inserted = insert_missing(&db, &batch).await.unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn insert_or_replace_overwrites() {
        let db = Database::open_in_memory().await.unwrap();
        let mut draft = make_mail("d1", "drafts", "2025-01-01 10:00");
        draft.read = true;
        insert_or_replace(&db, &draft).await.unwrap();

        draft.subject = "Edited".to_string();
        insert_or_replace(&db, &draft).await.unwrap();

        let stored = get_by_id(&db, &draft.id).await.unwrap().unwrap();
        assert_eq!(stored.subject, "Edited");
    }

    #[tokio::test]
    async fn list_by_folder_orders_newest_first() {
        let db = Database::open_in_memory().await.unwrap();
        insert_missing(
            &db,
            &[
                make_mail("old", "inbox", "2025-01-01 10:00"),
                make_mail("new", "inbox", "2025-01-02 10:00"),
                make_mail("other", "sent", "2025-01-03 10:00"),
            ],
        )
        .await
        .unwrap();

        let inbox = list_by_folder(&db, &FolderId::from("inbox")).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].id, MailId::from("new"));
        assert_eq!(inbox[1].id, MailId::from("old"));
    }

    #[tokio::test]
    async fn virtual_folders_filter_on_starred() {
        let db = Database::open_in_memory().await.unwrap();
        let mut starred = make_mail("s1", "sent", "2025-01-01 10:00");
        starred.starred = true;
        insert_missing(
            &db,
            &[starred, make_mail("plain", "inbox", "2025-01-02 10:00")],
        )
        .await
        .unwrap();

        for virtual_id in ["starred", "important"] {
            let mails = list_by_folder(&db, &FolderId::from(virtual_id))
                .await
                .unwrap();
            assert_eq!(mails.len(), 1, "{virtual_id}");
            assert_eq!(mails[0].id, MailId::from("s1"));
        }
    }

    #[tokio::test]
    async fn folder_counts_include_all_system_folders() {
        let db = Database::open_in_memory().await.unwrap();
        let mut starred = make_mail("s1", "inbox", "2025-01-01 10:00");
        starred.starred = true;
        insert_missing(
            &db,
            &[starred, make_mail("m2", "sent", "2025-01-02 10:00")],
        )
        .await
        .unwrap();

        let counts = folder_counts(&db).await.unwrap();
        assert_eq!(counts["inbox"], 1);
        assert_eq!(counts["sent"], 1);
        assert_eq!(counts["drafts"], 0);
        assert_eq!(counts["trash"], 0);
        assert_eq!(counts["spam"], 0);
        assert_eq!(counts["starred"], 1);
        assert_eq!(counts["important"], 1);
    }

    #[tokio::test]
    async fn patch_applies_only_provided_fields() {
        let db = Database::open_in_memory().await.unwrap();
        insert_missing(&db, &[make_mail("m1", "inbox", "2025-01-01 10:00")])
            .await
            .unwrap();

        let updated = patch(
            &db,
            &MailId::from("m1"),
            MailPatch {
                read: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert!(updated.read);
        assert!(!updated.starred);
        assert_eq!(updated.folder, FolderId::from("inbox"));
    }

    #[tokio::test]
    async fn patch_rolls_back_all_fields_when_one_update_fails() {
        let db = Database::open_in_memory().await.unwrap();
        insert_missing(&db, &[make_mail("m1", "inbox", "2025-01-01 10:00")])
            .await
            .unwrap();

        // The folder update hits the FK constraint, so the read update in
        // the same patch must not survive either.
        let result = patch(
            &db,
            &MailId::from("m1"),
            MailPatch {
                read: Some(true),
                folder: Some(FolderId::from("no-such-folder")),
                ..Default::default()
            },
        )
        .await;
        assert!(result.is_err());

        let stored = get_by_id(&db, &MailId::from("m1")).await.unwrap().unwrap();
        assert!(!stored.read);
        assert_eq!(stored.folder, FolderId::from("inbox"));
    }

    #[tokio::test]
    async fn patch_unknown_id_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        let result = patch(&db, &MailId::from("ghost"), MailPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn all_ids_snapshot() {
        let db = Database::open_in_memory().await.unwrap();
        insert_missing(
            &db,
            &[
                make_mail("m1", "inbox", "2025-01-01 10:00"),
                make_mail("m2", "inbox", "2025-01-01 11:00"),
            ],
        )
        .await
        .unwrap();

        let ids = all_ids(&db).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&MailId::from("m1")));
    }

    #[tokio::test]
    async fn update_draft_refreshes_content() {
        let db = Database::open_in_memory().await.unwrap();
        let mut draft = make_mail("d1", "drafts", "2025-01-01 10:00");
        draft.read = true;
        insert_or_replace(&db, &draft).await.unwrap();

        let changed = update_draft(
            &db,
            &draft.id,
            "you@example.com",
            "New subject",
            "New body",
            "New body",
            "2025-01-02 09:30",
        )
        .await
        .unwrap();
        assert!(changed);

        let stored = get_by_id(&db, &draft.id).await.unwrap().unwrap();
        assert_eq!(stored.subject, "New subject");
        assert_eq!(stored.recipient, "you@example.com");
        assert_eq!(stored.date, "2025-01-02 09:30");
    }

    #[tokio::test]
    async fn any_exist_reports_emptiness() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!any_exist(&db).await.unwrap());
        insert_missing(&db, &[make_mail("m1", "inbox", "2025-01-01 10:00")])
            .await
            .unwrap();
        assert!(any_exist(&db).await.unwrap());
    }
}
