//! Folder CRUD operations.
//!
//! System folders are seeded by the schema and can never be created or
//! deleted here; custom folders get a `custom-` prefixed UUID id and a
//! sort order after every existing folder.

use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::domain::{Folder, FolderId, FolderKind, CUSTOM_FOLDER_PREFIX};
use crate::storage::database::{Database, Result};

/// Lists all folders: system folders first in their seeded order, then
/// custom folders by sort order.
pub async fn list(db: &Database) -> Result<Vec<Folder>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, kind, sort_order FROM folders \
             ORDER BY CASE kind WHEN 'system' THEN 0 ELSE 1 END, sort_order, name",
        )?;
        let rows = stmt.query_map([], row_to_folder)?;
        let folders: std::result::Result<Vec<_>, _> = rows.collect();
        Ok(folders?)
    })
    .await
}

/// Retrieves a folder by its id.
pub async fn get_by_id(db: &Database, folder_id: &FolderId) -> Result<Option<Folder>> {
    let folder_id = folder_id.clone();

    db.with_conn(move |conn| {
        let result = conn
            .prepare("SELECT id, name, kind, sort_order FROM folders WHERE id = ?1")?
            .query_row([&folder_id.0], row_to_folder)
            .optional()?;
        Ok(result)
    })
    .await
}

/// Creates a custom folder with the given (already validated) name.
///
/// The id is freshly generated, so two folders may share a name.
pub async fn create_custom(db: &Database, name: &str) -> Result<Folder> {
    let name = name.to_string();
    let id = format!("{CUSTOM_FOLDER_PREFIX}{}", Uuid::new_v4());

    db.with_conn(move |conn| {
        let next_order: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM folders",
            [],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO folders (id, name, kind, sort_order) VALUES (?1, ?2, 'custom', ?3)",
            params![id, name, next_order],
        )?;

        Ok(Folder {
            id: FolderId(id),
            name,
            kind: FolderKind::Custom,
            sort_order: next_order,
        })
    })
    .await
}

/// Deletes a custom folder, reassigning its mails to the inbox first.
///
/// Both steps run in one transaction so a failure leaves the folder and
/// its membership intact. Returns false when no row was deleted. The
/// caller must have already rejected system and virtual ids.
pub async fn delete(db: &Database, folder_id: &FolderId) -> Result<bool> {
    let folder_id = folder_id.clone();

    db.transaction(move |tx| {
        tx.execute(
            "UPDATE mails SET folder_id = 'inbox' WHERE folder_id = ?1",
            [&folder_id.0],
        )?;
        let deleted = tx.execute(
            "DELETE FROM folders WHERE id = ?1 AND kind = 'custom'",
            [&folder_id.0],
        )?;
        Ok(deleted > 0)
    })
    .await
}

fn row_to_folder(row: &Row<'_>) -> std::result::Result<Folder, rusqlite::Error> {
    let kind: String = row.get(2)?;
    Ok(Folder {
        id: FolderId(row.get(0)?),
        name: row.get(1)?,
        kind: FolderKind::parse(&kind).unwrap_or(FolderKind::Custom),
        sort_order: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::queries::mails;
    use crate::storage::queries::mails::tests::make_mail;

    #[tokio::test]
    async fn list_returns_system_folders_first() {
        let db = Database::open_in_memory().await.unwrap();
        create_custom(&db, "Projects").await.unwrap();

        let folders = list(&db).await.unwrap();
        assert_eq!(folders.len(), 6);
        let ids: Vec<&str> = folders.iter().map(|f| f.id.0.as_str()).collect();
        assert_eq!(&ids[..5], &["inbox", "sent", "drafts", "trash", "spam"]);
        assert!(ids[5].starts_with("custom-"));
    }

    #[tokio::test]
    async fn create_custom_assigns_prefixed_id_and_order() {
        let db = Database::open_in_memory().await.unwrap();

        let first = create_custom(&db, "Work").await.unwrap();
        let second = create_custom(&db, "Receipts").await.unwrap();

        assert!(first.id.0.starts_with("custom-"));
        assert_eq!(first.kind, FolderKind::Custom);
        assert!(second.sort_order > first.sort_order);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn duplicate_names_create_distinct_folders() {
        let db = Database::open_in_memory().await.unwrap();
        let a = create_custom(&db, "Work").await.unwrap();
        let b = create_custom(&db, "Work").await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(list(&db).await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn delete_reassigns_mails_to_inbox() {
        let db = Database::open_in_memory().await.unwrap();
        let folder = create_custom(&db, "Work").await.unwrap();

        mails::insert_missing(&db, &[make_mail("m1", &folder.id.0, "2025-01-01 10:00")])
            .await
            .unwrap();

        let deleted = delete(&db, &folder.id).await.unwrap();
        assert!(deleted);

        let moved = mails::get_by_id(&db, &crate::domain::MailId::from("m1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.folder, FolderId::from("inbox"));
        assert!(get_by_id(&db, &folder.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_unknown_returns_false() {
        let db = Database::open_in_memory().await.unwrap();
        let deleted = delete(&db, &FolderId::from("custom-missing")).await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn delete_never_removes_system_folders() {
        let db = Database::open_in_memory().await.unwrap();
        let deleted = delete(&db, &FolderId::from("inbox")).await.unwrap();
        assert!(!deleted);
        assert!(get_by_id(&db, &FolderId::from("inbox")).await.unwrap().is_some());
    }
}
