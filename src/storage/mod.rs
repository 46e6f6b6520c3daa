//! Local persistence: SQLite state plus on-disk attachment payloads.

pub mod attachments;
pub mod database;
pub mod queries;
pub mod schema;

use std::path::Path;

pub use attachments::AttachmentStore;
pub use database::{Database, DatabaseError};

/// The storage layer as wired at the composition root: the SQLite handle
/// and the attachment store that shares it.
#[derive(Debug, Clone)]
pub struct StorageLayer {
    pub db: Database,
    pub attachments: AttachmentStore,
}

impl StorageLayer {
    /// Opens (or creates) storage under the given data directory.
    ///
    /// Layout: `<data_dir>/unimail.db` plus `<data_dir>/attachments/`.
    pub async fn open(data_dir: impl AsRef<Path>) -> database::Result<Self> {
        let data_dir = data_dir.as_ref();
        let db = Database::open(data_dir.join("unimail.db")).await?;
        let attachments = AttachmentStore::new(db.clone(), data_dir.join("attachments")).await?;
        Ok(Self { db, attachments })
    }

    /// In-memory database with attachments under a caller-provided
    /// directory. Test-oriented, but not test-only: callers own the dir.
    pub async fn in_memory(attachment_dir: impl AsRef<Path>) -> database::Result<Self> {
        let db = Database::open_in_memory().await?;
        let attachments = AttachmentStore::new(db.clone(), attachment_dir).await?;
        Ok(Self { db, attachments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_creates_database_and_attachment_dir() {
        let dir = TempDir::new().unwrap();
        let storage = StorageLayer::open(dir.path()).await.unwrap();

        assert!(dir.path().join("unimail.db").exists());
        assert!(dir.path().join("attachments").is_dir());

        let folders = queries::folders::list(&storage.db).await.unwrap();
        assert_eq!(folders.len(), 5);
    }

    #[tokio::test]
    async fn reopen_preserves_state() {
        let dir = TempDir::new().unwrap();
        {
            let storage = StorageLayer::open(dir.path()).await.unwrap();
            queries::folders::create_custom(&storage.db, "Work")
                .await
                .unwrap();
        }

        let storage = StorageLayer::open(dir.path()).await.unwrap();
        let folders = queries::folders::list(&storage.db).await.unwrap();
        assert_eq!(folders.len(), 6);
    }
}
