//! Custom folder lifecycle.
//!
//! System folders are fixed; this service only creates and deletes custom
//! folders and answers folder listings. Deleting a folder never deletes
//! mail: members are reassigned to the inbox inside the same transaction.

use tracing::info;

use super::{Result, ServiceError};
use crate::domain::{is_custom_folder_id, Folder, FolderId};
use crate::storage::queries::folders;
use crate::storage::{Database, StorageLayer};

/// Folder listing, creation, and deletion.
pub struct FolderService {
    db: Database,
}

impl FolderService {
    pub fn new(storage: &StorageLayer) -> Self {
        Self {
            db: storage.db.clone(),
        }
    }

    /// All folders, system first then custom.
    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        Ok(folders::list(&self.db).await?)
    }

    /// Loads one folder.
    pub async fn get_folder(&self, folder_id: &FolderId) -> Result<Folder> {
        folders::get_by_id(&self.db, folder_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("folder {}", folder_id)))
    }

    /// Creates a custom folder from a display name.
    ///
    /// The name is trimmed; an empty result is rejected. Duplicate names
    /// are allowed since identity is the generated id.
    pub async fn create_folder(&self, name: &str) -> Result<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "folder name must not be empty".to_string(),
            ));
        }

        let folder = folders::create_custom(&self.db, name).await?;
        info!(folder = %folder.id, "custom folder created");
        Ok(folder)
    }

    /// Deletes a custom folder, moving its mails to the inbox.
    ///
    /// Only `custom-` ids are deletable; system and virtual ids are
    /// rejected outright.
    pub async fn delete_folder(&self, folder_id: &FolderId) -> Result<()> {
        if !is_custom_folder_id(&folder_id.0) {
            return Err(ServiceError::Validation(
                "only custom folders can be deleted".to_string(),
            ));
        }

        let deleted = folders::delete(&self.db, folder_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("folder {}", folder_id)));
        }

        info!(folder = %folder_id, "custom folder deleted");
        Ok(())
    }
}
