//! Folder domain types.
//!
//! Folders are named buckets for mail. The five system folders are seeded
//! once and can never be renamed or deleted; custom folders are created on
//! demand with a `custom-` prefixed id. `starred` and `important` are
//! virtual folders: views computed from the starred flag, not rows.

use serde::{Deserialize, Serialize};

use super::FolderId;

/// The fixed system folder ids, in sidebar order.
pub const SYSTEM_FOLDER_IDS: [&str; 5] = ["inbox", "sent", "drafts", "trash", "spam"];

/// Virtual folder ids resolved by filtering on the starred flag.
pub const VIRTUAL_FOLDER_IDS: [&str; 2] = ["starred", "important"];

/// Prefix for generated custom folder ids.
pub const CUSTOM_FOLDER_PREFIX: &str = "custom-";

/// Whether a folder can be deleted or renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
    /// Seeded at initialization, immutable.
    System,
    /// User-created, deletable.
    Custom,
}

impl FolderKind {
    /// The value stored in the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderKind::System => "system",
            FolderKind::Custom => "custom",
        }
    }

    /// Parses the stored column value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(FolderKind::System),
            "custom" => Some(FolderKind::Custom),
            _ => None,
        }
    }
}

/// A named bucket for mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    /// Folder identifier (system id or `custom-...`).
    pub id: FolderId,
    /// Display name.
    pub name: String,
    /// System or custom.
    pub kind: FolderKind,
    /// Position among folders of the same kind.
    pub sort_order: i64,
}

/// Returns true for one of the five fixed system folder ids.
pub fn is_system_folder(id: &str) -> bool {
    SYSTEM_FOLDER_IDS.contains(&id)
}

/// Returns true for the starred/important pseudo-folders.
pub fn is_virtual_folder(id: &str) -> bool {
    VIRTUAL_FOLDER_IDS.contains(&id)
}

/// Returns true for ids with the generated custom-folder prefix.
pub fn is_custom_folder_id(id: &str) -> bool {
    id.starts_with(CUSTOM_FOLDER_PREFIX)
}
