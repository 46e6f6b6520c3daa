//! Domain layer types for the unimail core.
//!
//! This module contains the core domain types used throughout the crate:
//! mail items, attachments, folders, and their identifier newtypes.

mod folder;
mod mail;
mod types;

pub use folder::{
    is_custom_folder_id, is_system_folder, is_virtual_folder, Folder, FolderKind,
    CUSTOM_FOLDER_PREFIX, SYSTEM_FOLDER_IDS, VIRTUAL_FOLDER_IDS,
};
pub use mail::{Mail, MailAttachment, UNKNOWN_SENDER};
pub use types::{sanitize_id, AttachmentId, FolderId, MailId};
