//! Business services layer.
//!
//! Services orchestrate between providers (IMAP/SMTP) and storage,
//! enforcing the validation and state rules the storage layer does not:
//!
//! - [`SyncService`]: pulls recent inbox mail into the local store
//! - [`MailService`]: listing, reading, flag/folder changes, compose/send
//! - [`FolderService`]: custom folder lifecycle
//! - [`SettingsService`]: account configuration

mod folder_service;
mod mail_service;
mod settings_service;
mod sync_service;

pub use folder_service::FolderService;
pub use mail_service::{MailService, SendAttachment, SendMailRequest};
pub use settings_service::SettingsService;
pub use sync_service::{SyncOutcome, SyncService, SYNC_WINDOW};

use thiserror::Error;

use crate::providers::ProviderError;
use crate::storage::DatabaseError;

/// Errors surfaced by the services layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The account is not configured for the requested operation.
    #[error("{0}")]
    Config(String),

    /// Remote server failure; carries the remote error text verbatim.
    #[error("{0}")]
    Connection(String),

    /// The request itself is invalid.
    #[error("{0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The message left via SMTP but the local copy could not be written.
    #[error("message sent but not saved locally: {0}")]
    SentNotSaved(String),

    /// Local persistence failure.
    #[error("storage error: {0}")]
    Storage(#[from] DatabaseError),
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Authentication(msg) | ProviderError::Connection(msg) => {
                ServiceError::Connection(msg)
            }
            ProviderError::InvalidRequest(msg) => ServiceError::Validation(msg),
        }
    }
}
