//! Account settings management.
//!
//! Saves merge over the stored record so a client can update just the
//! password or just one server block. Reads for the presentation layer go
//! through the safe view, which never carries the password.

use tracing::info;

use super::{Result, ServiceError};
use crate::config::{AccountSettings, AccountSettingsPatch, AccountSettingsSafe};
use crate::storage::queries::settings;
use crate::storage::{Database, StorageLayer};

/// Reads and writes the single configured account.
pub struct SettingsService {
    db: Database,
}

impl SettingsService {
    pub fn new(storage: &StorageLayer) -> Self {
        Self {
            db: storage.db.clone(),
        }
    }

    /// The stored settings without the password, or `None` before first
    /// configuration.
    pub async fn get_safe(&self) -> Result<Option<AccountSettingsSafe>> {
        Ok(settings::get(&self.db)
            .await?
            .as_ref()
            .map(AccountSettingsSafe::from))
    }

    /// The full stored settings, password included. For internal use by
    /// sync and send; never hand this to the presentation layer.
    pub async fn get_full(&self) -> Result<Option<AccountSettings>> {
        Ok(settings::get(&self.db).await?)
    }

    /// Merges a partial update over the stored settings and persists the
    /// result. The account email is required on every save.
    pub async fn save(&self, patch: AccountSettingsPatch) -> Result<AccountSettingsSafe> {
        let email_ok = patch
            .email
            .as_deref()
            .map(str::trim)
            .is_some_and(|e| !e.is_empty());
        if !email_ok {
            return Err(ServiceError::Validation("email is required".to_string()));
        }

        let existing = settings::get(&self.db).await?;
        let merged = patch.merge_into(existing);
        settings::save(&self.db, &merged).await?;

        info!(email = %merged.email, "account settings saved");
        Ok(AccountSettingsSafe::from(&merged))
    }
}
