//! Account configuration types.
//!
//! One external mailbox is configured per installation: IMAP for receiving
//! and SMTP for sending. The record is persisted as a single row by
//! [`crate::storage::queries::settings`]; partial saves merge over the
//! stored values.

use serde::{Deserialize, Serialize};

/// Default IMAP port (implicit TLS).
pub const DEFAULT_IMAP_PORT: u16 = 993;

/// Default SMTP port (implicit TLS).
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Connection parameters for one mail server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server hostname; empty until configured.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Whether to use implicit TLS.
    pub secure: bool,
}

impl ServerConfig {
    fn imap_default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_IMAP_PORT,
            secure: true,
        }
    }

    fn smtp_default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SMTP_PORT,
            secure: true,
        }
    }
}

/// The configured external mailbox account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    /// Display name used as the From name when sending.
    pub display_name: String,
    /// Account email address; doubles as the IMAP/SMTP username.
    pub email: String,
    /// Password or app-specific password. Never returned by the safe view.
    pub password: String,
    /// Receiving server.
    pub imap: ServerConfig,
    /// Sending server.
    pub smtp: ServerConfig,
}

impl AccountSettings {
    /// Empty settings with protocol default ports.
    pub fn empty(email: impl Into<String>) -> Self {
        Self {
            display_name: String::new(),
            email: email.into(),
            password: String::new(),
            imap: ServerConfig::imap_default(),
            smtp: ServerConfig::smtp_default(),
        }
    }

    /// Whether sync can be attempted. The email is required because synced
    /// mail ids are derived from it.
    pub fn can_sync(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty() && !self.imap.host.is_empty()
    }

    /// Whether sending can be attempted (password and SMTP host present).
    pub fn can_send(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty() && !self.smtp.host.is_empty()
    }
}

/// A partial update to the stored account settings. Absent fields keep
/// their current values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountSettingsPatch {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub imap: Option<ServerPatch>,
    pub smtp: Option<ServerPatch>,
}

/// Partial server parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: Option<bool>,
}

impl AccountSettingsPatch {
    /// Merges this patch over existing settings (or defaults when none).
    pub fn merge_into(self, existing: Option<AccountSettings>) -> AccountSettings {
        let mut merged = existing.unwrap_or_else(|| AccountSettings::empty(""));
        if let Some(name) = self.display_name {
            merged.display_name = name;
        }
        if let Some(email) = self.email {
            merged.email = email.trim().to_string();
        }
        if let Some(password) = self.password {
            merged.password = password;
        }
        if let Some(imap) = self.imap {
            imap.apply(&mut merged.imap);
        }
        if let Some(smtp) = self.smtp {
            smtp.apply(&mut merged.smtp);
        }
        merged
    }
}

impl ServerPatch {
    fn apply(self, target: &mut ServerConfig) {
        if let Some(host) = self.host {
            target.host = host;
        }
        if let Some(port) = self.port {
            target.port = port;
        }
        if let Some(secure) = self.secure {
            target.secure = secure;
        }
    }
}

/// Settings as exposed to the presentation layer: password elided.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSettingsSafe {
    pub display_name: String,
    pub email: String,
    pub imap: ServerConfig,
    pub smtp: ServerConfig,
    pub has_password: bool,
}

impl From<&AccountSettings> for AccountSettingsSafe {
    fn from(s: &AccountSettings) -> Self {
        Self {
            display_name: s.display_name.clone(),
            email: s.email.clone(),
            imap: s.imap.clone(),
            smtp: s.smtp.clone(),
            has_password: !s.password.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AccountSettings {
        AccountSettings {
            display_name: "Me".to_string(),
            email: "me@example.com".to_string(),
            password: "hunter2".to_string(),
            imap: ServerConfig {
                host: "imap.example.com".to_string(),
                port: 993,
                secure: true,
            },
            smtp: ServerConfig {
                host: "smtp.example.com".to_string(),
                port: 465,
                secure: true,
            },
        }
    }

    #[test]
    fn can_sync_requires_email_password_and_host() {
        let mut s = configured();
        assert!(s.can_sync());

        s.password.clear();
        assert!(!s.can_sync());

        let mut s = configured();
        s.imap.host.clear();
        assert!(!s.can_sync());

        let mut s = configured();
        s.email.clear();
        assert!(!s.can_sync());
    }

    #[test]
    fn can_send_requires_smtp_host() {
        let mut s = configured();
        assert!(s.can_send());
        s.smtp.host.clear();
        assert!(!s.can_send());
    }

    #[test]
    fn patch_merges_over_existing() {
        let existing = configured();
        let patch = AccountSettingsPatch {
            password: Some("new-secret".to_string()),
            imap: Some(ServerPatch {
                port: Some(143),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = patch.merge_into(Some(existing));
        assert_eq!(merged.password, "new-secret");
        assert_eq!(merged.imap.port, 143);
        assert_eq!(merged.imap.host, "imap.example.com");
        assert_eq!(merged.email, "me@example.com");
    }

    #[test]
    fn patch_from_nothing_uses_defaults() {
        let patch = AccountSettingsPatch {
            email: Some(" me@example.com ".to_string()),
            ..Default::default()
        };
        let merged = patch.merge_into(None);
        assert_eq!(merged.email, "me@example.com");
        assert_eq!(merged.imap.port, DEFAULT_IMAP_PORT);
        assert_eq!(merged.smtp.port, DEFAULT_SMTP_PORT);
        assert!(merged.imap.secure);
    }

    #[test]
    fn safe_view_elides_password() {
        let safe = AccountSettingsSafe::from(&configured());
        assert!(safe.has_password);
        let json = serde_json::to_string(&safe).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
