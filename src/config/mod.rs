//! Configuration types for the unimail core.

mod account;

pub use account::{
    AccountSettings, AccountSettingsPatch, AccountSettingsSafe, ServerConfig, ServerPatch,
    DEFAULT_IMAP_PORT, DEFAULT_SMTP_PORT,
};
