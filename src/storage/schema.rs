//! SQL schema definitions as const strings.
//!
//! Contains the complete SQLite schema for the local mailbox, plus the
//! idempotent system folder seed. Every statement here is safe to re-run;
//! `Database::open` executes all of them at startup.

/// SQL to create the folders table.
pub const CREATE_FOLDERS: &str = r#"
CREATE TABLE IF NOT EXISTS folders (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    kind TEXT NOT NULL CHECK(kind IN ('system','custom')),
    sort_order INTEGER NOT NULL DEFAULT 0
)
"#;

/// SQL to create the mails table.
pub const CREATE_MAILS: &str = r#"
CREATE TABLE IF NOT EXISTS mails (
    id TEXT PRIMARY KEY,
    sender_name TEXT NOT NULL,
    sender_email TEXT NOT NULL,
    recipient TEXT NOT NULL,
    subject TEXT NOT NULL,
    snippet TEXT NOT NULL,
    body TEXT NOT NULL,
    html_body TEXT,
    date TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0,
    starred INTEGER NOT NULL DEFAULT 0,
    folder_id TEXT NOT NULL REFERENCES folders(id)
)
"#;

/// SQL to create mail indexes.
pub const CREATE_MAIL_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_mails_folder ON mails(folder_id);
CREATE INDEX IF NOT EXISTS idx_mails_starred ON mails(starred);
CREATE INDEX IF NOT EXISTS idx_mails_date ON mails(date DESC)
"#;

/// SQL to create the attachments table.
pub const CREATE_ATTACHMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS mail_attachments (
    id TEXT PRIMARY KEY,
    mail_id TEXT NOT NULL REFERENCES mails(id) ON DELETE CASCADE,
    filename TEXT NOT NULL,
    content_type TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0,
    content_id TEXT,
    content_path TEXT NOT NULL,
    ordinal INTEGER NOT NULL DEFAULT 0
)
"#;

/// SQL to create the attachments index.
pub const CREATE_ATTACHMENTS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_attachments_mail ON mail_attachments(mail_id)
"#;

/// SQL to create the single-row account settings table.
pub const CREATE_ACCOUNT_SETTINGS: &str = r#"
CREATE TABLE IF NOT EXISTS account_settings (
    id INTEGER PRIMARY KEY CHECK(id = 1),
    display_name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    password TEXT NOT NULL DEFAULT '',
    imap_host TEXT NOT NULL DEFAULT '',
    imap_port INTEGER NOT NULL DEFAULT 993,
    imap_secure INTEGER NOT NULL DEFAULT 1,
    smtp_host TEXT NOT NULL DEFAULT '',
    smtp_port INTEGER NOT NULL DEFAULT 465,
    smtp_secure INTEGER NOT NULL DEFAULT 1,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to seed the five system folders. `OR IGNORE` keeps re-runs no-ops.
pub const SEED_SYSTEM_FOLDERS: &str = r#"
INSERT OR IGNORE INTO folders (id, name, kind, sort_order) VALUES
    ('inbox', 'Inbox', 'system', 0),
    ('sent', 'Sent', 'system', 1),
    ('drafts', 'Drafts', 'system', 2),
    ('trash', 'Trash', 'system', 3),
    ('spam', 'Spam', 'system', 4)
"#;

/// Returns all schema statements in execution order.
pub fn all_migrations() -> Vec<&'static str> {
    vec![
        CREATE_FOLDERS,
        CREATE_MAILS,
        CREATE_MAIL_INDEXES,
        CREATE_ATTACHMENTS,
        CREATE_ATTACHMENTS_INDEX,
        CREATE_ACCOUNT_SETTINGS,
        SEED_SYSTEM_FOLDERS,
    ]
}
