//! Account settings persistence.
//!
//! A single-row table (id = 1) holds the configured account. Saving always
//! writes the full record; partial updates are merged in the config layer
//! before reaching here.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::config::{AccountSettings, ServerConfig};
use crate::storage::database::{Database, Result};

/// Loads the stored account settings, if any have been saved.
pub async fn get(db: &Database) -> Result<Option<AccountSettings>> {
    db.with_conn(|conn| {
        let result = conn
            .prepare(
                "SELECT display_name, email, password, \
                 imap_host, imap_port, imap_secure, \
                 smtp_host, smtp_port, smtp_secure \
                 FROM account_settings WHERE id = 1",
            )?
            .query_row([], row_to_settings)
            .optional()?;
        Ok(result)
    })
    .await
}

/// Writes the full settings record, replacing any previous row.
pub async fn save(db: &Database, settings: &AccountSettings) -> Result<()> {
    let settings = settings.clone();
    let updated_at = Utc::now().to_rfc3339();

    db.with_conn(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO account_settings \
             (id, display_name, email, password, \
              imap_host, imap_port, imap_secure, \
              smtp_host, smtp_port, smtp_secure, updated_at) \
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                settings.display_name,
                settings.email,
                settings.password,
                settings.imap.host,
                settings.imap.port,
                settings.imap.secure as i32,
                settings.smtp.host,
                settings.smtp.port,
                settings.smtp.secure as i32,
                updated_at,
            ],
        )?;
        Ok(())
    })
    .await
}

fn row_to_settings(row: &Row<'_>) -> std::result::Result<AccountSettings, rusqlite::Error> {
    Ok(AccountSettings {
        display_name: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        imap: ServerConfig {
            host: row.get(3)?,
            port: row.get(4)?,
            secure: row.get::<_, i32>(5)? != 0,
        },
        smtp: ServerConfig {
            host: row.get(6)?,
            port: row.get(7)?,
            secure: row.get::<_, i32>(8)? != 0,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_none_before_first_save() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let db = Database::open_in_memory().await.unwrap();
        let mut settings = AccountSettings::empty("me@example.com");
        settings.password = "secret".to_string();
        settings.imap.host = "imap.example.com".to_string();
        settings.smtp.host = "smtp.example.com".to_string();
        settings.smtp.secure = false;
        settings.smtp.port = 587;

        save(&db, &settings).await.unwrap();

        let loaded = get(&db).await.unwrap().unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn save_replaces_single_row() {
        let db = Database::open_in_memory().await.unwrap();
        save(&db, &AccountSettings::empty("first@example.com"))
            .await
            .unwrap();
        save(&db, &AccountSettings::empty("second@example.com"))
            .await
            .unwrap();

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM account_settings", [], |r| r.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        let loaded = get(&db).await.unwrap().unwrap();
        assert_eq!(loaded.email, "second@example.com");
    }
}
