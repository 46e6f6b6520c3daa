//! unimail - command line entry point for the mailbox engine

use std::sync::Arc;

use anyhow::{bail, Context};
use directories::ProjectDirs;

use unimail::providers::{ImapConnector, SmtpMailer};
use unimail::services::{FolderService, MailService, SyncService};
use unimail::storage::StorageLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let dirs = ProjectDirs::from("app", "unimail", "unimail")
        .context("could not determine a data directory")?;
    let storage = StorageLayer::open(dirs.data_dir()).await?;

    let mail_service = MailService::new(&storage, Arc::new(SmtpMailer::new()));
    let folder_service = FolderService::new(&storage);
    let sync_service = SyncService::new(&storage, Arc::new(ImapConnector::new()));

    mail_service.ensure_welcome_mail().await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("sync") => {
            let outcome = sync_service.sync().await?;
            println!("synced {} new mails", outcome.synced);
        }
        Some("folders") => {
            for folder in folder_service.list_folders().await? {
                println!("{}\t{}", folder.id, folder.name);
            }
        }
        Some("list") => {
            let folder = args
                .get(1)
                .context("usage: unimail list <folder-id>")?
                .as_str();
            for mail in mail_service.list_mails(&folder.into()).await? {
                println!("{}\t{}\t{}", mail.date, mail.sender_name, mail.subject);
            }
        }
        Some("counts") => {
            let counts = mail_service.folder_counts().await?;
            let mut entries: Vec<_> = counts.into_iter().collect();
            entries.sort();
            for (folder, count) in entries {
                println!("{}\t{}", folder, count);
            }
        }
        Some(other) => bail!("unknown command: {other}"),
        None => {
            eprintln!("usage: unimail <sync|folders|list <folder-id>|counts>");
        }
    }

    Ok(())
}
