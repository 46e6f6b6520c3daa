//! Remote mailbox providers: IMAP for receiving, SMTP for sending, plus
//! message parsing.

pub mod imap;
pub mod parser;
pub mod smtp;
pub mod traits;

pub use imap::ImapConnector;
pub use parser::{ParsedAttachment, ParsedMail};
pub use smtp::{MailTransport, OutgoingAttachment, OutgoingMail, SmtpMailer};
pub use traits::{
    MailboxConnector, MailboxSession, ProviderError, RemoteEnvelope, RemoteMessage,
};
