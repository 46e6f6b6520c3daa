//! IMAP connector implementation.
//!
//! Implements [`MailboxConnector`] over `async-imap`. Connections use
//! implicit TLS via rustls when the account is marked secure, plain TCP
//! otherwise. Each sync opens a fresh session, selects INBOX, fetches the
//! newest messages, and logs out; no connection is kept between syncs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::debug;

use super::traits::{
    MailboxConnector, MailboxSession, ProviderError, RemoteEnvelope, RemoteMessage, Result,
};
use crate::config::AccountSettings;

/// Connector for standard IMAP servers.
#[derive(Debug, Default)]
pub struct ImapConnector;

impl ImapConnector {
    pub fn new() -> Self {
        Self
    }

    /// Establishes a TLS stream wrapped for futures-style IO.
    async fn connect_tls(host: &str, port: u16) -> Result<Compat<TlsStream<TcpStream>>> {
        let tcp_stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| ProviderError::Connection(format!("TCP connect failed: {}", e)))?;

        let config = ClientConfig::builder()
            .with_root_certificates(tokio_rustls::rustls::RootCertStore::from_iter(
                webpki_roots::TLS_SERVER_ROOTS.iter().cloned(),
            ))
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ProviderError::Connection(format!("invalid server name: {}", e)))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| ProviderError::Connection(format!("TLS handshake failed: {}", e)))?;

        Ok(tls_stream.compat())
    }

    async fn connect_plain(host: &str, port: u16) -> Result<Compat<TcpStream>> {
        let tcp_stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| ProviderError::Connection(format!("TCP connect failed: {}", e)))?;
        Ok(tcp_stream.compat())
    }
}

#[async_trait]
impl MailboxConnector for ImapConnector {
    async fn connect(&self, settings: &AccountSettings) -> Result<Box<dyn MailboxSession>> {
        let host = &settings.imap.host;
        let port = settings.imap.port;
        let username = &settings.email;
        let password = &settings.password;

        debug!(host, port, secure = settings.imap.secure, "connecting to IMAP");

        let inner = if settings.imap.secure {
            let stream = Self::connect_tls(host, port).await?;
            let client = async_imap::Client::new(stream);
            let session = client.login(username, password).await.map_err(|e| {
                ProviderError::Authentication(format!("IMAP login failed: {:?}", e.0))
            })?;
            SessionInner::Tls(session)
        } else {
            let stream = Self::connect_plain(host, port).await?;
            let client = async_imap::Client::new(stream);
            let session = client.login(username, password).await.map_err(|e| {
                ProviderError::Authentication(format!("IMAP login failed: {:?}", e.0))
            })?;
            SessionInner::Plain(session)
        };

        Ok(Box::new(ImapMailboxSession { inner: Some(inner) }))
    }
}

enum SessionInner {
    Tls(async_imap::Session<Compat<TlsStream<TcpStream>>>),
    Plain(async_imap::Session<Compat<TcpStream>>),
}

/// A live IMAP session over either transport.
struct ImapMailboxSession {
    // Taken on close so logout consumes the session exactly once.
    inner: Option<SessionInner>,
}

#[async_trait]
impl MailboxSession for ImapMailboxSession {
    async fn fetch_recent(&mut self, limit: usize) -> Result<Vec<RemoteMessage>> {
        match self.inner.as_mut() {
            Some(SessionInner::Tls(session)) => fetch_recent_on(session, limit).await,
            Some(SessionInner::Plain(session)) => fetch_recent_on(session, limit).await,
            None => Err(ProviderError::Connection("session closed".to_string())),
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.inner.take() {
            Some(SessionInner::Tls(mut session)) => session
                .logout()
                .await
                .map_err(|e| ProviderError::Connection(format!("LOGOUT failed: {}", e))),
            Some(SessionInner::Plain(mut session)) => session
                .logout()
                .await
                .map_err(|e| ProviderError::Connection(format!("LOGOUT failed: {}", e))),
            None => Ok(()),
        }
    }
}

/// Selects INBOX and fetches the newest `limit` messages with envelope
/// and full body, returned in ascending UID order.
async fn fetch_recent_on<S>(
    session: &mut async_imap::Session<S>,
    limit: usize,
) -> Result<Vec<RemoteMessage>>
where
    S: futures::AsyncRead + futures::AsyncWrite + Unpin + Send + std::fmt::Debug,
{
    session
        .select("INBOX")
        .await
        .map_err(|e| ProviderError::Connection(format!("SELECT failed: {}", e)))?;

    let uids = session
        .uid_search("ALL")
        .await
        .map_err(|e| ProviderError::Connection(format!("SEARCH failed: {}", e)))?;

    let mut uid_list: Vec<u32> = uids.into_iter().collect();
    uid_list.sort_unstable();
    if uid_list.len() > limit {
        uid_list = uid_list.split_off(uid_list.len() - limit);
    }

    if uid_list.is_empty() {
        return Ok(vec![]);
    }

    let uid_seq = uid_list
        .iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let fetch_stream = session
        .uid_fetch(&uid_seq, "(UID ENVELOPE BODY[])")
        .await
        .map_err(|e| ProviderError::Connection(format!("FETCH failed: {}", e)))?;

    futures::pin_mut!(fetch_stream);

    let mut messages = Vec::new();
    while let Some(fetch_result) = fetch_stream.next().await {
        let fetch =
            fetch_result.map_err(|e| ProviderError::Connection(format!("FETCH stream: {}", e)))?;

        let Some(uid) = fetch.uid else { continue };

        let envelope = match fetch.envelope() {
            Some(env) => {
                let from = env.from.as_ref().and_then(|addrs| addrs.first());
                let to = env.to.as_ref().and_then(|addrs| addrs.first());
                RemoteEnvelope {
                    from_name: from
                        .and_then(|a| a.name.as_ref())
                        .map(|b| bytes_to_string(b)),
                    from_email: from
                        .map(|a| build_email_from_parts(a.mailbox.as_ref(), a.host.as_ref())),
                    to_email: to
                        .map(|a| build_email_from_parts(a.mailbox.as_ref(), a.host.as_ref())),
                    subject: env.subject.as_ref().map(|b| bytes_to_string(b)),
                    date: env.date.as_ref().and_then(|d| {
                        let date_str = String::from_utf8_lossy(d);
                        DateTime::parse_from_rfc2822(&date_str)
                            .ok()
                            .map(|d| d.with_timezone(&Utc))
                    }),
                }
            }
            None => RemoteEnvelope::default(),
        };

        messages.push(RemoteMessage {
            uid,
            raw: fetch.body().map(|b| b.to_vec()),
            envelope,
        });
    }

    messages.sort_by_key(|m| m.uid);
    debug!(fetched = messages.len(), "fetched inbox messages");
    Ok(messages)
}

fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

/// Builds an email address string from IMAP mailbox and host parts.
fn build_email_from_parts(
    mailbox: Option<&std::borrow::Cow<'_, [u8]>>,
    host: Option<&std::borrow::Cow<'_, [u8]>>,
) -> String {
    match (mailbox, host) {
        (Some(m), Some(h)) => format!(
            "{}@{}",
            String::from_utf8_lossy(m),
            String::from_utf8_lossy(h)
        ),
        (Some(m), None) => String::from_utf8_lossy(m).to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_from_parts_joins_mailbox_and_host() {
        let mailbox = std::borrow::Cow::Borrowed(&b"alice"[..]);
        let host = std::borrow::Cow::Borrowed(&b"example.com"[..]);
        assert_eq!(
            build_email_from_parts(Some(&mailbox), Some(&host)),
            "alice@example.com"
        );
        assert_eq!(build_email_from_parts(Some(&mailbox), None), "alice");
        assert_eq!(build_email_from_parts(None, None), "");
    }
}
