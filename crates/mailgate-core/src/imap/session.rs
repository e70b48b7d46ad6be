//! One IMAP connection's lifecycle: connect, authenticate, select,
//! search, fetch, logout.

use async_imap::Session;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info};

use mailgate_common::types::{IdentifierMode, MailboxCredentials};
use mailgate_common::{Error, Result};

type TlsStream = async_native_tls::TlsStream<tokio::net::TcpStream>;

/// Raw message bytes as fetched from the server, consumed once by the
/// normalizer and then discarded.
#[derive(Debug)]
pub struct RawMessage {
    pub identifier: String,
    pub bytes: Vec<u8>,
}

/// The session seam between the orchestrator and the wire. Lets the
/// retrieval loop run against a fake server in tests.
#[async_trait]
pub trait MailboxSession: Send {
    /// Select INBOX read-only.
    async fn select_inbox(&mut self) -> Result<()>;

    /// Run a SEARCH (or UID SEARCH) and return matching identifiers in
    /// ascending order.
    async fn search(&mut self, query: &str) -> Result<Vec<u32>>;

    /// Fetch the full RFC 822 payload for one identifier. A failure here
    /// is per-message and must not abort the surrounding retrieval.
    async fn fetch_raw(&mut self, id: u32) -> Result<RawMessage>;

    /// Log out. Idempotent; invoked on every exit path, because skipping
    /// it leaks a server-side session slot.
    async fn close(&mut self);
}

/// A live TLS IMAP session. Owned by exactly one retrieval request and
/// never reused.
pub struct ImapMailbox {
    session: Session<TlsStream>,
    mode: IdentifierMode,
    closed: bool,
}

impl ImapMailbox {
    /// Connect over implicit TLS and authenticate. The identifier mode is
    /// fixed at open time so sequence numbers and UIDs cannot be mixed
    /// within one session.
    pub async fn open(creds: &MailboxCredentials, mode: IdentifierMode) -> Result<Self> {
        let (host, port) = creds.host_port();
        debug!("connecting to {}:{}", host, port);

        let tcp = tokio::net::TcpStream::connect((host, port))
            .await
            .map_err(|e| Error::Connection(format!("TCP connect to {host}:{port} failed: {e}")))?;

        let tls = async_native_tls::TlsConnector::new();
        let stream = tls
            .connect(host, tcp)
            .await
            .map_err(|e| Error::Connection(format!("TLS handshake with {host} failed: {e}")))?;

        let client = async_imap::Client::new(stream);
        let session = client
            .login(&creds.login, &creds.secret)
            .await
            .map_err(|(e, _)| Error::Auth(format!("login rejected for {}: {e}", creds.login)))?;

        info!("IMAP session established with {}", host);
        Ok(Self {
            session,
            mode,
            closed: false,
        })
    }
}

#[async_trait]
impl MailboxSession for ImapMailbox {
    async fn select_inbox(&mut self) -> Result<()> {
        // EXAMINE, not SELECT: read-only, leaves \Seen flags untouched
        self.session
            .examine("INBOX")
            .await
            .map_err(|e| Error::Select(format!("EXAMINE INBOX failed: {e}")))?;
        Ok(())
    }

    async fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        let found = match self.mode {
            IdentifierMode::Sequence => self.session.search(query).await,
            IdentifierMode::Uid => self.session.uid_search(query).await,
        }
        .map_err(|e| Error::Search(format!("SEARCH {query} failed: {e}")))?;

        // The protocol reply carries an unordered set; ascending numeric
        // order approximates chronological arrival.
        let mut ids: Vec<u32> = found.into_iter().collect();
        ids.sort_unstable();
        debug!("search {:?} matched {} messages", query, ids.len());
        Ok(ids)
    }

    async fn fetch_raw(&mut self, id: u32) -> Result<RawMessage> {
        let fetch_err = |reason: String| Error::Fetch {
            id: id.to_string(),
            reason,
        };

        let stream = match self.mode {
            IdentifierMode::Sequence => self
                .session
                .fetch(id.to_string(), "RFC822")
                .await
                .map(|s| s.boxed()),
            IdentifierMode::Uid => self
                .session
                .uid_fetch(id.to_string(), "RFC822")
                .await
                .map(|s| s.boxed()),
        }
        .map_err(|e| fetch_err(e.to_string()))?;

        let responses: Vec<_> = stream.collect().await;
        let fetched = responses
            .into_iter()
            .find_map(|r| r.ok())
            .ok_or_else(|| fetch_err("no FETCH response".to_string()))?;

        let bytes = fetched
            .body()
            .ok_or_else(|| fetch_err("FETCH response without body".to_string()))?
            .to_vec();

        Ok(RawMessage {
            identifier: id.to_string(),
            bytes,
        })
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.session.logout().await {
            debug!("logout failed (session dropped anyway): {}", e);
        }
    }
}
