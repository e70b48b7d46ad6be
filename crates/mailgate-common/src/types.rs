//! Common types for Mailgate

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Credentials for one IMAP mailbox. Lives for exactly one request.
///
/// The `Debug` impl redacts the secret so credentials can never leak
/// through tracing output.
#[derive(Clone)]
pub struct MailboxCredentials {
    /// IMAP host, optionally `host:port` (993 assumed otherwise)
    pub host: String,
    pub login: String,
    pub secret: String,
}

impl MailboxCredentials {
    /// Split the host field into hostname and port, defaulting to 993.
    ///
    /// The override only applies when the prefix holds no further colons,
    /// so a bare IPv6 literal like `::1` keeps the default port.
    pub fn host_port(&self) -> (&str, u16) {
        match self.host.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => match port.parse() {
                Ok(port) => (host, port),
                Err(_) => (self.host.as_str(), 993),
            },
            _ => (self.host.as_str(), 993),
        }
    }
}

impl std::fmt::Debug for MailboxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxCredentials")
            .field("host", &self.host)
            .field("login", &self.login)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Which IMAP identifier space a retrieval operates in.
///
/// Sequence numbers are volatile within a session; UIDs are stable across
/// sessions. One session never mixes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierMode {
    Sequence,
    Uid,
}

/// The stable output unit of the retrieval pipeline.
///
/// All string fields are valid UTF-8 even when the source encoding was
/// unknown or malformed; decoding degrades, it never fails.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailRecord {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub sent_at: Option<DateTime<Utc>>,
}
