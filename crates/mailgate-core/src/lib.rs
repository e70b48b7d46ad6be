//! Mailgate core: the email retrieval & normalization pipeline.
//!
//! One retrieval request drives a strictly sequential IMAP protocol:
//! connect, authenticate, select read-only, search, fetch each matching
//! message, normalize it into an [`EmailRecord`], log out. Decoding of
//! headers and bodies is best-effort: it degrades through charset
//! fallbacks rather than rejecting a message.
//!
//! [`EmailRecord`]: mailgate_common::types::EmailRecord

pub mod imap;
pub mod message;
pub mod mime;
pub mod retrieve;
pub mod smtp;

pub use imap::criteria::SearchCriteria;
pub use imap::session::{ImapMailbox, MailboxSession, RawMessage};
pub use retrieve::list_emails;
pub use smtp::outbound::{send_mail, OutgoingMail, SmtpEndpoint};
