//! HTTP surface for Mailgate
//!
//! JSON-over-POST endpoints that drive one-shot IMAP/SMTP sessions per
//! request. Read endpoints preserve the legacy convention of reporting
//! fatal failures as `{"error": ...}` with HTTP 200; send endpoints use
//! conventional status codes.

pub mod handlers;
pub mod routes;

pub use routes::create_router;
