//! Mailbox read handlers

use axum::Json;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use mailgate_common::types::{EmailRecord, IdentifierMode, MailboxCredentials};
use mailgate_common::{Error, Result};
use mailgate_core::{list_emails, SearchCriteria};

/// Request body for `POST /read_emails`.
///
/// At most one of `last_id`, `iso_datetime`, `last_n` may be present;
/// none of them means the full mailbox. The legacy `imap_date` companion
/// field some clients send alongside `iso_datetime` is ignored; the
/// criteria resolver derives the day part itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadEmailsRequest {
    pub imap: String,
    pub login: String,
    pub password: String,
    /// Keep only messages with an identifier strictly greater than this
    #[serde(default)]
    pub last_id: Option<u32>,
    /// Keep only messages sent strictly after this instant (RFC 3339)
    #[serde(default)]
    pub iso_datetime: Option<DateTime<FixedOffset>>,
    /// Keep only the last N messages
    #[serde(default)]
    pub last_n: Option<usize>,
    /// Address messages by persistent UID instead of sequence number
    #[serde(default)]
    pub use_uid: Option<bool>,
}

/// Request body for `POST /read_emails_last_7_days`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadLastWeekRequest {
    pub imap: String,
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub use_uid: Option<bool>,
}

/// Read responses are always HTTP 200: either the record array or an
/// `{"error": ...}` object. Legacy behavior, preserved deliberately.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReadResponse {
    Records(Vec<EmailRecord>),
    Failure { error: String },
}

impl ReadEmailsRequest {
    fn criteria(&self) -> Result<SearchCriteria> {
        match (self.last_id, self.iso_datetime, self.last_n) {
            (None, None, None) => Ok(SearchCriteria::All),
            (Some(id), None, None) => Ok(SearchCriteria::SinceId(id)),
            (None, Some(instant), None) => {
                Ok(SearchCriteria::SinceInstant(instant.with_timezone(&Utc)))
            }
            (None, None, Some(n)) => Ok(SearchCriteria::LastN(n)),
            _ => Err(Error::Validation(
                "at most one of last_id, iso_datetime, last_n may be given".to_string(),
            )),
        }
    }
}

fn identifier_mode(use_uid: Option<bool>) -> IdentifierMode {
    if use_uid.unwrap_or(false) {
        IdentifierMode::Uid
    } else {
        IdentifierMode::Sequence
    }
}

async fn run_retrieval(
    creds: MailboxCredentials,
    criteria: SearchCriteria,
    mode: IdentifierMode,
) -> Json<ReadResponse> {
    match list_emails(&creds, &criteria, mode).await {
        Ok(records) => Json(ReadResponse::Records(records)),
        Err(e) => {
            error!("retrieval failed: {}", e);
            Json(ReadResponse::Failure {
                error: e.to_string(),
            })
        }
    }
}

/// Read matching emails
///
/// POST /read_emails
pub async fn read_emails(Json(req): Json<ReadEmailsRequest>) -> Json<ReadResponse> {
    let criteria = match req.criteria() {
        Ok(criteria) => criteria,
        Err(e) => {
            return Json(ReadResponse::Failure {
                error: e.to_string(),
            })
        }
    };
    let mode = identifier_mode(req.use_uid);
    let creds = MailboxCredentials {
        host: req.imap,
        login: req.login,
        secret: req.password,
    };
    run_retrieval(creds, criteria, mode).await
}

/// Read emails received in the last seven days
///
/// POST /read_emails_last_7_days
pub async fn read_emails_last_week(Json(req): Json<ReadLastWeekRequest>) -> Json<ReadResponse> {
    let since = Utc::now().date_naive() - Duration::days(7);
    let mode = identifier_mode(req.use_uid);
    let creds = MailboxCredentials {
        host: req.imap,
        login: req.login,
        secret: req.password,
    };
    run_retrieval(creds, SearchCriteria::SinceDate(since), mode).await
}
