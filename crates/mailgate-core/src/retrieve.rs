//! The end-to-end "list matching emails" operation.

use tracing::warn;

use mailgate_common::types::{EmailRecord, IdentifierMode, MailboxCredentials};
use mailgate_common::Result;

use crate::imap::criteria::SearchCriteria;
use crate::imap::session::{ImapMailbox, MailboxSession};
use crate::message::normalize;

/// Open a session, retrieve every message matching `criteria`, and log
/// out again, on success and on every error path.
///
/// Records come back in ascending identifier order as assigned by the
/// server. That approximates chronological order but is not guaranteed
/// to survive UID renumbering; callers that need strict send order must
/// sort by `sent_at` themselves.
///
/// Failures opening, selecting, or searching abort the whole operation.
/// A failure fetching one message does not: that message is logged and
/// skipped.
pub async fn list_emails(
    creds: &MailboxCredentials,
    criteria: &SearchCriteria,
    mode: IdentifierMode,
) -> Result<Vec<EmailRecord>> {
    let mut session = ImapMailbox::open(creds, mode).await?;
    retrieve_and_close(&mut session, criteria).await
}

/// Run the retrieval loop, then close the session whatever the outcome.
pub(crate) async fn retrieve_and_close<S: MailboxSession>(
    session: &mut S,
    criteria: &SearchCriteria,
) -> Result<Vec<EmailRecord>> {
    let outcome = retrieve(session, criteria).await;
    session.close().await;
    outcome
}

/// The retrieval loop proper, generic over the session seam.
pub(crate) async fn retrieve<S: MailboxSession>(
    session: &mut S,
    criteria: &SearchCriteria,
) -> Result<Vec<EmailRecord>> {
    session.select_inbox().await?;

    let ids = session.search(&criteria.query()).await?;
    let ids = criteria.select_ids(ids);
    let want_sent_at = criteria.wants_sent_at();

    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        let raw = match session.fetch_raw(id).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping message {}: {}", id, e);
                continue;
            }
        };
        let record = normalize(&raw.identifier, &raw.bytes, want_sent_at);
        if criteria.accepts(&record) {
            records.push(record);
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use mailgate_common::Error;
    use std::collections::HashMap;

    use crate::imap::session::RawMessage;

    /// In-memory stand-in for a live IMAP session.
    struct FakeSession {
        ids: Vec<u32>,
        messages: HashMap<u32, Vec<u8>>,
        failing: Vec<u32>,
        select_fails: bool,
        closes: u32,
    }

    impl FakeSession {
        fn with_messages(messages: Vec<(u32, Vec<u8>)>) -> Self {
            let ids = messages.iter().map(|(id, _)| *id).collect();
            Self {
                ids,
                messages: messages.into_iter().collect(),
                failing: Vec::new(),
                select_fails: false,
                closes: 0,
            }
        }
    }

    #[async_trait]
    impl MailboxSession for FakeSession {
        async fn select_inbox(&mut self) -> Result<()> {
            if self.select_fails {
                return Err(Error::Select("INBOX gone".to_string()));
            }
            Ok(())
        }

        async fn search(&mut self, _query: &str) -> Result<Vec<u32>> {
            Ok(self.ids.clone())
        }

        async fn fetch_raw(&mut self, id: u32) -> Result<RawMessage> {
            if self.failing.contains(&id) {
                return Err(Error::Fetch {
                    id: id.to_string(),
                    reason: "server said NO".to_string(),
                });
            }
            Ok(RawMessage {
                identifier: id.to_string(),
                bytes: self.messages[&id].clone(),
            })
        }

        async fn close(&mut self) {
            self.closes += 1;
        }
    }

    fn plain_message(subject: &str) -> Vec<u8> {
        format!(
            "From: a@example.com\r\nSubject: {subject}\r\n\r\nbody of {subject}\r\n"
        )
        .into_bytes()
    }

    fn dated_message(date: chrono::DateTime<Utc>) -> Vec<u8> {
        format!(
            "From: a@example.com\r\nSubject: s\r\nDate: {}\r\n\r\nx\r\n",
            date.format("%a, %d %b %Y %H:%M:%S +0000")
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn test_retrieves_all_in_identifier_order() {
        let mut session = FakeSession::with_messages(vec![
            (1, plain_message("one")),
            (2, plain_message("two")),
            (3, plain_message("three")),
        ]);
        let records = retrieve(&mut session, &SearchCriteria::All).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(records[0].subject, "one");
        assert_eq!(records[0].body, "body of one\r\n");
    }

    #[tokio::test]
    async fn test_one_fetch_failure_skips_only_that_message() {
        let mut session = FakeSession::with_messages(
            (1..=5).map(|id| (id, plain_message("m"))).collect(),
        );
        session.failing = vec![3];

        let records = retrieve(&mut session, &SearchCriteria::All).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4", "5"]);
    }

    #[tokio::test]
    async fn test_select_failure_is_fatal() {
        let mut session = FakeSession::with_messages(vec![(1, plain_message("m"))]);
        session.select_fails = true;
        let err = retrieve(&mut session, &SearchCriteria::All).await.unwrap_err();
        assert_eq!(err.code(), "SELECT_ERROR");
    }

    #[tokio::test]
    async fn test_session_closed_once_after_fatal_error() {
        let mut session = FakeSession::with_messages(vec![(1, plain_message("m"))]);
        session.select_fails = true;
        let err = retrieve_and_close(&mut session, &SearchCriteria::All)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SELECT_ERROR");
        assert_eq!(session.closes, 1);
    }

    #[tokio::test]
    async fn test_session_closed_once_on_success() {
        let mut session = FakeSession::with_messages(vec![(1, plain_message("m"))]);
        let records = retrieve_and_close(&mut session, &SearchCriteria::All)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(session.closes, 1);
    }

    #[tokio::test]
    async fn test_since_id_narrows_before_fetch() {
        let mut session = FakeSession::with_messages(
            (3..=7).map(|id| (id, plain_message("m"))).collect(),
        );
        let records = retrieve(&mut session, &SearchCriteria::SinceId(5))
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["6", "7"]);
    }

    #[tokio::test]
    async fn test_since_instant_filters_after_normalize() {
        let t = Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap();
        let mut session = FakeSession::with_messages(vec![
            (1, dated_message(t - Duration::hours(1))),
            (2, dated_message(t)),
            (3, dated_message(t + Duration::hours(1))),
        ]);
        let records = retrieve(&mut session, &SearchCriteria::SinceInstant(t))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "3");
        assert_eq!(records[0].sent_at, Some(t + Duration::hours(1)));
    }
}
