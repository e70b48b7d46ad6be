//! Translation of request filters into IMAP search arguments and
//! post-fetch predicates.

use chrono::{DateTime, NaiveDate, Utc};

use mailgate_common::types::EmailRecord;

/// One retrieval request's message filter. Exactly one variant is active
/// per request.
///
/// The IMAP SEARCH primitive only reaches day granularity, so `SinceId`
/// and `SinceInstant` search broadly and narrow after the fetch, while
/// `SinceDate` and `LastN` lean on the server-side search and ordering
/// directly.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCriteria {
    All,
    /// Keep messages whose numeric identifier is strictly greater.
    SinceId(u32),
    /// Day-granularity server-side filter.
    SinceDate(NaiveDate),
    /// Server-side day filter plus a strict post-fetch instant filter.
    SinceInstant(DateTime<Utc>),
    /// Keep only the last `n` identifiers the server returned.
    LastN(usize),
}

impl SearchCriteria {
    /// The IMAP search expression over the full mailbox.
    pub fn query(&self) -> String {
        match self {
            SearchCriteria::All | SearchCriteria::SinceId(_) | SearchCriteria::LastN(_) => {
                "ALL".to_string()
            }
            SearchCriteria::SinceDate(date) => format!("SINCE {}", imap_date(*date)),
            SearchCriteria::SinceInstant(instant) => {
                format!("SINCE {}", imap_date(instant.date_naive()))
            }
        }
    }

    /// Narrow the ordered identifier sequence before any fetch happens.
    ///
    /// `SinceId` keeps strictly greater identifiers; `LastN` keeps the
    /// tail, or everything when `n` exceeds the mailbox size.
    pub fn select_ids(&self, ids: Vec<u32>) -> Vec<u32> {
        match self {
            SearchCriteria::SinceId(floor) => {
                ids.into_iter().filter(|id| id > floor).collect()
            }
            SearchCriteria::LastN(n) => {
                let skip = ids.len().saturating_sub(*n);
                ids.into_iter().skip(skip).collect()
            }
            _ => ids,
        }
    }

    /// Post-fetch predicate over normalized records.
    ///
    /// Only `SinceInstant` filters here: a record is kept when its
    /// `sent_at` is strictly after the requested instant. Records whose
    /// Date header did not parse cannot satisfy the comparison and are
    /// dropped.
    pub fn accepts(&self, record: &EmailRecord) -> bool {
        match self {
            SearchCriteria::SinceInstant(instant) => {
                record.sent_at.map_or(false, |sent| sent > *instant)
            }
            _ => true,
        }
    }

    /// Whether normalization needs to parse the Date header.
    pub fn wants_sent_at(&self) -> bool {
        matches!(self, SearchCriteria::SinceInstant(_))
    }
}

/// IMAP date-text: `dd-Mon-yyyy`, e.g. `05-Aug-2026`. The month name is
/// always English regardless of locale.
fn imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}
