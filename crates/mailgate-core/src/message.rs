//! Normalization of raw RFC 822 bytes into a stable [`EmailRecord`].

use chrono::DateTime;
use mailparse::MailHeaderMap;
use tracing::warn;

use mailgate_common::types::EmailRecord;

use crate::mime::{decode_header, extract_plain_text};

/// Normalize one raw message into an immutable record.
///
/// Total function: header decoding degrades instead of failing, a
/// missing or malformed Date header yields `sent_at: None`, and a byte
/// sequence the MIME parser rejects outright degrades to a record whose
/// body is the lossy UTF-8 text of the raw bytes.
///
/// `want_sent_at` controls whether the Date header is parsed at all; the
/// orchestrator requests it only when the criteria need sub-day
/// comparison.
pub fn normalize(identifier: &str, raw: &[u8], want_sent_at: bool) -> EmailRecord {
    let mail = match mailparse::parse_mail(raw) {
        Ok(mail) => mail,
        Err(e) => {
            warn!(id = identifier, "unparsable message, degrading to raw text: {}", e);
            return EmailRecord {
                id: identifier.to_string(),
                sender: String::new(),
                subject: String::new(),
                body: String::from_utf8_lossy(raw).into_owned(),
                sent_at: None,
            };
        }
    };

    let sender = decode_header(&raw_header(&mail, "From"));
    let subject = decode_header(&raw_header(&mail, "Subject"));
    let body = extract_plain_text(&mail);

    let sent_at = if want_sent_at {
        mail.headers
            .get_first_value("Date")
            .and_then(|value| mailparse::dateparse(&value).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    } else {
        None
    };

    EmailRecord {
        id: identifier.to_string(),
        sender,
        subject,
        body,
        sent_at,
    }
}

/// Raw (undecoded) header value, so encoded words reach our own decoder
/// instead of the parser's.
fn raw_header(mail: &mailparse::ParsedMail, key: &str) -> String {
    mail.headers
        .get_first_header(key)
        .map(|h| String::from_utf8_lossy(h.get_value_raw()).trim().to_string())
        .unwrap_or_default()
}
