//! Charset-safe extraction of a plain-text body from a MIME part tree.

use encoding_rs::Encoding;
use mailparse::ParsedMail;
use tracing::debug;

/// Extract a best-effort plain-text body from a parsed message.
///
/// A single-part message is the body candidate regardless of its declared
/// type. A multipart message contributes every `text/plain` leaf, in
/// depth-first order, concatenated with no separator: a message that
/// carries an alternative part plus an inline signature yields both.
/// Messages with no plain-text leaf yield the empty string. Total
/// function: undecodable parts degrade through the Latin-1 fallback,
/// unreadable containers are skipped.
pub fn extract_plain_text(mail: &ParsedMail) -> String {
    let mut out = String::new();
    if mail.subparts.is_empty() {
        // A multipart container that parsed to no subparts has no leaf
        // content to offer; its raw payload is not a body.
        if !is_multipart(mail) {
            append_part(mail, &mut out);
        }
    } else {
        collect_leaves(mail, &mut out);
    }
    out
}

fn is_multipart(part: &ParsedMail) -> bool {
    part.ctype
        .mimetype
        .get(..10)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("multipart/"))
}

fn collect_leaves(part: &ParsedMail, out: &mut String) {
    if part.subparts.is_empty() {
        if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
            append_part(part, out);
        }
    } else {
        for sub in &part.subparts {
            collect_leaves(sub, out);
        }
    }
}

fn append_part(part: &ParsedMail, out: &mut String) {
    // get_body_raw undoes the transfer encoding (base64, quoted-printable)
    // but leaves charset interpretation to us.
    let raw = match part.get_body_raw() {
        Ok(raw) => raw,
        Err(e) => {
            debug!("skipping undecodable part ({}): {}", part.ctype.mimetype, e);
            return;
        }
    };
    if raw.is_empty() {
        return;
    }
    out.push_str(&decode_text(&raw, declared_charset(part)));
}

/// The charset declared on the part, if any. mailparse substitutes
/// us-ascii when the header carries no charset parameter; treat that
/// default as "absent" so the UTF-8-first path applies (strict UTF-8
/// accepts all genuine ASCII anyway).
fn declared_charset<'a>(part: &'a ParsedMail) -> Option<&'a str> {
    let declared = part.ctype.charset.as_str();
    if declared.is_empty() || declared.eq_ignore_ascii_case("us-ascii") {
        None
    } else {
        Some(declared)
    }
}

/// Two-step charset decode: strict decode with the declared charset
/// (UTF-8 when none is declared), then a Latin-1 fallback that maps every
/// byte to its code point and therefore cannot fail.
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let label = charset.unwrap_or("utf-8");
    if let Some(enc) = Encoding::for_label_no_replacement(label.as_bytes()) {
        if let Some(text) = enc.decode_without_bom_handling_and_without_replacement(bytes) {
            return text.into_owned();
        }
    }
    debug!("charset {:?} failed, falling back to latin-1", label);
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailparse::parse_mail;

    #[test]
    fn test_single_part_body() {
        let raw = b"From: a@example.com\r\n\
                    Subject: hi\r\n\
                    \r\n\
                    plain body\r\n";
        let mail = parse_mail(raw).unwrap();
        assert_eq!(extract_plain_text(&mail), "plain body\r\n");
    }

    #[test]
    fn test_multipart_concatenates_all_plain_leaves() {
        let raw = b"From: a@example.com\r\n\
                    Content-Type: multipart/mixed; boundary=\"b\"\r\n\
                    \r\n\
                    --b\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    A\r\n\
                    --b\r\n\
                    Content-Type: text/html\r\n\
                    \r\n\
                    <p>ignored</p>\r\n\
                    --b\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    B\r\n\
                    --b--\r\n";
        let mail = parse_mail(raw).unwrap();
        assert_eq!(extract_plain_text(&mail), "AB");
    }

    #[test]
    fn test_nested_multipart_depth_first() {
        let raw = b"Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
                    \r\n\
                    --outer\r\n\
                    Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
                    \r\n\
                    --inner\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    first\r\n\
                    --inner--\r\n\
                    --outer\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    second\r\n\
                    --outer--\r\n";
        let mail = parse_mail(raw).unwrap();
        assert_eq!(extract_plain_text(&mail), "firstsecond");
    }

    #[test]
    fn test_no_plain_leaf_yields_empty_body() {
        let raw = b"Content-Type: multipart/mixed; boundary=\"b\"\r\n\
                    \r\n\
                    --b\r\n\
                    Content-Type: text/html\r\n\
                    \r\n\
                    <p>html only</p>\r\n\
                    --b--\r\n";
        let mail = parse_mail(raw).unwrap();
        assert_eq!(extract_plain_text(&mail), "");
    }

    #[test]
    fn test_multipart_without_parsable_parts_is_skipped() {
        // Declared multipart, but the boundary never appears
        let raw = b"Content-Type: multipart/mixed; boundary=\"nope\"\r\n\
                    \r\n\
                    stray payload\r\n";
        let mail = parse_mail(raw).unwrap();
        assert_eq!(extract_plain_text(&mail), "");
    }

    #[test]
    fn test_bogus_charset_falls_back_to_latin1() {
        let raw = b"Content-Type: text/plain; charset=bogus-charset\r\n\
                    \r\n\
                    caf\xe9\r\n";
        let mail = parse_mail(raw).unwrap();
        // 0xE9 decoded as Latin-1 is e-acute; extraction must not fail
        assert_eq!(extract_plain_text(&mail), "café\r\n");
    }

    #[test]
    fn test_invalid_bytes_for_declared_charset_fall_back() {
        // 0xFF is never valid UTF-8
        assert_eq!(decode_text(&[0x61, 0xFF], Some("utf-8")), "a\u{FF}");
    }

    #[test]
    fn test_declared_charset_is_honored() {
        assert_eq!(decode_text(&[0x63, 0x61, 0x66, 0xE9], Some("iso-8859-1")), "café");
        assert_eq!(decode_text("café".as_bytes(), None), "café");
    }
}
