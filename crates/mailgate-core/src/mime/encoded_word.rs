//! RFC 2047 encoded-word decoding for internationalized header values.

use base64::Engine;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;

// An encoded word is =?charset?encoding?payload?=. The character class is
// printable ASCII minus '?' and space, which also stops the greedy groups
// at the section delimiters. RFC 2047 caps encoded words at 75 characters,
// but real agents emit longer ones and Thunderbird accepts them, so no
// length limit is enforced here.
static ENCODED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=\?([!->@-~]*)\?([!->@-~]*)\?([!->@-~]*)\?=").unwrap());

/// Decode a raw header value that may interleave RFC 2047 encoded words
/// with plain ASCII text.
///
/// Total function: fragments that cannot be decoded are either passed
/// through verbatim (unrecognized transfer encoding) or lossy-decoded with
/// replacement characters (unrecognized charset or invalid byte
/// sequences). Plain input without encoded-word markers comes back
/// unchanged. Whitespace between two adjacent encoded words is deleted,
/// as the RFC requires; all other whitespace is preserved.
pub fn decode_header(raw: &str) -> String {
    let mut out = String::new();
    let mut last_end = 0;
    let mut prev_was_encoded = false;

    for caps in ENCODED_WORD.captures_iter(raw) {
        let whole = caps.get(0).expect("group 0 always present");
        let gap = &raw[last_end..whole.start()];

        let decoded = decode_word(
            caps.get(1).map_or("", |m| m.as_str()),
            caps.get(2).map_or("", |m| m.as_str()),
            caps.get(3).map_or("", |m| m.as_str()),
        );

        let drop_gap = prev_was_encoded
            && decoded.is_some()
            && !gap.is_empty()
            && gap.bytes().all(|b| b == b' ' || b == b'\t' || b == b'\r' || b == b'\n');
        if !drop_gap {
            out.push_str(gap);
        }

        match decoded {
            Some(text) => {
                out.push_str(&text);
                prev_was_encoded = true;
            }
            None => {
                out.push_str(whole.as_str());
                prev_was_encoded = false;
            }
        }
        last_end = whole.end();
    }

    out.push_str(&raw[last_end..]);
    out
}

/// Decode one encoded word. `None` means the transfer encoding was not
/// B or Q and the original text should be kept.
fn decode_word(charset: &str, transfer: &str, payload: &str) -> Option<String> {
    let bytes = match transfer {
        "b" | "B" => base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap_or_else(|_| payload.as_bytes().to_vec()),
        // In Q encoding an underscore stands for ASCII space regardless of
        // the declared charset.
        "q" | "Q" => qp_decode(payload.replace('_', " ").as_bytes()),
        _ => return None,
    };
    Some(decode_charset(charset, &bytes))
}

/// Charset decode that never fails: unknown labels and undecodable byte
/// sequences degrade to replacement characters.
fn decode_charset(label: &str, bytes: &[u8]) -> String {
    let label = if label.is_empty() { "utf-8" } else { label };
    match Encoding::for_label_no_replacement(label.as_bytes()) {
        Some(enc) => enc.decode_with_bom_removal(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Quoted-printable decode for encoded-word payloads. Malformed escapes
/// are passed through as literal bytes.
fn qp_decode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'=' && i + 3 <= input.len() {
            if let Ok(hex) = std::str::from_utf8(&input[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii_is_unchanged() {
        assert_eq!(decode_header("hello world"), "hello world");
        assert_eq!(decode_header(""), "");
        assert_eq!(decode_header("question? yes"), "question? yes");
    }

    #[test]
    fn test_rfc2047_examples() {
        // Examples from RFC 2047
        assert_eq!(decode_header("=?US-ASCII?Q?Keith_Moore?="), "Keith Moore");
        assert_eq!(
            decode_header("=?ISO-8859-1?Q?Keld_J=F8rn_Simonsen?="),
            "Keld Jørn Simonsen"
        );
        assert_eq!(decode_header("=?ISO-8859-1?Q?Andr=E9?="), "André");
        assert_eq!(
            decode_header("=?ISO-8859-1?B?SWYgeW91IGNhbiByZWFkIHRoaXMgeW8=?="),
            "If you can read this yo"
        );
        assert_eq!(
            decode_header("=?iso-8859-8?b?7eXs+SDv4SDp7Oj08A==?="),
            "םולש ןב ילטפנ"
        );
    }

    #[test]
    fn test_interleaved_plain_and_encoded() {
        assert_eq!(
            decode_header("Re: =?utf-8?B?aMOpbGxv?= world"),
            "Re: héllo world"
        );
    }

    #[test]
    fn test_whitespace_between_encoded_words_is_deleted() {
        assert_eq!(
            decode_header("=?ISO-8859-1?Q?a?= =?ISO-8859-1?Q?b?="),
            "ab"
        );
        // ... but kept between an encoded word and plain text
        assert_eq!(decode_header("=?ISO-8859-1?Q?a?= b"), "a b");
    }

    #[test]
    fn test_unknown_charset_degrades_lossily() {
        // Valid UTF-8 payload under a bogus charset label still decodes
        let decoded = decode_header("=?bogus-charset?B?aGVsbG8=?=");
        assert_eq!(decoded, "hello");

        // Invalid bytes produce replacement characters, never a failure
        let decoded = decode_header("=?utf-8?B?/w==?=");
        assert!(decoded.contains('\u{FFFD}'));
    }

    #[test]
    fn test_unknown_transfer_encoding_kept_verbatim() {
        let raw = "=?utf-8?X?abc?=";
        assert_eq!(decode_header(raw), raw);
    }

    #[test]
    fn test_empty_charset_defaults_to_utf8() {
        assert_eq!(decode_header("=??B?aMOpbGxv?="), "héllo");
    }
}
