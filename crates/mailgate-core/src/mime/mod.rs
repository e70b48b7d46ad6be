//! MIME decoding: RFC 2047 encoded-word headers and charset-safe bodies.

pub mod body;
pub mod encoded_word;

pub use body::extract_plain_text;
pub use encoded_word::decode_header;
