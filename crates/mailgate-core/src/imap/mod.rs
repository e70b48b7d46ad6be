//! IMAP client side of the pipeline: session lifecycle and search
//! criteria resolution.

pub mod criteria;
pub mod session;
