//! Outbound SMTP submission.

pub mod outbound;
