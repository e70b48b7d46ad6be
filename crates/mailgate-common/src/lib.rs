//! Common types and utilities for Mailgate

pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
