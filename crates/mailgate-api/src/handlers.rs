//! Request handlers

pub mod health;
pub mod read;
pub mod send;
