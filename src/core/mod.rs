//! Core infrastructure: configuration, errors, shared helpers.

pub mod config;
pub mod error;
pub mod pattern;
