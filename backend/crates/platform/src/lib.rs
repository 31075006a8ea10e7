//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Client identification for admission keys
//! - Per-client admission control (cooldown + sliding window)
//! - Upload validation (magic bytes)
//! - Base64 / data URL decoding
//! - Display formatting helpers

pub mod client;
pub mod encoding;
pub mod format;
pub mod rate_limit;
pub mod validate;
