//! # Core Module
//!
//! Configuration, message size limits and time handling shared by both bots.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Telegram limits, facility time helpers
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod response;
pub mod time;

pub use config::Config;
pub use response::{
    chunk_for_message, chunk_text, truncate_response, MAX_RESPONSE_LENGTH, MESSAGE_LIMIT,
};
pub use time::{format_local, local_now, parse_api_timestamp, TimeRange};
