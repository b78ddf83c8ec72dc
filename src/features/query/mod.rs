//! # Query Feature
//!
//! Natural-language staff queries: intent, time range and filters.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Anchored resident-name patterns, plural "residents" lists everyone
//! - 1.0.0: Initial release

pub mod parser;

pub use parser::{Intent, ParsedQuery, QueryFilters, QueryParser};
