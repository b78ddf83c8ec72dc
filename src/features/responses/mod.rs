//! # Responses Feature
//!
//! Templated chat text for tasks, activities and residents.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod formatter;

pub use formatter::{escape_markdown, templates, ResponseFormatter};
