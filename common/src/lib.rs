//! Shared leaf types for the frame workspace.
//!
//! Everything in here is transport-agnostic: error location tracking,
//! HTTP status categorisation and a secret wrapper that never leaks
//! into logs. `frame-core` and `frame-monitor` both depend on it.

pub mod error;
pub mod http_status;
pub mod redacted_key;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_key::RedactedKey;

#[cfg(test)]
mod tests;
