//! OAuth 2.0 authorization-code redemption
//!
//! - Client credentials loaded fail-fast from the environment
//! - Token endpoint client (form-encoded POST, no retries)
//! - Secret redaction for anything that may reach a caller or a log

mod client;
mod credentials;

pub use client::{GRANT_TYPE_AUTHORIZATION_CODE, TokenClient, TokenEndpoint, TokenPayload};
pub use credentials::{Credentials, REDACTED};
