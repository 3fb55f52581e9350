//! `POST /token-exchange` request parsing

use serde_json::Value;

use crate::{Error, Result};

/// Message returned when the caller sends no usable code
pub const MISSING_CODE: &str = "Missing authorization code";

/// A validated exchange request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    code: String,
}

impl ExchangeRequest {
    /// Parse a request body.
    ///
    /// Form bodies (`application/x-www-form-urlencoded`) are read as such;
    /// anything else is read as JSON. An empty body, an unparseable body, a
    /// non-string `code` or an empty `code` all count as a missing code.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self> {
        let code = if is_form(content_type) {
            url::form_urlencoded::parse(body)
                .find(|(key, _)| key == "code")
                .map(|(_, value)| value.into_owned())
        } else {
            serde_json::from_slice::<Value>(body)
                .ok()
                .and_then(|value| value.get("code").and_then(Value::as_str).map(String::from))
        };

        match code {
            Some(code) if !code.is_empty() => Ok(Self { code }),
            _ => Err(Error::Validation(MISSING_CODE.to_string())),
        }
    }

    /// Authorization code to redeem
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}
