//! Provider credentials kept out of logs.
//!
//! API keys are wrapped in `secrecy` so `Debug` and `Display` never print
//! them, including inside configuration structs that derive `Debug`.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;
use std::time::Duration;

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// Expose the secret value. Only call this when building a request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Credentials for the generative fallback provider.
#[derive(Clone)]
pub struct GenerativeCredentials {
    pub api_key: SecretString,

    /// Custom endpoint (gateway, proxy); provider default when `None`
    pub base_url: Option<String>,

    /// Transport-level bound on a whole request
    pub request_timeout: Option<Duration>,
}

impl GenerativeCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            base_url: None,
            request_timeout: None,
        }
    }

    /// Read `OPENAI_API_KEY`, falling back to the legacy `OPEN_AI`.
    ///
    /// Returns `None` when neither is set to a non-blank value.
    pub fn from_env() -> Option<Self> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("OPEN_AI").ok())
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for GenerativeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeCredentials")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug_or_display() {
        let secret = SecretString::new("sk-proj-abc123");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose(), "sk-proj-abc123");
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let creds = GenerativeCredentials::new("sk-proj-abc123")
            .with_base_url("https://gateway.internal/v1");
        let debug = format!("{:?}", creds);

        assert!(!debug.contains("sk-proj"));
        assert!(debug.contains("gateway.internal"));
    }

    #[test]
    fn test_blank_secret() {
        assert!(SecretString::new("  ").is_empty());
        assert!(!SecretString::from("sk-1").is_empty());
    }
}
