//! Connection settings for a `HashicupsClient`.

use std::env;

/// Host used when `HASHICUPS_HOST` is unset.
pub const DEFAULT_HOST: &str = "http://localhost:19090";

pub const HOST_ENV: &str = "HASHICUPS_HOST";
pub const TOKEN_ENV: &str = "HASHICUPS_TOKEN";

/// Base URL plus the optional token sent as the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read `HASHICUPS_HOST` and `HASHICUPS_TOKEN`. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup(HOST_ENV)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let config = Self::new(&host);
        match lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
            Some(token) => config.with_token(token),
            None => config,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}
