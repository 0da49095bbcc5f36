//! Client configuration

use crate::error::{DvidError, Result};
use std::time::Duration;

/// Default prefix of every REST path
pub const DEFAULT_API_ROOT: &str = "/api";

/// Settings shared by the volume client and the administrative queries
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Prefix of every REST path, e.g. `/api`
    pub api_root: String,
    /// URL scheme used when the hostname doesn't carry one
    pub scheme: String,
    pub user_agent: String,
    pub connect_timeout: Option<Duration>,
    /// Upper bound on one request/response cycle. `None` lets a call block
    /// for as long as the server takes.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            scheme: "http".to_string(),
            user_agent: format!("dvid-volume/{}", crate::DVID_VOLUME_VERSION),
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the REST path prefix
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// Set the URL scheme
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Bound every request/response cycle.
    ///
    /// A call that times out surfaces as [`DvidError::Connection`] and leaves
    /// the client's connection in an unknown state.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Check the settings for values the server could never accept
    pub fn validate(&self) -> Result<()> {
        if !self.api_root.is_empty()
            && (!self.api_root.starts_with('/') || self.api_root.ends_with('/'))
        {
            return Err(DvidError::Configuration(format!(
                "api root must start with '/' and not end with one: {:?}",
                self.api_root
            )));
        }
        if self.scheme.is_empty() {
            return Err(DvidError::Configuration("empty URL scheme".to_string()));
        }
        Ok(())
    }

    /// Base URL for `hostname`, e.g. `http://localhost:8000`
    pub fn base_url(&self, hostname: &str) -> String {
        let hostname = hostname.trim_end_matches('/');
        if hostname.contains("://") {
            hostname.to_string()
        } else {
            format!("{}://{}", self.scheme, hostname)
        }
    }
}
