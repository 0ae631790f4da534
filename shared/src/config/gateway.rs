//! Edge filter configuration

use serde::{Deserialize, Serialize};

use super::required;
use crate::errors::ConfigError;

/// Header carrying the authenticated subject to the next hop
pub const DEFAULT_IDENTITY_HEADER: &str = "X-Authenticated-Subject";

/// Edge authentication filter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Path prefixes that bypass token checks
    pub public_paths: Vec<String>,

    /// Header name used to propagate the authenticated subject
    #[serde(default = "default_identity_header")]
    pub identity_header: String,

    /// Base URL requests are forwarded to after passing the filter
    #[serde(default)]
    pub upstream_url: Option<String>,
}

impl GatewayConfig {
    /// Create a configuration with the given public prefixes and no upstream
    pub fn new<I, S>(public_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public_paths: public_paths.into_iter().map(Into::into).collect(),
            identity_header: default_identity_header(),
            upstream_url: None,
        }
    }

    /// Set the upstream base URL
    pub fn with_upstream(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = Some(url.into());
        self
    }

    /// Load from `GATEWAY_*` environment variables
    ///
    /// `GATEWAY_PUBLIC_PATHS` must be present; an empty value means every
    /// path is protected.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_paths = required(lookup, "GATEWAY_PUBLIC_PATHS")?;
        let public_paths = parse_public_paths(&raw_paths)?;

        let identity_header = lookup("GATEWAY_IDENTITY_HEADER")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(default_identity_header);
        if !identity_header
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ConfigError::invalid(
                "GATEWAY_IDENTITY_HEADER",
                "must be a valid header name",
            ));
        }

        let upstream_url = lookup("GATEWAY_UPSTREAM_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        if let Some(ref url) = upstream_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid(
                    "GATEWAY_UPSTREAM_URL",
                    "must start with http:// or https://",
                ));
            }
        }

        Ok(Self {
            public_paths,
            identity_header,
            upstream_url,
        })
    }
}

fn parse_public_paths(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with('/') {
                Ok(p.to_string())
            } else {
                Err(ConfigError::invalid(
                    "GATEWAY_PUBLIC_PATHS",
                    format!("prefix '{}' must start with '/'", p),
                ))
            }
        })
        .collect()
}

fn default_identity_header() -> String {
    DEFAULT_IDENTITY_HEADER.to_string()
}
