//! Server resolution: pick the Kroki root an item is rendered against.

use crate::error::ItemError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root of the public Kroki service.
pub const PUBLIC_KROKI_URL: &str = "https://kroki.io";

/// Which Kroki deployment renders an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KrokiServer {
    /// The public service at kroki.io.
    #[default]
    Public,
    /// A self-hosted server given by `customServerUrl`.
    Custom,
}

impl fmt::Display for KrokiServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KrokiServer::Public => f.write_str("public"),
            KrokiServer::Custom => f.write_str("custom"),
        }
    }
}

impl FromStr for KrokiServer {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "public" => Ok(KrokiServer::Public),
            "custom" => Ok(KrokiServer::Custom),
            other => Err(ItemError::validation(format!(
                "Unknown Kroki server option '{other}' (expected 'public' or 'custom')"
            ))),
        }
    }
}

/// Effective base URL for a server choice.
///
/// The custom URL is expected to be validated already. It is used as
/// supplied except that a single trailing slash is removed, so the path join
/// never produces `//`.
pub fn resolve_base_url(server: KrokiServer, custom_url: &str) -> String {
    match server {
        KrokiServer::Public => PUBLIC_KROKI_URL.to_string(),
        KrokiServer::Custom => custom_url
            .strip_suffix('/')
            .unwrap_or(custom_url)
            .to_string(),
    }
}
