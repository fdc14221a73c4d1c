use serde::{
    Deserialize,
    Serialize,
};

/// One Plex Media Server endpoint to export metrics from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlexServerConfig {
    /// Base URL of the server, e.g. `https://plex.example.com:32400`.
    pub base_url: String,
    /// Authentication token for this server. Falls back to the shared
    /// top-level token when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Skip TLS certificate verification for this server.
    #[serde(default)]
    pub insecure: bool,
}

impl PlexServerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            insecure: false,
        }
    }
}
