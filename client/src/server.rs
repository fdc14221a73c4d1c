use crate::{
    api::{
        LibraryResponse,
        SectionResponse,
        ServerInfoResponse,
        SessionList,
    },
    fetch::{
        fetch,
        FetchError,
    },
};
use plex_exporter_config::PlexServerConfig;
use reqwest::{
    header::{
        self,
        HeaderMap,
        HeaderValue,
        InvalidHeaderValue,
    },
    Method,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const SERVER_INFO_URI: &str = "/media/providers";
const STATUS_URI: &str = "/status/sessions";
const LIBRARY_URI: &str = "/library/sections";

pub(crate) const TOKEN_HEADER: &str = "x-plex-token";
const CONTAINER_START_HEADER: &str = "x-plex-container-start";
const CONTAINER_SIZE_HEADER: &str = "x-plex-container-size";

/// Timeout applied to every request sent to a Plex server or to plex.tv.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure to establish a connection to a Plex server. The endpoint is
/// dropped by the caller; other servers are unaffected.
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid authentication token")]
    InvalidToken(#[from] InvalidHeaderValue),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("server probe failed: {0}")]
    Probe(#[from] FetchError),
}

/// One Plex Media Server endpoint, with its identity resolved by a probe
/// request at connection time and frozen for the connection's lifetime.
#[derive(Debug)]
pub struct PlexServer {
    id: String,
    name: String,
    version: String,
    platform: String,
    base_url: String,
    http_client: reqwest::Client,
    headers: HeaderMap,
}

/// Identification headers sent with every request, as Plex expects them.
pub(crate) fn default_headers() -> HeaderMap {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(concat!("plex_exporter/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert("x-plex-product", HeaderValue::from_static("Plex Exporter"));
    headers.insert("x-plex-device-name", HeaderValue::from_static("Plex Exporter"));
    headers.insert("x-plex-version", HeaderValue::from_static(VERSION));
    headers.insert(
        "x-plex-client-identifier",
        HeaderValue::from_static(concat!("plex-exporter-v", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert("x-plex-platform", HeaderValue::from_static(std::env::consts::OS));
    headers.insert("x-plex-device", HeaderValue::from_static(std::env::consts::OS));
    headers
}

impl PlexServer {
    /// Connects to the configured endpoint. Builds the HTTP client, probes
    /// the server identity once and freezes it. The per-server token takes
    /// precedence over the shared fallback token.
    pub async fn connect(config: &PlexServerConfig, fallback_token: Option<&str>) -> Result<Self, ConnectError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ConnectError::InvalidBaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        let base_url = base_url.as_str().trim_end_matches('/').to_string();

        let mut headers = default_headers();
        if let Some(token) = config.token.as_deref().or(fallback_token) {
            headers.insert(TOKEN_HEADER, HeaderValue::from_str(token)?);
        }

        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        let mut server = Self {
            id: String::new(),
            name: String::new(),
            version: String::new(),
            platform: String::new(),
            base_url,
            http_client,
            headers,
        };

        let probe = server.server_info().await?;
        server.id = probe.media_container.id;
        server.name = probe.media_container.name;
        server.version = probe.media_container.version;
        server.platform = probe.media_container.platform;
        debug!(name = %server.name, id = %server.id, "connected to plex server");

        Ok(server)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn server_info(&self) -> Result<ServerInfoResponse, FetchError> {
        self.get(format!("{}{SERVER_INFO_URI}", self.base_url)).await
    }

    pub async fn session_status(&self) -> Result<SessionList, FetchError> {
        self.get(format!("{}{STATUS_URI}", self.base_url)).await
    }

    pub async fn library(&self) -> Result<LibraryResponse, FetchError> {
        self.get(format!("{}{LIBRARY_URI}", self.base_url)).await
    }

    /// Total item count of a library section. The container headers request
    /// zero items so only the reported total size crosses the wire.
    pub async fn section_size(&self, id: u32) -> Result<i64, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTAINER_START_HEADER, HeaderValue::from_static("0"));
        headers.insert(CONTAINER_SIZE_HEADER, HeaderValue::from_static("0"));

        let url = format!("{}{LIBRARY_URI}/{id}/all", self.base_url);
        let response: SectionResponse = self.get_with_headers(url, headers).await?;
        Ok(response.media_container.total_size)
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        fetch(&self.http_client, Method::GET, &url, self.headers.clone()).await
    }

    async fn get_with_headers<T: DeserializeOwned>(&self, url: String, extra: HeaderMap) -> Result<T, FetchError> {
        let mut headers = self.headers.clone();
        headers.extend(extra);
        fetch(&self.http_client, Method::GET, &url, headers).await
    }
}
