//! Glue for the plex.tv cloud endpoints: PIN pairing and server discovery.

use crate::{
    api::DeviceList,
    fetch::{
        fetch,
        FetchError,
    },
    server::{
        default_headers,
        PlexServer,
        REQUEST_TIMEOUT,
        TOKEN_HEADER,
    },
};
use chrono::{
    DateTime,
    Utc,
};
use plex_exporter_config::PlexServerConfig;
use reqwest::{
    header::{
        self,
        HeaderValue,
        InvalidHeaderValue,
    },
    Method,
};
use serde::Deserialize;

const PINS_URL: &str = "https://plex.tv/pins";
const RESOURCES_URL: &str = "https://plex.tv/api/resources?includeHttps=1";

#[derive(thiserror::Error, Debug)]
pub enum PlexTvError {
    #[error("pin not authorised")]
    PinNotAuthorised,
    #[error("pin expired")]
    PinExpired,
    #[error("invalid authentication token")]
    InvalidToken(#[from] InvalidHeaderValue),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, Deserialize)]
struct PinResponse {
    pin: Pin,
}

/// A pairing PIN created on plex.tv. The user enters `code` at
/// <https://plex.tv/pin>; once they do, polling the pin yields the token.
#[derive(Debug, Clone, Deserialize)]
pub struct Pin {
    pub id: i64,
    pub code: String,
    #[serde(rename = "expires_at")]
    pub expiry: DateTime<Utc>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn plextv_client() -> Result<reqwest::Client, PlexTvError> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Creates a new pairing PIN.
pub async fn request_pin() -> Result<Pin, PlexTvError> {
    let client = plextv_client()?;
    let response: PinResponse = fetch(&client, Method::POST, PINS_URL, default_headers()).await?;
    Ok(response.pin)
}

/// Polls a pairing PIN. Yields the access token once the user has entered
/// the code, `PinNotAuthorised` until then.
pub async fn token_from_pin(id: i64) -> Result<String, PlexTvError> {
    let client = plextv_client()?;
    let url = format!("{PINS_URL}/{id}");
    let response: PinResponse = fetch(&client, Method::GET, &url, default_headers()).await?;
    match response.pin.auth_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(PlexTvError::PinNotAuthorised),
    }
}

/// Discovers the account's owned servers from plex.tv and connects to each.
/// For every server the first working advertised connection wins; a server
/// with no working connection is skipped.
pub async fn discover_servers(token: &str) -> Result<Vec<PlexServer>, PlexTvError> {
    let client = plextv_client()?;

    let mut headers = default_headers();
    // The resources endpoint only supports XML. Ask for it explicitly so a
    // future JSON-capable version of the endpoint keeps answering in XML.
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/xml"));
    headers.insert(TOKEN_HEADER, HeaderValue::from_str(token)?);

    let device_list: DeviceList = fetch(&client, Method::GET, RESOURCES_URL, headers).await?;

    let mut servers = Vec::new();
    for device in device_list.devices {
        if !device.is_owned_server() {
            continue;
        }

        let mut connected = None;
        for connection in &device.connections {
            let config = PlexServerConfig {
                base_url: connection.uri.clone(),
                token: Some(device.access_token.clone()),
                insecure: false,
            };
            match PlexServer::connect(&config, None).await {
                Ok(server) => {
                    connected = Some(server);
                    break;
                }
                Err(err) => {
                    debug!(device = %device.name, uri = %connection.uri, %err, "discovered connection failed");
                }
            }
        }

        match connected {
            Some(server) => servers.push(server),
            None => warn!(device = %device.name, "no working connection, skipping discovered server"),
        }
    }

    Ok(servers)
}
