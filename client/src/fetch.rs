use reqwest::{
    header,
    Client,
    Method,
    StatusCode,
};
use serde::de::DeserializeOwned;

/// Failure of a single HTTP call.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("http status {status} for url {url}")]
    Status { status: StatusCode, url: String },
    #[error("unexpected content-type {content_type:?} for url {url}")]
    UnsupportedContentType { content_type: String, url: String },
    #[error("failed to decode JSON response from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode XML response from {url}: {source}")]
    Xml {
        url: String,
        #[source]
        source: quick_xml::DeError,
    },
}

/// Sends a single HTTP request and decodes the response body as JSON or XML,
/// depending on the content type the server declares. Plex speaks JSON on
/// every endpoint except the plex.tv resource listing, which is XML only.
pub async fn fetch<T: DeserializeOwned>(
    client: &Client,
    method: Method,
    url: &str,
    headers: header::HeaderMap,
) -> Result<T, FetchError> {
    let response = client
        .request(method, url)
        .headers(headers)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            status,
            url: url.to_string(),
        });
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(media_type)
        .unwrap_or_default();

    let body = response.bytes().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    match content_type.as_str() {
        "application/json" => serde_json::from_slice(&body).map_err(|source| FetchError::Json {
            url: url.to_string(),
            source,
        }),
        "application/xml" => quick_xml::de::from_reader(body.as_ref()).map_err(|source| FetchError::Xml {
            url: url.to_string(),
            source,
        }),
        _ => Err(FetchError::UnsupportedContentType {
            content_type,
            url: url.to_string(),
        }),
    }
}

/// Media type of a content-type header value, with parameters stripped.
fn media_type(value: &str) -> String {
    value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}
