#[macro_use]
extern crate tracing;

pub mod api;
mod extract;
mod fetch;
mod metrics;
mod plextv;
mod server;

pub use extract::{
    ExtractError,
    PlexClient,
};
pub use fetch::{
    fetch,
    FetchError,
};
pub use metrics::{
    LibraryMetric,
    PlayerMetric,
    ServerSnapshot,
    SessionMetric,
};
pub use plextv::{
    discover_servers,
    request_pin,
    token_from_pin,
    Pin,
    PlexTvError,
};
pub use server::{
    ConnectError,
    PlexServer,
    REQUEST_TIMEOUT,
};
