use crate::collector::PlexCollector;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::future::join_all;
use plex_exporter_client::PlexServer;
use prometheus::{
    proto::MetricFamily,
    Registry,
    TextEncoder,
};
use std::{
    collections::{
        btree_map::Entry,
        BTreeMap,
    },
    sync::Arc,
};
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum ExporterError {
    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Owns the per-server collectors and the exposition endpoint.
pub struct Exporter {
    collectors: Vec<PlexCollector>,
    process: Registry,
}

impl Exporter {
    pub fn new(servers: Vec<PlexServer>) -> Result<Self, ExporterError> {
        let collectors = servers
            .into_iter()
            .map(|server| PlexCollector::new(Arc::new(server)))
            .collect::<Result<_, _>>()?;

        // Resource metrics of the exporter process itself. The collector
        // only exists on Linux.
        let process = Registry::new();
        #[cfg(target_os = "linux")]
        process.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self { collectors, process })
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/metrics", get(metrics))
            .route("/healthz", get(healthz))
            .with_state(self)
    }

    /// Binds the listener and serves until ctrl-c. A failure to bind is the
    /// one fatal startup error.
    pub async fn serve(self, address: &str) -> Result<(), ExporterError> {
        let listener = TcpListener::bind(address).await.map_err(|source| ExporterError::Bind {
            address: address.to_string(),
            source,
        })?;
        info!("beginning to serve on {}", listener.local_addr()?);

        axum::serve(listener, Arc::new(self).router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "could not listen for the shutdown signal");
    }
}

/// One scrape. Every server collects concurrently, then all per-server
/// registries plus the process metrics are encoded into one exposition body.
/// A server whose extraction failed contributes no samples; the scrape
/// itself still succeeds.
async fn metrics(State(exporter): State<Arc<Exporter>>) -> impl IntoResponse {
    join_all(exporter.collectors.iter().map(|collector| collector.collect())).await;

    let mut families = Vec::new();
    for collector in &exporter.collectors {
        families.extend(collector.gather());
    }
    families.extend(exporter.process.gather());

    match TextEncoder::new().encode_to_string(&merge_families(families)) {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => {
            error!(%err, "could not encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "OK"
}

/// Folds same-named families from different server registries into one, so
/// each family appears exactly once in the exposition output.
fn merge_families(families: Vec<MetricFamily>) -> Vec<MetricFamily> {
    let mut merged = BTreeMap::<String, MetricFamily>::new();
    for mut family in families {
        match merged.entry(family.get_name().to_string()) {
            Entry::Occupied(mut existing) => {
                for metric in family.take_metric().into_iter() {
                    existing.get_mut().mut_metric().push(metric);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(family);
            }
        }
    }
    merged.into_values().collect()
}
