use crate::{
    fetch::FetchError,
    metrics::{
        LibraryMetric,
        PlayerMetric,
        ServerSnapshot,
        SessionMetric,
    },
    server::PlexServer,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument as _;

/// Failure of one branch of an extraction cycle. The snapshot returned
/// alongside it is partial, not invalid.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("failed to get server info: {0}")]
    Info(#[source] FetchError),
    #[error("could not get session status: {0}")]
    Sessions(#[source] FetchError),
    #[error("could not get library: {0}")]
    Library(#[source] FetchError),
    #[error("section id {id:?} is not an integer")]
    SectionId { id: String },
    #[error("could not get section size for {name:?}: {source}")]
    SectionSize {
        name: String,
        #[source]
        source: FetchError,
    },
}

/// Extracts one metric snapshot per scrape from a single Plex server.
pub struct PlexClient {
    server: Arc<PlexServer>,
    span: tracing::Span,
}

impl PlexClient {
    pub fn new(server: Arc<PlexServer>) -> Self {
        let span = info_span!("plex_client", server = %server.name());
        Self { server, span }
    }

    pub fn server(&self) -> &PlexServer {
        &self.server
    }

    /// Fetches server info, session status and library sizes concurrently.
    /// A failing branch reports its error and leaves its snapshot fields at
    /// zero value without blocking the other branches; per-section size
    /// lookups fan out the same way, one task per section, and a failing
    /// section is skipped. Returns the partial snapshot together with the
    /// first error observed across all branches, if any.
    pub async fn server_metrics(&self) -> (ServerSnapshot, Option<ExtractError>) {
        // Unbounded so that any number of concurrently failing branches can
        // report without blocking; drained once after the join below.
        let (errors_tx, mut errors_rx) = mpsc::unbounded_channel();

        let info = {
            let errors = errors_tx.clone();
            async move {
                match self.server.server_info().await {
                    Ok(response) => Some(response.media_container),
                    Err(err) => {
                        debug!(%err, "failed to get server info");
                        let _ = errors.send(ExtractError::Info(err));
                        None
                    }
                }
            }
        };

        let sessions = {
            let errors = errors_tx.clone();
            async move {
                match self.server.session_status().await {
                    Ok(response) => Some(response.media_container),
                    Err(err) => {
                        debug!(%err, "could not get session status");
                        let _ = errors.send(ExtractError::Sessions(err));
                        None
                    }
                }
            }
        };

        let libraries = {
            let errors = errors_tx.clone();
            async move {
                let library = match self.server.library().await {
                    Ok(response) => response.media_container,
                    Err(err) => {
                        debug!(%err, "could not get library");
                        let _ = errors.send(ExtractError::Library(err));
                        return Vec::new();
                    }
                };

                let lookups = library.sections.into_iter().map(|section| {
                    let errors = errors.clone();
                    async move {
                        let id = match section.id.parse::<u32>() {
                            Ok(id) => id,
                            Err(_) => {
                                debug!(id = %section.id, "could not convert section id to an integer");
                                let _ = errors.send(ExtractError::SectionId { id: section.id });
                                return None;
                            }
                        };
                        match self.server.section_size(id).await {
                            Ok(size) => Some(LibraryMetric {
                                name: section.name,
                                kind: section.kind,
                                size,
                            }),
                            Err(err) => {
                                debug!(section = %section.name, %err, "could not get section size");
                                let _ = errors.send(ExtractError::SectionSize {
                                    name: section.name,
                                    source: err,
                                });
                                None
                            }
                        }
                    }
                });

                join_all(lookups).await.into_iter().flatten().collect()
            }
        };

        let (info, sessions, libraries) = async { tokio::join!(info, sessions, libraries) }
            .instrument(self.span.clone())
            .await;
        drop(errors_tx);

        let mut snapshot = ServerSnapshot::default();
        if let Some(info) = info {
            snapshot.version = info.version;
            snapshot.platform = info.platform;
        }
        if let Some(container) = sessions {
            snapshot.active_sessions = container.size;
            for entry in container.metadata {
                let player = PlayerMetric::from(entry.player);
                snapshot.sessions.push(SessionMetric {
                    bandwidth: entry.session.bandwidth,
                    location: entry.session.location,
                    player: player.clone(),
                });
                snapshot.players.push(player);
            }
        }
        snapshot.libraries = libraries;

        (snapshot, errors_rx.try_recv().ok())
    }
}
