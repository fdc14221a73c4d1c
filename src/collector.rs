use plex_exporter_client::{
    PlexClient,
    PlexServer,
    ServerSnapshot,
};
use prometheus::{
    core::{
        Collector as _,
        Desc,
    },
    proto::MetricFamily,
    IntGaugeVec,
    Opts,
    Registry,
};
use std::{
    collections::HashMap,
    sync::Arc,
};
use tokio::sync::Mutex;

/// Per-server metrics collector. Owns a registry tagged with the server's
/// identity labels and translates one extraction snapshot into gauge
/// observations per scrape.
pub struct PlexCollector {
    client: PlexClient,
    registry: Registry,
    // Serialises scrapes so a concurrent scrape cannot interleave with the
    // reset/repopulate sequence.
    scrape: Mutex<()>,

    server_info: IntGaugeVec,
    active_sessions: IntGaugeVec,
    players: IntGaugeVec,
    libraries: IntGaugeVec,
}

impl PlexCollector {
    pub fn new(server: Arc<PlexServer>) -> Result<Self, prometheus::Error> {
        let labels = HashMap::from([
            ("server_name".to_string(), server.name().to_string()),
            ("server_id".to_string(), server.id().to_string()),
        ]);
        let registry = Registry::new_custom(None, Some(labels))?;

        let server_info = IntGaugeVec::new(
            Opts::new("info", "Information about Plex server")
                .namespace("plex")
                .subsystem("server"),
            &["version", "platform"],
        )?;
        let active_sessions = IntGaugeVec::new(
            Opts::new("active_count", "Number of active Plex sessions")
                .namespace("plex")
                .subsystem("sessions"),
            &[],
        )?;
        let players = IntGaugeVec::new(
            Opts::new("count", "Details about current players connected to Plex")
                .namespace("plex")
                .subsystem("player"),
            &["device", "platform", "profile", "state", "local", "relayed", "secure"],
        )?;
        let libraries = IntGaugeVec::new(
            Opts::new("section_size_count", "Number of items in a library section")
                .namespace("plex")
                .subsystem("library"),
            &["name", "type"],
        )?;

        registry.register(Box::new(server_info.clone()))?;
        registry.register(Box::new(active_sessions.clone()))?;
        registry.register(Box::new(players.clone()))?;
        registry.register(Box::new(libraries.clone()))?;

        Ok(Self {
            client: PlexClient::new(server),
            registry,
            scrape: Mutex::new(()),
            server_info,
            active_sessions,
            players,
            libraries,
        })
    }

    pub fn server(&self) -> &PlexServer {
        self.client.server()
    }

    /// Descriptors of every metric this collector can emit, independent of
    /// server state.
    pub fn describe(&self) -> Vec<&Desc> {
        [&self.server_info, &self.active_sessions, &self.players, &self.libraries]
            .into_iter()
            .flat_map(|gauges| gauges.desc())
            .collect()
    }

    /// Runs one extraction cycle and repopulates the gauges from the
    /// snapshot. A failed extraction leaves every gauge unset, so the scrape
    /// shows a gap for this server rather than stale values.
    pub async fn collect(&self) {
        let _guard = self.scrape.lock().await;

        self.server_info.reset();
        self.active_sessions.reset();
        self.players.reset();
        self.libraries.reset();

        let (snapshot, error) = self.client.server_metrics().await;
        if let Some(err) = error {
            warn!(server = %self.server().name(), %err, "could not retrieve server metrics");
            return;
        }
        self.observe(&snapshot);
    }

    fn observe(&self, snapshot: &ServerSnapshot) {
        self.server_info
            .with_label_values(&[snapshot.version.as_str(), snapshot.platform.as_str()])
            .set(1);
        self.active_sessions.with_label_values::<&str>(&[]).set(snapshot.active_sessions);

        for player in &snapshot.players {
            let local = player.local.to_string();
            let relayed = player.relayed.to_string();
            let secure = player.secure.to_string();
            self.players
                .with_label_values(&[
                    player.device.as_str(),
                    player.platform.as_str(),
                    player.profile.as_str(),
                    player.state.as_str(),
                    local.as_str(),
                    relayed.as_str(),
                    secure.as_str(),
                ])
                .inc();
        }

        for library in &snapshot.libraries {
            self.libraries
                .with_label_values(&[library.name.as_str(), library.kind.as_str()])
                .set(library.size);
        }
    }

    /// Current metric families of this server's registry, identity labels
    /// included.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}
