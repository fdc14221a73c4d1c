use crate::exporter::Exporter;
use color_eyre::Result;
use plex_exporter_client::{
    discover_servers,
    PlexServer,
};
use plex_exporter_config::Config;

/// The exporter application: resolves the working server set and serves the
/// metrics endpoint until shutdown.
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let servers = connect_servers(&self.config).await;
        info!("found {} working servers", servers.len());

        let exporter = Exporter::new(servers)?;
        exporter.serve(&self.config.listen_address).await?;
        Ok(())
    }
}

/// Connects every configured server and, when enabled, the servers
/// discovered from plex.tv. A failing endpoint is logged and dropped; the
/// rest of the set is unaffected.
async fn connect_servers(config: &Config) -> Vec<PlexServer> {
    let mut servers = Vec::new();
    for server_config in &config.servers {
        match PlexServer::connect(server_config, config.token.as_deref()).await {
            Ok(server) => servers.push(server),
            Err(err) => error!(base_url = %server_config.base_url, %err, "could not add server"),
        }
    }

    if config.auto_discover {
        match config.token.as_deref() {
            Some(token) => match discover_servers(token).await {
                Ok(discovered) => servers.extend(discovered),
                Err(err) => error!(%err, "server discovery failed"),
            },
            None => warn!("auto discovery is enabled but no token is configured"),
        }
    }

    servers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::header::CONTENT_TYPE,
        routing::get,
        Router,
    };
    use plex_exporter_config::{
        LogFormat,
        PlexServerConfig,
    };
    use pretty_assertions::assert_eq;

    const SERVER_INFO: &str = r#"{
        "MediaContainer": {
            "machineIdentifier": "abc123",
            "friendlyName": "office",
            "version": "1.41.0.8992",
            "platform": "Linux"
        }
    }"#;

    fn stub_plex() -> Router {
        Router::new().route(
            "/media/providers",
            get(|| async { ([(CONTENT_TYPE, "application/json")], SERVER_INFO) }),
        )
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config_for(servers: Vec<PlexServerConfig>) -> Config {
        Config {
            servers,
            auto_discover: false,
            token: None,
            listen_address: "127.0.0.1:0".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }

    #[tokio::test]
    async fn dead_endpoint_is_dropped_from_the_server_set() {
        let base = serve(stub_plex()).await;
        let config = config_for(vec![
            PlexServerConfig::new(base),
            // Nothing listens here; the probe fails at connection time.
            PlexServerConfig::new("http://127.0.0.1:9"),
        ]);

        let servers = connect_servers(&config).await;

        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name(), "office");
    }

    #[tokio::test]
    async fn empty_server_set_is_allowed() {
        let config = config_for(Vec::new());
        assert!(connect_servers(&config).await.is_empty());
    }
}
