#[macro_use]
extern crate tracing;

mod args;
mod log_format;
mod server_config;

pub use args::{
    Args,
    Command,
};
pub use log_format::LogFormat;
use serde::Deserialize;
pub use server_config::PlexServerConfig;
use std::{
    collections::HashMap,
    path::Path,
    str::FromStr as _,
};

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");
const DEFAULT_CONFIG_PATH: &str = "/etc/plex_exporter/config.yaml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("server base URL {url:?} is not valid: {source}")]
    InvalidServerUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("no servers configured and auto discovery is disabled")]
    NoServers,
    #[error("unknown log level {level:?}, available levels are trace, debug, info, warn, error")]
    InvalidLogLevel { level: String },
}

/// Exporter configuration, resolved from the built-in defaults, an optional
/// YAML file and command-line/environment overrides, in that order.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Servers to export metrics from.
    #[serde(default)]
    pub servers: Vec<PlexServerConfig>,
    /// Discover servers owned by the token's account from plex.tv.
    #[serde(default)]
    pub auto_discover: bool,
    /// Shared fallback token for servers without one of their own.
    #[serde(default)]
    pub token: Option<String>,
    pub listen_address: String,
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl config::Source for Config {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let mut cache = HashMap::<String, config::Value>::new();
        cache.insert("listen_address".to_string(), self.listen_address.clone().into());
        cache.insert("log_level".to_string(), self.log_level.clone().into());
        cache.insert("log_format".to_string(), self.log_format.to_string().into());
        cache.insert("auto_discover".to_string(), self.auto_discover.into());
        if let Some(token) = &self.token {
            cache.insert("token".to_string(), token.clone().into());
        }
        if !self.servers.is_empty() {
            cache.insert(
                "servers".to_string(),
                self.servers
                    .iter()
                    .map(|server| {
                        let mut table = HashMap::from_iter([
                            ("base_url".to_string(), server.base_url.clone().into()),
                            ("insecure".to_string(), server.insecure.into()),
                        ]);
                        if let Some(token) = &server.token {
                            table.insert("token".to_string(), token.clone().into());
                        }
                        config::ValueKind::Table(table)
                    })
                    .collect::<Vec<_>>()
                    .into(),
            );
        }
        Ok(cache)
    }
}

impl Config {
    /// Resolves the configuration for a run. The YAML file is optional
    /// unless the arguments point at one explicitly; command-line and
    /// environment values override whatever the file says.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder().add_source(Config::default());

        let source = match &args.config_path {
            Some(path) => config::File::from(path.clone()).format(config::FileFormat::Yaml),
            None => config::File::from(Path::new(DEFAULT_CONFIG_PATH))
                .format(config::FileFormat::Yaml)
                .required(false),
        };
        builder = builder.add_source(source).add_source(args.clone());

        let mut config: Self = builder.build()?.try_deserialize()?;

        // A server given on the command line joins the configured set. It
        // carries no token of its own and falls back to the shared one.
        if let Some(base_url) = &args.plex_server {
            config.servers.push(PlexServerConfig::new(base_url.clone()));
        }

        if let Some(port) = config.listen_address.strip_prefix(':') {
            config.listen_address = format!("0.0.0.0:{port}");
        }

        config.validate()?;
        debug!(servers = config.servers.len(), "configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for server in &self.servers {
            url::Url::parse(&server.base_url).map_err(|source| ConfigError::InvalidServerUrl {
                url: server.base_url.clone(),
                source,
            })?;
        }
        if self.servers.is_empty() && !self.auto_discover {
            return Err(ConfigError::NoServers);
        }
        if tracing::Level::from_str(&self.log_level).is_err() {
            return Err(ConfigError::InvalidLogLevel {
                level: self.log_level.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("plex-exporter").chain(argv.iter().copied()))
    }

    fn write_config(dir: &TempDir, content: &str) -> String {
        let path = dir.child("config.yaml");
        std::fs::write(&path, content).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let config = Config::load(&args(&["--plex-server", "http://localhost:32400"])).unwrap();
        assert_eq!(config.listen_address, "0.0.0.0:9594");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.auto_discover);
        assert_eq!(config.servers, vec![PlexServerConfig::new("http://localhost:32400")]);
    }

    #[test]
    fn yaml_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
servers:
  - base_url: http://10.0.0.2:32400
    token: abc123
  - base_url: https://plex.example.com
    insecure: true
token: shared-token
listen_address: "127.0.0.1:9000"
log_level: debug
log_format: json
"#,
        );

        let config = Config::load(&args(&["-c", &path])).unwrap();
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].base_url, "http://10.0.0.2:32400");
        assert_eq!(config.servers[0].token.as_deref(), Some("abc123"));
        assert!(!config.servers[0].insecure);
        assert!(config.servers[1].insecure);
        assert_eq!(config.token.as_deref(), Some("shared-token"));
        assert_eq!(config.listen_address, "127.0.0.1:9000");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn arguments_override_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
servers:
  - base_url: http://10.0.0.2:32400
token: file-token
log_level: debug
"#,
        );

        let config = Config::load(&args(&["-c", &path, "--log-level", "warn", "--token", "cli-token"])).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.token.as_deref(), Some("cli-token"));
    }

    #[test]
    fn command_line_server_falls_back_to_the_shared_token() {
        let config = Config::load(&args(&[
            "--plex-server",
            "http://localhost:32400",
            "--token",
            "shared-token",
        ]))
        .unwrap();
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].token, None);
        assert_eq!(config.token.as_deref(), Some("shared-token"));
    }

    #[test]
    fn listen_address_without_a_host_binds_everywhere() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
servers:
  - base_url: http://localhost:32400
listen_address: ":9999"
"#,
        );

        let config = Config::load(&args(&["-c", &path])).unwrap();
        assert_eq!(config.listen_address, "0.0.0.0:9999");
    }

    #[test]
    fn no_servers_is_rejected() {
        assert!(matches!(Config::load(&args(&[])), Err(ConfigError::NoServers)));
    }

    #[test]
    fn no_servers_is_accepted_with_auto_discovery() {
        let config = Config::load(&args(&["--auto-discover", "--token", "shared-token"])).unwrap();
        assert!(config.servers.is_empty());
        assert!(config.auto_discover);
    }

    #[test]
    fn invalid_server_url_is_rejected() {
        let result = Config::load(&args(&["--plex-server", "not a url"]));
        assert!(matches!(result, Err(ConfigError::InvalidServerUrl { url, .. }) if url == "not a url"));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let result = Config::load(&args(&[
            "--plex-server",
            "http://localhost:32400",
            "--log-level",
            "loud",
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidLogLevel { level }) if level == "loud"));
    }

    #[test]
    fn explicitly_missing_file_is_an_error() {
        let result = Config::load(&args(&["-c", "/nonexistent/config.yaml"]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
