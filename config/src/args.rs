use crate::LogFormat;
use clap::{
    Parser,
    Subcommand,
};
use std::{
    collections::HashMap,
    path::PathBuf,
};

/// Prometheus exporter for Plex Media Server
#[derive(Parser, Debug, Clone)]
#[command(name = "plex-exporter", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file.
    #[arg(short = 'c', long, env = "PLEX_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// Address the metrics endpoint listens on.
    #[arg(short = 'l', long, env = "PLEX_LISTEN_ADDR")]
    pub listen_address: Option<String>,

    /// Verbosity level of logs.
    #[arg(long, env = "PLEX_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Output format of logs.
    #[arg(short = 'f', long = "format", env = "PLEX_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Auto discover Plex servers from plex.tv.
    #[arg(short = 'a', long, env = "PLEX_AUTO_DISCOVER")]
    pub auto_discover: bool,

    /// Address of a Plex Media Server to export metrics from.
    #[arg(short = 'p', long, env = "PLEX_SERVER")]
    pub plex_server: Option<String>,

    /// Authentication token for Plex Media Server.
    #[arg(short = 't', long, env = "PLEX_TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Get an authentication token from plex.tv.
    #[command(alias = "t")]
    Token,
}

impl config::Source for Args {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let mut cache = HashMap::<String, config::Value>::new();
        if let Some(listen_address) = &self.listen_address {
            cache.insert("listen_address".to_string(), listen_address.clone().into());
        }
        if let Some(log_level) = &self.log_level {
            cache.insert("log_level".to_string(), log_level.clone().into());
        }
        if let Some(log_format) = self.log_format {
            cache.insert("log_format".to_string(), log_format.to_string().into());
        }
        if self.auto_discover {
            cache.insert("auto_discover".to_string(), true.into());
        }
        if let Some(token) = &self.token {
            cache.insert("token".to_string(), token.clone().into());
        }
        Ok(cache)
    }
}
