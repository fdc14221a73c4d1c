use color_eyre::Result;
use plex_exporter_config::{
    Config,
    LogFormat,
};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

/// Initialises the tracing subscriber with the configured level and output
/// format. The level has already been validated at configuration time.
pub fn init_logging(config: &Config) -> Result<()> {
    let registry = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
    let filter = EnvFilter::new(&config.log_level);

    match config.log_format {
        LogFormat::Text => registry.with(fmt::layer().with_filter(filter)).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json().with_filter(filter)).try_init()?,
    }
    Ok(())
}
