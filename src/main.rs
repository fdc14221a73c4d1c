use chrono::Utc;
use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr as _;
use plex_exporter::{
    init_logging,
    App,
};
use plex_exporter_client::{
    request_pin,
    token_from_pin,
    PlexTvError,
};
use plex_exporter_config::{
    Args,
    Command,
    Config,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(Command::Token) = args.command {
        return token().await;
    }

    let config = Config::load(&args)?;
    init_logging(&config)?;
    App::new(config).run().await
}

/// Runs the plex.tv PIN pairing flow and prints the resulting token.
async fn token() -> Result<()> {
    println!("Attempting to authenticate with Plex");

    let pin = request_pin().await.wrap_err("could not make a pin request")?;
    println!("\n\tGot PIN code: {}", pin.code);
    println!("\tGo to https://plex.tv/pin and enter the code to authenticate.\n");

    let mut interval = tokio::time::interval(Duration::from_secs(5));
    loop {
        interval.tick().await;
        if pin.expiry < Utc::now() {
            return Err(PlexTvError::PinExpired.into());
        }

        match token_from_pin(pin.id).await {
            Ok(token) => {
                println!("Authenticated successfully!\nYour token is: {token}");
                return Ok(());
            }
            Err(PlexTvError::PinNotAuthorised) => {}
            Err(err) => return Err(err).wrap_err("could not check PIN request"),
        }
    }
}
