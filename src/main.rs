use anyhow::Result;
use clap::Parser;
use log4rs::config::Deserializers;
use tapsocks::{config::ProxyConfig, server::ProxyServer};

/// `current_thread` honors `spec.md` §5's single-threaded cooperative
/// scheduling model: one OS thread, sessions multiplexed as spawned tasks
/// rather than as kernel-level parallel work.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = ProxyConfig::parse();

    log4rs::init_file(config.log_config(), Deserializers::default())?;

    let server = ProxyServer::new(&config);
    server.run().await?;
    Ok(())
}
