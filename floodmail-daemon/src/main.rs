use anyhow::Result;
use clap::Parser;

use floodmail_daemon::cli::DaemonCli;
use floodmail_daemon::daemon::{self, Daemon};
use floodmail_daemon::input::InputSource;
use floodmail_daemon::logging;
use floodmail_notifier::FilterLoader;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = daemon::load_config(cli.config.as_deref()).await?;

    // CLI overrides take precedence over file and environment
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        let filters = FilterLoader::load_file(&config.notifier.filter_config)
            .await
            .map_err(|e| anyhow::anyhow!("filter config invalid: {}", e))?;
        println!(
            "configuration OK ({} filter rule(s) from {})",
            filters.len(),
            config.notifier.filter_config
        );
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "floodmail-daemon starting");

    let source = InputSource::from_arg(cli.input.as_deref());
    let reader = source.open().await?;
    tracing::info!(input = %source, "reading events");

    let daemon = Daemon::build_from_config(config, daemon::build_transport(cli.transport)).await?;
    let (reason, stats) = daemon.run(reader).await?;

    tracing::info!(
        reason = ?reason,
        events = stats.events,
        malformed = stats.malformed,
        "floodmail-daemon shut down"
    );
    Ok(())
}
