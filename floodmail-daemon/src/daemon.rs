//! Daemon assembly and lifecycle.
//!
//! The [`Daemon`] loads configuration, installs the metrics recorder,
//! builds the notification channel, and feeds it from the input source
//! until end of input or a shutdown signal.
//!
//! # Shutdown
//!
//! 1. Stop reading input (EOF, `SIGTERM` or `SIGINT`)
//! 2. Stop the health monitor
//! 3. Close the channel, flushing pending events and draining the dispatch queue

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tokio::sync::broadcast;

use floodmail_core::config::FloodmailConfig;
use floodmail_core::pipeline::Transport;
use floodmail_notifier::{JsonLinesTransport, LogTransport, NotificationChannel};

use crate::cli::TransportKind;
use crate::health::{DaemonHealth, HEALTH_REPORT_INTERVAL, spawn_health_monitor};
use crate::input::{FeedStats, feed};
use crate::metrics_server;

/// Load configuration from a file, or from defaults plus environment
/// overrides when no path is given.
pub async fn load_config(path: Option<&Path>) -> Result<FloodmailConfig> {
    match path {
        Some(path) => FloodmailConfig::load(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e)),
        None => {
            let mut config = FloodmailConfig::default();
            config.apply_env_overrides();
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
            Ok(config)
        }
    }
}

/// Build the transport selected on the command line.
pub fn build_transport(kind: TransportKind) -> Arc<dyn Transport> {
    match kind {
        TransportKind::Log => Arc::new(LogTransport),
        TransportKind::Stdout => Arc::new(JsonLinesTransport::stdout()),
    }
}

/// Why the input loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The input reached end of stream.
    EndOfInput,
    /// A shutdown signal arrived.
    Signal(&'static str),
}

/// The floodmail daemon.
pub struct Daemon {
    config: FloodmailConfig,
    channel: Arc<NotificationChannel>,
    shutdown_tx: broadcast::Sender<()>,
    start_time: Instant,
}

impl Daemon {
    /// Build from an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// - Configuration validation fails
    /// - The metrics recorder cannot be installed
    /// - The filter file is malformed
    pub async fn build_from_config(
        config: FloodmailConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        tracing::info!(
            transport = transport.name(),
            filter_config = %config.notifier.filter_config,
            "building notification channel"
        );
        let channel = NotificationChannel::from_core(&config.notifier, transport)
            .await
            .map_err(|e| anyhow::anyhow!("failed to build notification channel: {}", e))?;

        let (shutdown_tx, _) = broadcast::channel(4);

        Ok(Self {
            config,
            channel: Arc::new(channel),
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Feed the channel from `reader` until EOF or a shutdown signal,
    /// then close the channel with a final flush.
    pub async fn run<R>(&self, reader: R) -> Result<(StopReason, FeedStats)>
    where
        R: AsyncBufRead + Unpin,
    {
        let monitor = spawn_health_monitor(
            Arc::clone(&self.channel),
            self.start_time,
            HEALTH_REPORT_INTERVAL,
            self.shutdown_tx.subscribe(),
        );

        tracing::info!(evaluator = self.channel.evaluator_name(), "floodmail-daemon running");

        let outcome = tokio::select! {
            result = feed(reader, &self.channel) => {
                result.map(|stats| (StopReason::EndOfInput, stats))
            }
            signal = wait_for_shutdown_signal() => {
                signal.map(|name| (StopReason::Signal(name), FeedStats::default()))
            }
        };

        let _ = self.shutdown_tx.send(());
        if let Err(e) = monitor.await {
            tracing::warn!(error = %e, "health monitor task failed");
        }

        // Pending events are flushed even when the input failed.
        self.channel.close(true).await;
        DaemonHealth::snapshot(&self.channel, self.start_time).log();

        let (reason, stats) = outcome?;
        tracing::info!(reason = ?reason, "input loop stopped");
        Ok((reason, stats))
    }

    /// The notification channel driven by this daemon.
    pub fn channel(&self) -> &Arc<NotificationChannel> {
        &self.channel
    }

    /// Current health report.
    pub fn health(&self) -> DaemonHealth {
        DaemonHealth::snapshot(&self.channel, self.start_time)
    }

    /// The loaded configuration.
    pub fn config(&self) -> &FloodmailConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
