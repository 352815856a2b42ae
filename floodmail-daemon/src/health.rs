//! Daemon health reporting.
//!
//! Wraps the notification channel's `health_check()` and `stats()` into a
//! [`DaemonHealth`] report and logs it periodically while the daemon runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use floodmail_core::pipeline::HealthStatus;
use floodmail_notifier::{ChannelStats, NotificationChannel};

/// Default interval between periodic health reports.
pub const HEALTH_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Health report for the whole daemon.
#[derive(Debug, Clone)]
pub struct DaemonHealth {
    /// Channel health status.
    pub status: HealthStatus,
    /// Daemon uptime in seconds since start.
    pub uptime_secs: u64,
    /// Channel counters at the time of the report.
    pub stats: ChannelStats,
}

impl DaemonHealth {
    /// Take a snapshot of the channel.
    pub fn snapshot(channel: &NotificationChannel, start_time: Instant) -> Self {
        Self {
            status: channel.health_check(),
            uptime_secs: start_time.elapsed().as_secs(),
            stats: channel.stats(),
        }
    }

    /// Emit the report at a level matching its status.
    pub fn log(&self) {
        let s = &self.stats;
        match &self.status {
            HealthStatus::Healthy => tracing::info!(
                uptime_secs = self.uptime_secs,
                received = s.received,
                accepted = s.accepted,
                sent = s.sent,
                buffer_len = s.buffer_len,
                "daemon healthy"
            ),
            HealthStatus::Degraded(reason) => tracing::warn!(
                uptime_secs = self.uptime_secs,
                reason = %reason,
                suppressed_flood = s.suppressed_flood,
                jobs_dropped = s.jobs_dropped,
                "daemon degraded"
            ),
            HealthStatus::Unhealthy(reason) => tracing::error!(
                uptime_secs = self.uptime_secs,
                reason = %reason,
                "daemon unhealthy"
            ),
        }
    }
}

/// Spawn a background task that logs a health report every `interval`
/// until a shutdown signal is broadcast.
pub fn spawn_health_monitor(
    channel: Arc<NotificationChannel>,
    start_time: Instant,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    DaemonHealth::snapshot(&channel, start_time).log();
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("health monitor shutting down");
                    break;
                }
            }
        }
    })
}
