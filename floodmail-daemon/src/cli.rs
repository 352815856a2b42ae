//! CLI argument definitions for floodmail-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// floodmail notification daemon.
///
/// Reads log events as JSON lines, batches them, and emits
/// flood-protected notifications through the configured transport.
#[derive(Parser, Debug)]
#[command(name = "floodmail-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to floodmail.toml configuration file.
    ///
    /// When omitted, built-in defaults plus `FLOODMAIL_*` environment
    /// overrides are used.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read JSON-lines log events from this file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Where composed notifications are delivered.
    #[arg(long, value_enum, default_value_t = TransportKind::Log)]
    pub transport: TransportKind,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and filter files, then exit.
    #[arg(long)]
    pub validate: bool,
}

/// Notification transport selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Emit each notification as a tracing event.
    Log,
    /// Write each notification as one JSON object per line to stdout.
    Stdout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_args() {
        let cli = DaemonCli::try_parse_from(["floodmail-daemon"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.input.is_none());
        assert_eq!(cli.transport, TransportKind::Log);
        assert!(!cli.validate);
    }

    #[test]
    fn parses_all_args() {
        let cli = DaemonCli::try_parse_from([
            "floodmail-daemon",
            "--config",
            "/etc/floodmail/floodmail.toml",
            "--input",
            "events.jsonl",
            "--transport",
            "stdout",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "--validate",
        ])
        .unwrap();
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/etc/floodmail/floodmail.toml"))
        );
        assert_eq!(cli.transport, TransportKind::Stdout);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("pretty"));
        assert!(cli.validate);
    }

    #[test]
    fn rejects_unknown_transport() {
        let result = DaemonCli::try_parse_from(["floodmail-daemon", "--transport", "smtp"]);
        assert!(result.is_err());
    }
}
