//! JSON-lines event input.
//!
//! Each non-blank line is one `LogEvent` object:
//!
//! ```text
//! {"timestamp":"2024-01-15T12:00:00Z","level":"ERROR","logger":"app.db","message":"connection lost"}
//! ```
//!
//! `timestamp` is optional and defaults to the time the line was read.
//! Malformed lines are logged and skipped; they never stop the feed.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use floodmail_core::types::LogEvent;
use floodmail_notifier::NotificationChannel;

/// Lines longer than this are skipped without parsing.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Where events are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Standard input.
    Stdin,
    /// A JSON-lines file.
    File(PathBuf),
}

impl InputSource {
    /// Map the optional `--input` path; `-` also means stdin.
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p != Path::new("-") => Self::File(p.to_path_buf()),
            _ => Self::Stdin,
        }
    }

    /// Open the source as a buffered async reader.
    pub async fn open(&self) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
        match self {
            Self::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
            Self::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    anyhow::anyhow!("failed to open input '{}': {}", path.display(), e)
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Counters for one feed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Lines read (including blank and malformed ones).
    pub lines: u64,
    /// Events handed to the channel.
    pub events: u64,
    /// Lines that could not be parsed.
    pub malformed: u64,
}

/// Read events until EOF and hand each one to the channel.
///
/// # Errors
///
/// Returns an error only when the underlying reader fails.
pub async fn feed<R>(reader: R, channel: &NotificationChannel) -> Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = FeedStats::default();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| anyhow::anyhow!("failed to read input: {}", e))?
    {
        stats.lines += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.len() > MAX_LINE_LENGTH {
            stats.malformed += 1;
            tracing::warn!(
                line = stats.lines,
                length = trimmed.len(),
                max = MAX_LINE_LENGTH,
                "input line too long, skipping"
            );
            continue;
        }

        match serde_json::from_str::<LogEvent>(trimmed) {
            Ok(event) => {
                stats.events += 1;
                channel.on_event(event);
            }
            Err(e) => {
                stats.malformed += 1;
                tracing::warn!(line = stats.lines, error = %e, "malformed event, skipping");
            }
        }
    }

    tracing::debug!(
        lines = stats.lines,
        events = stats.events,
        malformed = stats.malformed,
        "input reached end of stream"
    );
    Ok(stats)
}
