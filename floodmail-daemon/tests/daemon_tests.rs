//! Daemon end-to-end tests.
//!
//! Feeds JSON-lines input through a fully built daemon and checks what
//! reaches the transport.

use std::io::Write;
use std::sync::Arc;

use floodmail_core::config::FloodmailConfig;
use floodmail_daemon::daemon::{Daemon, StopReason};
use floodmail_daemon::input::feed;
use floodmail_notifier::{FilterEngine, MemoryTransport, NotificationChannel};
use tempfile::NamedTempFile;

const FILTERS: &str = r#"
vars:
  - name: host
    value: db01.example.com
filters:
  - regex: "(?s).*${host}.*"
    to: dba@example.com
    message: "Database host ${host} reported errors."
  - regex: "(?s).*Heartbeat.*"
    message: ""
    log: false
"#;

fn filter_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp filter file");
    file.write_all(FILTERS.as_bytes())
        .expect("write temp filter file");
    file
}

fn config(filter_path: &str) -> FloodmailConfig {
    let mut config = FloodmailConfig::default();
    config.notifier.to = "ops@example.com".to_owned();
    config.notifier.subject = "[app] errors".to_owned();
    config.notifier.buffer_size = 3;
    config.notifier.flood_frequency = 0;
    config.notifier.send_on_close = false;
    config.notifier.filter_config = filter_path.to_owned();
    config
}

fn line(level: &str, message: &str) -> String {
    format!(
        "{{\"timestamp\":\"2024-01-15T12:00:00Z\",\"level\":\"{level}\",\"logger\":\"app\",\"message\":\"{message}\"}}\n"
    )
}

#[tokio::test]
async fn test_run_batches_input_and_flushes_on_eof() {
    // Given: A daemon with buffer size 3 and a db routing rule
    let filters = filter_file();
    let transport = Arc::new(MemoryTransport::new());
    let daemon = Daemon::build_from_config(
        config(filters.path().to_str().unwrap()),
        transport.clone(),
    )
    .await
    .expect("daemon should build");

    // When: Four events are read, the third mentioning the db host
    let input = [
        line("ERROR", "disk full"),
        line("ERROR", "timeout"),
        line("ERROR", "db01.example.com unreachable"),
        line("WARN", "retrying"),
    ]
    .concat();
    let (reason, stats) = daemon.run(input.as_bytes()).await.expect("run");

    // Then: One routed batch on buffer full, one remainder batch on close
    assert_eq!(reason, StopReason::EndOfInput);
    assert_eq!(stats.events, 4);
    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to[0].email, "dba@example.com");
    assert!(sent[0].body.starts_with("Database host db01.example.com"));
    assert_eq!(sent[1].to[0].email, "ops@example.com");
    assert!(sent[1].body.contains("retrying"));
    assert!(daemon.health().status.is_unhealthy());
}

#[tokio::test]
async fn test_run_skips_malformed_lines() {
    // Given: A daemon without a filter file
    let transport = Arc::new(MemoryTransport::new());
    let daemon = Daemon::build_from_config(
        config("/nonexistent/filter-config.yml"),
        transport.clone(),
    )
    .await
    .expect("missing filter file is not fatal");

    // When: Input mixes valid events, garbage and blank lines
    let input = format!(
        "{}not json\n\n{}{{\"level\":\"NOPE\",\"message\":\"x\"}}\n",
        line("ERROR", "first"),
        line("ERROR", "second"),
    );
    let (_, stats) = daemon.run(input.as_bytes()).await.expect("run");

    // Then: Only the valid events reach the channel
    assert_eq!(stats.lines, 5);
    assert_eq!(stats.events, 2);
    assert_eq!(stats.malformed, 2);
    assert_eq!(daemon.channel().stats().received, 2);
    assert_eq!(transport.sent_count(), 1);
}

#[tokio::test]
async fn test_build_fails_on_invalid_filter_file() {
    // Given: A filter file with an undefined variable
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"filters:\n  - regex: \"${missing}\"\n    to: a@example.com\n    message: m\n")
        .unwrap();

    // When: Building the daemon
    let result = Daemon::build_from_config(
        config(file.path().to_str().unwrap()),
        Arc::new(MemoryTransport::new()),
    )
    .await;

    // Then: The error names the missing variable
    let err = result.err().expect("build should fail");
    assert!(err.to_string().contains("missing"));
}

#[tokio::test]
async fn test_feed_uses_current_time_when_timestamp_missing() {
    let transport = Arc::new(MemoryTransport::new());
    let channel = NotificationChannel::init(
        floodmail_notifier::ChannelConfigBuilder::new()
            .to("ops@example.com")
            .buffer_size(1)
            .build()
            .unwrap(),
        Arc::new(FilterEngine::empty()),
        transport.clone(),
    )
    .unwrap();

    let input = "{\"level\":\"error\",\"message\":\"no timestamp\"}\n";
    let stats = feed(input.as_bytes(), &channel).await.unwrap();
    channel.close(false).await;

    assert_eq!(stats.events, 1);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("no timestamp"));
}
