//! Integration tests for metrics server functionality.
//!
//! Only failure paths are exercised here: a successful install claims the
//! process-global recorder.

use floodmail_core::config::MetricsConfig;
use floodmail_daemon::metrics_server;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_install_metrics_recorder_fails_with_invalid_address() {
    // Given: An invalid listen address
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "999.999.999.999".to_owned(),
        port: 9102,
        endpoint: "/metrics".to_owned(),
    };

    // When/Then: Installation fails
    let result = metrics_server::install_metrics_recorder(&config);
    assert!(result.is_err());
}

#[tokio::test]
#[serial]
async fn test_install_metrics_recorder_rejects_unsupported_endpoint() {
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "127.0.0.1".to_owned(),
        port: 19102,
        endpoint: "/custom".to_owned(),
    };

    let err = metrics_server::install_metrics_recorder(&config).unwrap_err();
    assert!(err.to_string().contains("unsupported metrics endpoint"));
}
