//! Integration tests for the log lines each tick and each delivery failure emit.

#[path = "../helpers/mod.rs"]
mod helpers;

use anyhow::Result;
use helpers::log_capture::LogCapture;
use helpers::FixedProbe;
use shooter_telemetry::config::ReportConfig;
use shooter_telemetry::{Reporter, TrafficStats};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn report_config(url: String) -> ReportConfig {
    ReportConfig {
        interval: 1,
        url,
        management_ip: "192.0.2.7".to_string(),
    }
}

#[tokio::test]
async fn test_rejected_delivery_logs_warning() -> Result<()> {
    let (logs, _guard) = LogCapture::install();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let stats = Arc::new(TrafficStats::new());
    let mut reporter = Reporter::builder(report_config(server.uri()), stats)
        .interval_override(Duration::from_millis(100))
        .probe_override(Box::new(FixedProbe))
        .build()?;

    reporter.start();
    tokio::time::sleep(Duration::from_millis(350)).await;
    reporter.stop().await;

    let rejected = logs.lines_containing("Report delivery rejected");
    assert!(!rejected.is_empty(), "no rejection logged: {:?}", logs.lines());
    for line in &rejected {
        assert!(line.contains("WARN"), "expected a warning: {}", line);
        assert!(line.contains("500"), "expected the status code: {}", line);
    }
    assert!(logs.lines_containing("Failed to send report").is_empty());
    // The report is still logged after a rejected delivery.
    assert_eq!(
        logs.lines_containing("Total sent:").len() as u64,
        reporter.reports_generated()
    );
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_logs_error() -> Result<()> {
    let (logs, _guard) = LogCapture::install();
    let config = report_config("http://127.0.0.1:9/report".to_string());
    let mut reporter = Reporter::builder(config, Arc::new(TrafficStats::new()))
        .interval_override(Duration::from_millis(100))
        .probe_override(Box::new(FixedProbe))
        .build()?;

    reporter.start();
    tokio::time::sleep(Duration::from_millis(450)).await;
    reporter.stop().await;

    let failed = logs.lines_containing("Failed to send report");
    assert!(!failed.is_empty(), "no failure logged: {:?}", logs.lines());
    for line in &failed {
        assert!(line.contains("ERROR"), "expected an error: {}", line);
        assert!(line.contains("127.0.0.1:9"), "expected the url: {}", line);
    }
    assert!(logs.lines_containing("Report delivery rejected").is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_each_tick_logs_totals_sources_and_system() -> Result<()> {
    let (logs, _guard) = LogCapture::install();
    let stats = Arc::new(TrafficStats::new());
    stats.record_send("10.0.0.1", "198.51.100.1:5000", 1_000);
    stats.record_send("10.0.0.2", "198.51.100.1:5000", 1_500);

    let mut reporter = Reporter::builder(report_config(String::new()), stats)
        .probe_override(Box::new(FixedProbe))
        .build()?;

    reporter.start();
    tokio::time::sleep(Duration::from_millis(3_100)).await;
    reporter.stop().await;

    let ticks = reporter.reports_generated();
    assert_eq!(ticks, 3);
    let count = |needle: &str| logs.lines_containing(needle).len() as u64;
    assert_eq!(count("Traffic report:"), ticks);
    assert_eq!(count("Total sent: 2.44 KB (2 packets)"), ticks);
    assert_eq!(count("Source IP [10.0.0.1]: 1000 B"), ticks);
    assert_eq!(count("Source IP [10.0.0.2]: 1.46 KB"), ticks);
    assert_eq!(count("System: CPU cores: 4"), ticks);
    assert_eq!(count("Memory: 64.0/1024.0 MB"), ticks);

    let started = logs.lines_containing("Reporter started");
    assert_eq!(started.len(), 1);
    assert!(started[0].contains("local logs only"));
    assert_eq!(count("Reporter stopped"), 1);
    assert_eq!(count("WARN") + count("ERROR"), 0);
    Ok(())
}
