//! Integration tests for the reporter's metrics counters.
//!
//! Installing a global recorder is process-wide, so this binary holds a
//! single test.

#[path = "../helpers/mod.rs"]
mod helpers;

use anyhow::Result;
use helpers::test_metrics::TestMetrics;
use helpers::FixedProbe;
use shooter_telemetry::config::ReportConfig;
use shooter_telemetry::{Reporter, TrafficStats};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_report_and_delivery_counters() -> Result<()> {
    let recorder = TestMetrics::new();
    metrics::set_global_recorder(recorder.clone())
        .map_err(|e| anyhow::anyhow!("failed to install recorder: {}", e))?;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reject"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let run = |url: String| {
        let config = ReportConfig {
            interval: 1,
            url,
            management_ip: "192.0.2.7".to_string(),
        };
        Reporter::builder(config, Arc::new(TrafficStats::new()))
            .interval_override(Duration::from_millis(100))
            .probe_override(Box::new(FixedProbe))
            .build()
    };

    let mut accepted = run(format!("{}/ok", server.uri()))?;
    accepted.start();
    tokio::time::sleep(Duration::from_millis(350)).await;
    accepted.stop().await;

    let mut rejected = run(format!("{}/reject", server.uri()))?;
    rejected.start();
    tokio::time::sleep(Duration::from_millis(350)).await;
    rejected.stop().await;

    let mut unreachable = run("http://127.0.0.1:9/report".to_string())?;
    unreachable.start();
    tokio::time::sleep(Duration::from_millis(350)).await;
    unreachable.stop().await;

    let successes = recorder.get_counter("report_deliveries_total{outcome=success}");
    let rejections = recorder.get_counter("report_deliveries_total{outcome=rejected}");
    let failures = recorder.get_counter("report_deliveries_total{outcome=failed}");

    assert_eq!(successes, accepted.reports_generated());
    assert_eq!(rejections, rejected.reports_generated());
    assert_eq!(failures, unreachable.reports_generated());
    assert!(successes >= 2 && rejections >= 2 && failures >= 2);

    let total = accepted.reports_generated()
        + rejected.reports_generated()
        + unreachable.reports_generated();
    assert_eq!(recorder.get_counter("reports_generated_total"), total);
    Ok(())
}
