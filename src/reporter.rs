//! The periodic reporter and its lifecycle.
//!
//! A `Reporter` owns exactly one background task. Every interval the task
//! snapshots the traffic counters, samples system resources, assembles a
//! `ReportDocument`, optionally delivers it to a collector and logs a
//! summary. Ticks run to completion one at a time.
//!
//! Shutdown follows the same pattern as the rest of the application: a
//! `watch` channel carries the cancellation signal, and `stop` joins the
//! task rather than aborting it.

use crate::config::{ReportConfig, DEFAULT_REPORT_INTERVAL, MAX_REPORT_INTERVAL};
use crate::delivery::{HttpDelivery, RemoteDelivery};
use crate::error::{DeliveryError, ReporterError};
use crate::formatting::{format_bytes, format_number};
use crate::report::ReportDocument;
use crate::stats::{StatsSnapshot, TrafficStats};
use crate::system::{RuntimeProbe, SystemSampler};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Lifecycle of a `Reporter`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Everything a tick needs, shared between the handle and the task.
struct ReportGenerator {
    stats: Arc<TrafficStats>,
    sampler: SystemSampler,
    delivery: Option<Arc<dyn RemoteDelivery>>,
    management_ip: String,
    started_at: Instant,
    reports_generated: AtomicU64,
}

impl ReportGenerator {
    /// Produces, delivers and logs one report.
    ///
    /// Returns early without logging if encoding fails or if the cancellation
    /// signal arrives while a delivery is in flight.
    async fn generate_report(&self, shutdown_rx: &mut watch::Receiver<bool>) {
        let uptime = self.started_at.elapsed();
        let snapshot = StatsSnapshot::capture(&self.stats, uptime);
        let system = self.sampler.sample();
        let report = ReportDocument::assemble(&self.management_ip, snapshot, system);

        let body = match report.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to generate report");
                return;
            }
        };

        if let Some(delivery) = &self.delivery {
            let outcome = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    debug!(url = delivery.destination(), "Report delivery cancelled by shutdown");
                    return;
                }
                res = delivery.deliver(&body) => res,
            };
            record_delivery_outcome(outcome);
        }

        log_report(&report);
        self.reports_generated.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("reports_generated_total").increment(1);
    }
}

fn record_delivery_outcome(outcome: Result<(), DeliveryError>) {
    let label = match outcome {
        Ok(()) => "success",
        Err(e @ DeliveryError::Status { .. }) => {
            warn!(error = %e, "Report delivery rejected");
            "rejected"
        }
        Err(e) => {
            error!(error = %e, "Failed to send report");
            "failed"
        }
    };
    metrics::counter!("report_deliveries_total", "outcome" => label).increment(1);
}

/// Writes the human-readable rendering of a report.
fn log_report(report: &ReportDocument) {
    let totals = report.totals();
    info!("Traffic report:");
    info!(
        "Total sent: {} ({} packets) | Bandwidth: {:.2} Mbps | Uptime: {:.1}s",
        format_bytes(totals.bytes_sent),
        format_number(totals.packets_sent),
        totals.bandwidth_mbps,
        totals.uptime_seconds
    );

    for (ip, source) in report.sources() {
        info!(
            "Source IP [{}]: {} | {:.2} Mbps | {} packets",
            ip,
            format_bytes(source.bytes_sent),
            source.bandwidth_mbps,
            format_number(source.packets_sent)
        );
    }

    let system = report.system();
    info!(
        "System: CPU cores: {} | CPU (est.): {:.1}% | Memory: {:.1}/{:.1} MB ({:.1}%) | Tasks: {} | Cycles: {} (last {:.3} ms)",
        system.cpu_count,
        system.cpu_usage,
        system.memory_usage_mb,
        system.memory_total_mb,
        system.memory_usage,
        system.task_count,
        system.gc_count,
        system.gc_pause_ms
    );
}

/// Runs ticks until the cancellation signal is observed.
async fn run_report_loop(
    generator: Arc<ReportGenerator>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                debug!("Report loop received shutdown signal.");
                break;
            }
            _ = ticker.tick() => {}
        }

        // A cancellation racing the tick wins.
        if *shutdown_rx.borrow_and_update() {
            debug!("Report loop observed shutdown at tick.");
            break;
        }

        generator.generate_report(&mut shutdown_rx).await;
    }
}

/// Handle to the periodic reporter.
pub struct Reporter {
    generator: Arc<ReportGenerator>,
    interval: Duration,
    state: ReporterState,
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Reporter {
    /// Creates a reporter from configuration with the production probe and,
    /// if a URL is configured, an HTTP delivery.
    pub fn new(config: &ReportConfig, stats: Arc<TrafficStats>) -> Result<Self, ReporterError> {
        ReporterBuilder::new(config.clone(), stats).build()
    }

    /// Creates a new `ReporterBuilder` to construct a `Reporter`.
    pub fn builder(config: ReportConfig, stats: Arc<TrafficStats>) -> ReporterBuilder {
        ReporterBuilder::new(config, stats)
    }

    pub fn state(&self) -> ReporterState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of reports that completed a tick and were logged.
    pub fn reports_generated(&self) -> u64 {
        self.generator.reports_generated.load(Ordering::Relaxed)
    }

    /// Launches the background task. Only valid from `Idle`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.state != ReporterState::Idle {
            warn!(state = ?self.state, "Reporter start ignored");
            return;
        }

        let handle = tokio::spawn(run_report_loop(
            self.generator.clone(),
            self.interval,
            self.shutdown_tx.subscribe(),
        ));
        self.handle = Some(handle);
        self.state = ReporterState::Running;

        match &self.generator.delivery {
            Some(delivery) => info!(
                "Reporter started, interval: {:?}, url: {}",
                self.interval,
                delivery.destination()
            ),
            None => info!("Reporter started, interval: {:?} (local logs only)", self.interval),
        }
    }

    /// Signals cancellation and waits for the background task to exit.
    ///
    /// Once this returns no further report is logged or delivered.
    pub async fn stop(&mut self) {
        match self.state {
            ReporterState::Idle => {
                self.state = ReporterState::Stopped;
                return;
            }
            ReporterState::Stopped => return,
            // A previous `stop` was dropped mid-join; resume waiting.
            ReporterState::Running | ReporterState::Stopping => {}
        }

        self.state = ReporterState::Stopping;
        self.shutdown_tx.send_replace(true);

        // The handle stays in place until the join completes, so a dropped
        // `stop` future can be retried.
        if let Some(handle) = self.handle.as_mut() {
            let result = handle.await;
            self.handle = None;
            if let Err(e) = result {
                error!(error = %e, "Report task panicked during shutdown.");
            }
        }

        self.state = ReporterState::Stopped;
        info!("Reporter stopped");
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown_tx.send_replace(true);
        }
    }
}

/// Builder for `Reporter`.
///
/// The overrides exist so tests can substitute the probe, the delivery and
/// sub-second intervals.
pub struct ReporterBuilder {
    config: ReportConfig,
    stats: Arc<TrafficStats>,
    interval_override: Option<Duration>,
    probe_override: Option<Box<dyn RuntimeProbe>>,
    delivery_override: Option<Arc<dyn RemoteDelivery>>,
}

impl ReporterBuilder {
    pub fn new(config: ReportConfig, stats: Arc<TrafficStats>) -> Self {
        Self {
            config,
            stats,
            interval_override: None,
            probe_override: None,
            delivery_override: None,
        }
    }

    /// Overrides the configured interval. A zero duration selects the default
    /// and anything above `MAX_REPORT_INTERVAL` is capped.
    pub fn interval_override(mut self, interval: Duration) -> Self {
        self.interval_override = Some(interval);
        self
    }

    /// Overrides the runtime probe used by the system sampler.
    pub fn probe_override(mut self, probe: Box<dyn RuntimeProbe>) -> Self {
        self.probe_override = Some(probe);
        self
    }

    /// Overrides the remote delivery, regardless of the configured URL.
    pub fn delivery_override(mut self, delivery: Arc<dyn RemoteDelivery>) -> Self {
        self.delivery_override = Some(delivery);
        self
    }

    pub fn build(self) -> Result<Reporter, ReporterError> {
        let interval = match self.interval_override {
            Some(interval) if !interval.is_zero() => interval.min(MAX_REPORT_INTERVAL),
            Some(_) => DEFAULT_REPORT_INTERVAL,
            None => self.config.effective_interval(),
        };

        let delivery = match self.delivery_override {
            Some(delivery) => Some(delivery),
            None => match self.config.destination() {
                Some(url) => Some(Arc::new(HttpDelivery::new(url)?) as Arc<dyn RemoteDelivery>),
                None => None,
            },
        };

        let sampler = match self.probe_override {
            Some(probe) => SystemSampler::new(probe),
            None => SystemSampler::default(),
        };

        let generator = Arc::new(ReportGenerator {
            stats: self.stats,
            sampler,
            delivery,
            management_ip: self.config.management_ip,
            started_at: Instant::now(),
            reports_generated: AtomicU64::new(0),
        });

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Reporter {
            generator,
            interval,
            state: ReporterState::Idle,
            shutdown_tx,
            handle: None,
        })
    }
}
