//! # System Resource Sampler
//!
//! This module defines the `SystemSampler`, which produces a cheap picture of
//! the process's resource footprint for each report.
//!
//! Readings come from a `RuntimeProbe`. The production probe, `ProcessProbe`,
//! reads the core count, the number of alive tokio tasks and memory figures
//! from `sysinfo`. Every probe refresh is timed and recorded in a `PauseRing`
//! so that reports can carry the cycle count and the duration of the most
//! recent refresh.
//!
//! Samples are cached for `SYSTEM_SAMPLE_TTL`. The cache sits behind its own
//! mutex, independent of the traffic counter lock.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use sysinfo::{Pid, System};
use tokio::time::Instant;
use tracing::{debug, warn};

/// How long a computed sample is reused before the probe is read again.
pub const SYSTEM_SAMPLE_TTL: Duration = Duration::from_secs(30);

/// Number of slots in the pause history ring.
pub const PAUSE_RING_CAPACITY: usize = 256;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A resource-usage sample as it appears in reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemStats {
    /// Heuristic: alive tasks per core times ten, clamped to 0..=100.
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub cpu_count: usize,
    pub memory_usage_mb: f64,
    pub memory_total_mb: f64,
    #[serde(rename = "goroutine_count")]
    pub task_count: usize,
    pub gc_count: u32,
    pub gc_pause_ms: f64,
}

/// Raw figures read from the runtime by a probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeReading {
    pub core_count: usize,
    pub task_count: usize,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub cycle_count: u32,
    pub last_pause: Duration,
}

/// A source of runtime figures.
pub trait RuntimeProbe: Send {
    fn read(&mut self) -> RuntimeReading;
}

/// Fixed-capacity ring of recent pause durations.
///
/// The pause of cycle `n` (1-based) lives in slot `(n - 1) % capacity`.
#[derive(Debug, Clone)]
pub struct PauseRing {
    slots: Vec<Duration>,
    count: u32,
}

impl PauseRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Duration::ZERO; capacity.max(1)],
            count: 0,
        }
    }

    /// Records the pause of a newly completed cycle.
    pub fn record(&mut self, pause: Duration) {
        let slot = self.count as usize % self.slots.len();
        self.slots[slot] = pause;
        self.count = self.count.wrapping_add(1);
    }

    /// Number of cycles recorded so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Pause of the most recently completed cycle, zero before the first one.
    pub fn latest(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let slot = (self.count as usize - 1) % self.slots.len();
        self.slots[slot]
    }
}

impl Default for PauseRing {
    fn default() -> Self {
        Self::new(PAUSE_RING_CAPACITY)
    }
}

/// Reads figures for the current process via `sysinfo` and the tokio runtime.
pub struct ProcessProbe {
    system: System,
    pid: Option<Pid>,
    pauses: PauseRing,
}

impl ProcessProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(error = %e, "Failed to get current PID, process memory will read as 0");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
            pauses: PauseRing::default(),
        }
    }

    fn alive_tasks() -> usize {
        tokio::runtime::Handle::try_current()
            .map(|handle| handle.metrics().num_alive_tasks())
            .unwrap_or(0)
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeProbe for ProcessProbe {
    fn read(&mut self) -> RuntimeReading {
        let started = std::time::Instant::now();

        self.system.refresh_memory();
        let memory_used_bytes = match self.pid {
            // `refresh_process` returns false if the process is gone.
            Some(pid) if self.system.refresh_process(pid) => self
                .system
                .process(pid)
                .map(|process| process.memory())
                .unwrap_or(0),
            _ => 0,
        };
        let memory_total_bytes = self.system.total_memory();

        self.pauses.record(started.elapsed());

        RuntimeReading {
            core_count: num_cpus::get(),
            task_count: Self::alive_tasks(),
            memory_used_bytes,
            memory_total_bytes,
            cycle_count: self.pauses.count(),
            last_pause: self.pauses.latest(),
        }
    }
}

/// Turns a raw reading into the reported figures.
pub fn derive_sample(reading: &RuntimeReading) -> SystemStats {
    let cpu_usage = if reading.core_count > 0 {
        (reading.task_count as f64 / reading.core_count as f64 * 10.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let memory_usage_mb = reading.memory_used_bytes as f64 / BYTES_PER_MB;
    let memory_total_mb = reading.memory_total_bytes as f64 / BYTES_PER_MB;
    let memory_usage = if memory_total_mb > 0.0 {
        memory_usage_mb / memory_total_mb * 100.0
    } else {
        0.0
    };

    let gc_pause_ms = if reading.cycle_count == 0 {
        0.0
    } else {
        reading.last_pause.as_secs_f64() * 1000.0
    };

    SystemStats {
        cpu_usage,
        memory_usage,
        cpu_count: reading.core_count,
        memory_usage_mb,
        memory_total_mb,
        task_count: reading.task_count,
        gc_count: reading.cycle_count,
        gc_pause_ms,
    }
}

struct SamplerState {
    probe: Box<dyn RuntimeProbe>,
    cached: Option<(Instant, SystemStats)>,
}

/// A TTL-cached source of `SystemStats`.
pub struct SystemSampler {
    ttl: Duration,
    state: Mutex<SamplerState>,
}

impl SystemSampler {
    pub fn new(probe: Box<dyn RuntimeProbe>) -> Self {
        Self::with_ttl(probe, SYSTEM_SAMPLE_TTL)
    }

    pub fn with_ttl(probe: Box<dyn RuntimeProbe>, ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(SamplerState {
                probe,
                cached: None,
            }),
        }
    }

    /// Returns the cached sample if it is younger than the TTL, otherwise
    /// reads the probe and refreshes the cache.
    pub fn sample(&self) -> SystemStats {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        if let Some((taken_at, sample)) = &state.cached {
            if now.duration_since(*taken_at) < self.ttl {
                return sample.clone();
            }
        }

        let sample = derive_sample(&state.probe.read());
        debug!(
            cpu_count = sample.cpu_count,
            tasks = sample.task_count,
            memory_mb = sample.memory_usage_mb,
            "Refreshed system sample"
        );
        state.cached = Some((now, sample.clone()));
        sample
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new(Box::new(ProcessProbe::new()))
    }
}
