//! Shared fakes for the integration tests.

#![allow(dead_code)]


use shooter_telemetry::system::{RuntimeProbe, RuntimeReading};
use std::time::Duration;

/// A probe that always reports the same figures.
pub struct FixedProbe;

impl RuntimeProbe for FixedProbe {
    fn read(&mut self) -> RuntimeReading {
        RuntimeReading {
            core_count: 4,
            task_count: 2,
            memory_used_bytes: 64 * 1024 * 1024,
            memory_total_bytes: 1024 * 1024 * 1024,
            cycle_count: 1,
            last_pause: Duration::from_micros(750),
        }
    }
}
