//! Metrics collection for the simulation.
//!
//! Provides thread-safe counters and gauges describing pipeline verdicts,
//! table occupancy and collaborator health.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for thread-safe increment operations.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increments the counter by 1.
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds a value to the counter.
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Gets the current value of the counter.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Global metrics registry for the simulator.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    // Pipeline verdicts
    /// Packets run through the evaluation pipeline.
    pub packets_evaluated: Counter,
    /// Packets that left through egress.
    pub packets_allowed: Counter,
    /// Packets stopped by policy or the default block.
    pub packets_denied: Counter,
    /// Packets dropped by the IPS after a signature match.
    pub ips_blocks: Counter,
    /// Lockdowns raised by the behavioral stage.
    pub behavioral_locks: Counter,

    // Bookkeeping
    /// Incidents recorded by the zero-trust response.
    pub incidents_recorded: Counter,
    /// Connection entries created at egress.
    pub connections_created: Counter,
    /// Connection entries evicted by the sweep.
    pub connections_expired: Counter,
    /// Announcements the narrator failed to deliver.
    pub narrator_failures: Counter,

    // Table size gauges
    /// Current number of live connection entries.
    connection_count: AtomicU64,
    /// Current number of retained incidents.
    incident_count: AtomicU64,
}

impl MetricsRegistry {
    /// Creates a new metrics registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the connection table gauge.
    pub fn set_connection_count(&self, count: usize) {
        self.connection_count.store(count as u64, Ordering::Relaxed);
    }

    /// Updates the incident log gauge.
    pub fn set_incident_count(&self, count: usize) {
        self.incident_count.store(count as u64, Ordering::Relaxed);
    }

    /// Current number of live connection entries.
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }

    /// Current number of retained incidents.
    pub fn incident_count(&self) -> u64 {
        self.incident_count.load(Ordering::Relaxed)
    }

    /// Exports all metrics as key-value pairs.
    pub fn export(&self) -> Vec<(String, u64)> {
        vec![
            ("packets_evaluated".into(), self.packets_evaluated.get()),
            ("packets_allowed".into(), self.packets_allowed.get()),
            ("packets_denied".into(), self.packets_denied.get()),
            ("ips_blocks".into(), self.ips_blocks.get()),
            ("behavioral_locks".into(), self.behavioral_locks.get()),
            ("incidents_recorded".into(), self.incidents_recorded.get()),
            ("connections_created".into(), self.connections_created.get()),
            ("connections_expired".into(), self.connections_expired.get()),
            ("narrator_failures".into(), self.narrator_failures.get()),
            ("connection_count".into(), self.connection_count()),
            ("incident_count".into(), self.incident_count()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_basic() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);

        counter.inc();
        assert_eq!(counter.get(), 1);

        counter.add(10);
        assert_eq!(counter.get(), 11);
    }

    #[test]
    fn test_gauges() {
        let registry = MetricsRegistry::new();
        registry.set_connection_count(3);
        registry.set_incident_count(7);

        assert_eq!(registry.connection_count(), 3);
        assert_eq!(registry.incident_count(), 7);
    }

    #[test]
    fn test_export_contains_all_metrics() {
        let registry = MetricsRegistry::new();
        registry.packets_evaluated.add(5);
        registry.ips_blocks.inc();
        registry.set_connection_count(2);

        let metrics = registry.export();
        assert!(metrics.contains(&("packets_evaluated".into(), 5)));
        assert!(metrics.contains(&("ips_blocks".into(), 1)));
        assert!(metrics.contains(&("connection_count".into(), 2)));
        assert!(metrics.contains(&("narrator_failures".into(), 0)));
    }
}
