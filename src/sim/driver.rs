//! Simulation driver
//!
//! Owns every piece of mutable simulation state (rule set, connection
//! table, incident log, packet history) and mutates it from one logical
//! thread of control: a packet tick synthesizes and evaluates a
//! candidate packet, an independent sweep tick ages the connection
//! table. The pipeline itself stays pure; this module applies its
//! side-effect intents.

use crate::config::Config;
use crate::engine::{
    evaluate, Action, ConnectionTable, Evaluation, Incident, IncidentLog, RuleSet, Toggles,
    TraceEntry,
};
use crate::narrator::Narrator;
use crate::sim::{PacketSynthesizer, SyntheticPacket};
use crate::telemetry::MetricsRegistry;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Number of evaluated packets kept in the forensic history
pub const HISTORY_CAPACITY: usize = 15;

/// Timing knobs for the driver loop
#[derive(Debug, Clone, Copy)]
pub struct DriverTiming {
    /// Interval between synthesized packets
    pub packet_interval: Duration,
    /// Interval between connection-table sweeps
    pub sweep_interval: Duration,
    /// Idle time after which a connection entry is evicted
    pub staleness: Duration,
}

impl Default for DriverTiming {
    fn default() -> Self {
        Self {
            packet_interval: Duration::from_millis(2000),
            sweep_interval: Duration::from_millis(2500),
            staleness: Duration::from_secs(12),
        }
    }
}

/// Record of one evaluated packet
#[derive(Debug, Clone)]
pub struct PacketRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub packet: SyntheticPacket,
    pub action: Action,
    pub reason: String,
    pub trace: Vec<TraceEntry>,
}

/// The simulation driver
pub struct Simulator {
    rules: RuleSet,
    toggles: Toggles,
    synthesizer: PacketSynthesizer,
    connections: ConnectionTable,
    incidents: IncidentLog,
    history: VecDeque<PacketRecord>,
    timing: DriverTiming,
    narrator: Box<dyn Narrator>,
    metrics: Arc<MetricsRegistry>,
    rng: StdRng,
}

impl Simulator {
    pub fn new(
        rules: RuleSet,
        toggles: Toggles,
        synthesizer: PacketSynthesizer,
        timing: DriverTiming,
        narrator: Box<dyn Narrator>,
        metrics: Arc<MetricsRegistry>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rules,
            toggles,
            synthesizer,
            connections: ConnectionTable::new(timing.staleness),
            incidents: IncidentLog::default(),
            history: VecDeque::new(),
            timing,
            narrator,
            metrics,
            rng,
        }
    }

    /// Build a simulator from a loaded configuration
    pub fn from_config(
        config: &Config,
        narrator: Box<dyn Narrator>,
        metrics: Arc<MetricsRegistry>,
    ) -> crate::Result<Self> {
        Ok(Self::new(
            config.rule_set()?,
            config.modules.toggles(),
            PacketSynthesizer::new(config.simulation.malicious_ratio),
            config.simulation.timing(),
            narrator,
            metrics,
            config.simulation.seed,
        ))
    }

    /// Synthesize one packet, evaluate it and apply the side effects
    pub fn step(&mut self) -> PacketRecord {
        let packet = self.synthesizer.synthesize(&mut self.rng);
        let evaluation = evaluate(&packet, &self.rules, &self.connections, self.toggles);
        self.apply(packet, evaluation)
    }

    fn apply(&mut self, packet: SyntheticPacket, evaluation: Evaluation) -> PacketRecord {
        let now = Instant::now();

        self.metrics.packets_evaluated.inc();
        match evaluation.action {
            Action::Allow => self.metrics.packets_allowed.inc(),
            Action::Deny => self.metrics.packets_denied.inc(),
            Action::IpsBlock => self.metrics.ips_blocks.inc(),
            Action::ZeroTrustLock => self.metrics.behavioral_locks.inc(),
        }

        if let Some(upsert) = evaluation.connection {
            if !self.connections.contains(upsert.source_ip) {
                let entry = self.connections.establish(
                    upsert.source_ip,
                    upsert.application,
                    now,
                    &mut self.rng,
                );
                debug!(session = entry.id.as_str(), source = %upsert.source_ip, "connection established");
                self.metrics.connections_created.inc();
            }
        }

        if let Some(intent) = evaluation.incident {
            let incident = Incident {
                id: format!("{:05x}", self.rng.gen::<u32>() & 0xf_ffff),
                timestamp: Utc::now(),
                source_ip: intent.source_ip,
                threat_type: intent.threat_type,
                action_taken: intent.action_taken,
                severity: intent.severity,
            };
            warn!(
                source = %incident.source_ip,
                threat = incident.threat_type.as_str(),
                severity = incident.severity.as_str(),
                "incident recorded"
            );
            self.incidents.record(incident);
            self.metrics.incidents_recorded.inc();
        }

        if let Some(message) = &evaluation.announcement {
            if let Err(e) = self.narrator.announce(message) {
                self.metrics.narrator_failures.inc();
                warn!("narrator failed: {}", e);
            }
        }

        self.metrics.set_connection_count(self.connections.len());
        self.metrics.set_incident_count(self.incidents.len());

        let record = PacketRecord {
            id: format!("P-{:08x}", self.rng.gen::<u32>()),
            timestamp: Utc::now(),
            packet,
            action: evaluation.action,
            reason: evaluation.reason,
            trace: evaluation.trace,
        };
        debug!(
            action = record.action.as_str(),
            source = %record.packet.source_ip,
            reason = record.reason.as_str(),
            "packet evaluated"
        );

        self.history.push_front(record.clone());
        self.history.truncate(HISTORY_CAPACITY);
        record
    }

    /// Age the connection table and resample throughput
    pub fn sweep(&mut self) {
        let evicted = self.connections.sweep(Instant::now(), &mut self.rng);
        if evicted > 0 {
            debug!(evicted, "connection sweep");
            self.metrics.connections_expired.add(evicted as u64);
        }
        self.metrics.set_connection_count(self.connections.len());
    }

    /// Run the event loop. Stops after `max_packets` evaluations, or
    /// runs forever when `None`.
    pub async fn run(&mut self, max_packets: Option<u64>) {
        let mut packet_timer = interval(self.timing.packet_interval);
        let mut sweep_timer = interval(self.timing.sweep_interval);
        let mut evaluated = 0u64;

        info!(
            rules = self.rules.len(),
            spi = self.toggles.spi,
            dpi = self.toggles.dpi,
            behavioral = self.toggles.behavioral,
            "simulation started"
        );

        loop {
            tokio::select! {
                _ = packet_timer.tick() => {
                    let record = self.step();
                    if record.action.is_blocking() {
                        info!(
                            action = record.action.as_str(),
                            source = %record.packet.source_ip,
                            reason = record.reason.as_str(),
                            "packet blocked"
                        );
                    }
                    evaluated += 1;
                    if let Some(limit) = max_packets {
                        if evaluated >= limit {
                            break;
                        }
                    }
                }
                _ = sweep_timer.tick() => {
                    self.sweep();
                }
            }
        }

        info!(evaluated, "simulation finished");
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    pub fn incidents(&self) -> &IncidentLog {
        &self.incidents
    }

    /// Evaluated packets, newest first
    pub fn history(&self) -> impl Iterator<Item = &PacketRecord> {
        self.history.iter()
    }
}
