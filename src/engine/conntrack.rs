//! Connection table for stateful inspection
//!
//! Tracks established flows keyed by source address; at most one entry
//! per source. An entry is created when a packet from a new source is
//! allowed through and removed once idle past the staleness window.
//! A periodic sweep resamples the displayed throughput of every live
//! entry and evicts stale ones.

use crate::engine::rules::Protocol;
use crate::sim::Application;
use rand::Rng;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// Idle time after which an entry is evicted
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(12);

/// Throughput sampling range in bits per second
const MIN_THROUGHPUT_BPS: u64 = 1_000;
const MAX_THROUGHPUT_BPS: u64 = 10_000;

/// Throughput a fresh entry starts with, before the first resample
const INITIAL_THROUGHPUT_BPS: u64 = 2_500;

/// Service port recorded on fresh entries
const SERVICE_PORT: u16 = 80;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Seen but not yet validated
    New,
    /// Validated flow; inbound packets from this source pass SPI
    Established,
}

impl ConnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnState::New => "NEW",
            ConnState::Established => "ESTABLISHED",
        }
    }
}

/// Established-flow metadata
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub id: String,
    pub source_ip: Ipv4Addr,
    pub destination: String,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: Protocol,
    pub state: ConnState,
    /// Set at creation and deliberately never refreshed; an entry lives
    /// at most one staleness window and is recreated on the next
    /// allowed packet.
    pub last_seen: Instant,
    pub packet_count: u64,
    pub bytes_transferred: u64,
    pub throughput_bps: u64,
    pub application: Application,
}

/// Connection table keyed by source address
#[derive(Debug)]
pub struct ConnectionTable {
    entries: HashMap<Ipv4Addr, ConnectionEntry>,
    staleness: Duration,
}

impl ConnectionTable {
    pub fn new(staleness: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            staleness,
        }
    }

    /// Lookup the entry for a source address
    pub fn get(&self, source: Ipv4Addr) -> Option<&ConnectionEntry> {
        self.entries.get(&source)
    }

    /// Check whether a source has an established flow
    pub fn contains(&self, source: Ipv4Addr) -> bool {
        self.entries.contains_key(&source)
    }

    /// Create an entry for a newly allowed source. If the source already
    /// has an entry it is returned unchanged; `last_seen` is not touched.
    pub fn establish<R: Rng>(
        &mut self,
        source: Ipv4Addr,
        application: Application,
        now: Instant,
        rng: &mut R,
    ) -> &ConnectionEntry {
        self.entries.entry(source).or_insert_with(|| ConnectionEntry {
            id: format!("F-{:04x}", rng.gen::<u16>()),
            source_ip: source,
            destination: "Host".to_string(),
            src_port: rng.gen_range(49152..=u16::MAX),
            dst_port: SERVICE_PORT,
            protocol: Protocol::Tcp,
            state: ConnState::Established,
            last_seen: now,
            packet_count: 1,
            bytes_transferred: 1024,
            throughput_bps: INITIAL_THROUGHPUT_BPS,
            application,
        })
    }

    /// Resample throughput for every live entry and evict entries idle
    /// past the staleness window. Returns the number evicted.
    pub fn sweep<R: Rng>(&mut self, now: Instant, rng: &mut R) -> usize {
        for entry in self.entries.values_mut() {
            entry.throughput_bps = rng.gen_range(MIN_THROUGHPUT_BPS..MAX_THROUGHPUT_BPS);
        }

        let before = self.entries.len();
        let staleness = self.staleness;
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_seen) < staleness);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConnectionTable {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS)
    }
}
