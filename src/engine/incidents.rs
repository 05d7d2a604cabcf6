//! Incident log
//!
//! Fixed-capacity record of high-severity events raised by the
//! zero-trust response. Insertion order is recency order: the newest
//! incident sits at the front and overflow evicts the oldest.

use crate::engine::rules::Action;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::net::Ipv4Addr;

/// Number of incidents retained
pub const INCIDENT_CAPACITY: usize = 10;

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded security incident
#[derive(Debug, Clone)]
pub struct Incident {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source_ip: Ipv4Addr,
    pub threat_type: String,
    pub action_taken: Action,
    pub severity: Severity,
}

/// Bounded, append-only incident log
#[derive(Debug)]
pub struct IncidentLog {
    entries: VecDeque<Incident>,
    capacity: usize,
}

impl IncidentLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record an incident, evicting the oldest entry on overflow
    pub fn record(&mut self, incident: Incident) {
        self.entries.push_front(incident);
        self.entries.truncate(self.capacity);
    }

    /// Iterate incidents newest first
    pub fn recent(&self) -> impl Iterator<Item = &Incident> {
        self.entries.iter()
    }

    /// The most recently recorded incident
    pub fn latest(&self) -> Option<&Incident> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IncidentLog {
    fn default() -> Self {
        Self::new(INCIDENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_incident(id: &str) -> Incident {
        Incident {
            id: id.to_string(),
            timestamp: Utc::now(),
            source_ip: Ipv4Addr::new(198, 51, 100, 100),
            threat_type: "Exploit Attempt".to_string(),
            action_taken: Action::ZeroTrustLock,
            severity: Severity::High,
        }
    }

    #[test]
    fn test_record_and_order() {
        let mut log = IncidentLog::default();
        log.record(make_incident("a"));
        log.record(make_incident("b"));

        let ids: Vec<&str> = log.recent().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(log.latest().unwrap().id, "b");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = IncidentLog::new(3);
        for i in 0..5 {
            log.record(make_incident(&format!("i{}", i)));
        }

        assert_eq!(log.len(), 3);
        let ids: Vec<&str> = log.recent().map(|i| i.id.as_str()).collect();
        // Oldest (i0, i1) are gone, newest first.
        assert_eq!(ids, vec!["i4", "i3", "i2"]);
    }

    #[test]
    fn test_default_capacity() {
        let mut log = IncidentLog::default();
        for i in 0..25 {
            log.record(make_incident(&format!("i{}", i)));
        }
        assert_eq!(log.len(), INCIDENT_CAPACITY);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert_eq!(Severity::High.as_str(), "HIGH");
    }
}
