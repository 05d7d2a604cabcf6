//! Packet evaluation pipeline
//!
//! Runs one synthetic packet through the inspection stages in fixed
//! order: ingress, stateful inspection, policy match, deep packet
//! inspection, behavioral analysis, egress. Each stage appends a trace
//! entry; later stages only escalate restriction, never turn a block
//! back into an allow.
//!
//! The function is pure: given the same packet, rule set, connection
//! table snapshot and toggles it always produces the same result, and
//! every side effect (connection upsert, incident, announcement) is
//! returned as an intent for the driver to apply.

use crate::engine::conntrack::ConnectionTable;
use crate::engine::incidents::Severity;
use crate::engine::rules::{Action, RuleSet};
use crate::sim::{Application, SyntheticPacket};
use std::net::Ipv4Addr;

/// Reason reported when no stage has made a decision
const DEFAULT_REASON: &str = "Zero Trust: Default Block";

/// Threat label attached to incidents raised by the IPS
const EXPLOIT_THREAT: &str = "Exploit Attempt";

/// Feature toggles for the inspection stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    /// Stateful packet inspection
    pub spi: bool,
    /// Deep packet inspection / IPS
    pub dpi: bool,
    /// Record an incident and announce when the IPS fires
    pub zero_trust_response: bool,
    /// Behavioral analysis guarding the privileged kernel process
    pub behavioral: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            spi: true,
            dpi: true,
            zero_trust_response: true,
            behavioral: true,
        }
    }
}

/// Inspection stage identifiers as they appear in a packet trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingress,
    Spi,
    Acl,
    Dpi,
    Ips,
    Behavioral,
    Egress,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ingress => "INGRESS",
            Stage::Spi => "SPI",
            Stage::Acl => "ACL",
            Stage::Dpi => "DPI",
            Stage::Ips => "IPS",
            Stage::Behavioral => "AI",
            Stage::Egress => "EGRESS",
        }
    }
}

/// Outcome of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Passed,
    Blocked,
    Alert,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Passed => "passed",
            StageStatus::Blocked => "blocked",
            StageStatus::Alert => "alert",
        }
    }
}

/// One step of the per-packet inspection trace
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub stage: Stage,
    pub status: StageStatus,
    pub detail: String,
}

impl TraceEntry {
    fn new(stage: Stage, status: StageStatus, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status,
            detail: detail.into(),
        }
    }
}

/// Request to create a connection entry for an allowed packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionUpsert {
    pub source_ip: Ipv4Addr,
    pub application: Application,
}

/// Incident raised by the zero-trust response. Id and timestamp are
/// assigned by the driver when the intent is applied, keeping the
/// pipeline free of hidden state.
#[derive(Debug, Clone)]
pub struct IncidentIntent {
    pub source_ip: Ipv4Addr,
    pub threat_type: String,
    pub action_taken: Action,
    pub severity: Severity,
}

/// Complete result of evaluating one packet
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub action: Action,
    pub reason: String,
    pub trace: Vec<TraceEntry>,
    pub connection: Option<ConnectionUpsert>,
    pub incident: Option<IncidentIntent>,
    pub announcement: Option<String>,
}

/// Evaluate one packet against the rule store and connection table
pub fn evaluate(
    packet: &SyntheticPacket,
    rules: &RuleSet,
    connections: &ConnectionTable,
    toggles: Toggles,
) -> Evaluation {
    let mut trace = Vec::new();
    let mut action = Action::Deny;
    let mut reason = DEFAULT_REASON.to_string();
    let mut connection = None;
    let mut incident = None;
    let mut announcement = None;

    // Ingress always passes and records the declared source.
    trace.push(TraceEntry::new(
        Stage::Ingress,
        StageStatus::Passed,
        format!("Arrived from {}", packet.source_ip),
    ));

    // Stateful inspection: a matching established flow supersedes the
    // default-deny posture but later stages still run.
    if toggles.spi {
        if let Some(entry) = connections.get(packet.source_ip) {
            action = Action::Allow;
            reason = "SPI: Matching Established Flow".to_string();
            trace.push(TraceEntry::new(
                Stage::Spi,
                StageStatus::Passed,
                format!("Valid session: {}", entry.id),
            ));
        }
    }

    // Policy match, only while the default deny still stands.
    if action == Action::Deny {
        if let Some(rule) = rules.first_match(packet.source_ip) {
            action = rule.action;
            reason = format!("Policy Enforcement: {}", rule.name);
            let status = if action == Action::Allow {
                StageStatus::Passed
            } else {
                StageStatus::Blocked
            };
            trace.push(TraceEntry::new(Stage::Acl, status, reason.clone()));
        }
    }

    // Deep packet inspection: a signature hit drops an allowed packet.
    if action == Action::Allow && toggles.dpi && packet.malicious {
        action = Action::IpsBlock;
        reason = "IPS: Deep Packet Inspection Block".to_string();
        trace.push(TraceEntry::new(
            Stage::Dpi,
            StageStatus::Alert,
            "Signature Match Detected",
        ));
        trace.push(TraceEntry::new(
            Stage::Ips,
            StageStatus::Blocked,
            "Connection Dropped",
        ));

        if toggles.zero_trust_response {
            incident = Some(IncidentIntent {
                source_ip: packet.source_ip,
                threat_type: EXPLOIT_THREAT.to_string(),
                action_taken: Action::ZeroTrustLock,
                severity: Severity::High,
            });
            announcement = Some(format!(
                "Attack blocked from {}. Enforcing Zero Trust Lockdown.",
                packet.source_ip
            ));
        }
    }

    // Behavioral analysis guards the privileged kernel process.
    if action == Action::Allow
        && toggles.behavioral
        && packet.malicious
        && packet.target_application.is_privileged()
    {
        action = Action::ZeroTrustLock;
        reason = "AI: Suspicious Behavioral Anomaly".to_string();
        trace.push(TraceEntry::new(
            Stage::Behavioral,
            StageStatus::Blocked,
            "Pattern mismatch on core system",
        ));
    }

    // Egress: allowed packets leave and establish state for their source.
    if action == Action::Allow {
        trace.push(TraceEntry::new(
            Stage::Egress,
            StageStatus::Passed,
            format!("Sent to {}", packet.target_application),
        ));
        connection = Some(ConnectionUpsert {
            source_ip: packet.source_ip,
            application: packet.target_application,
        });
    }

    Evaluation {
        action,
        reason,
        trace,
        connection,
        incident,
        announcement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::{Protocol, Rule, SourcePattern};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Instant;

    fn make_packet(source: Ipv4Addr, app: Application, malicious: bool) -> SyntheticPacket {
        SyntheticPacket {
            source_ip: source,
            source_label: "test host",
            target_application: app,
            malicious,
            payload: if malicious {
                "EXPLOIT: SQL_INJECT".to_string()
            } else {
                "GET /index.html HTTP/1.1 Host: Local".to_string()
            },
        }
    }

    fn make_rule(source: &str, action: Action) -> Rule {
        Rule {
            id: "r1".to_string(),
            name: "test rule".to_string(),
            source: SourcePattern::parse(source).unwrap(),
            destination: "Host".to_string(),
            port: 0,
            protocol: Protocol::Tcp,
            action,
        }
    }

    fn rules_with(source: &str, action: Action) -> RuleSet {
        let mut rules = RuleSet::new();
        rules.push(make_rule(source, action));
        rules
    }

    fn table_with(source: Ipv4Addr) -> ConnectionTable {
        let mut table = ConnectionTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        table.establish(source, Application::WebServer, Instant::now(), &mut rng);
        table
    }

    #[test]
    fn test_default_block_when_nothing_matches() {
        let packet = make_packet(Ipv4Addr::new(9, 9, 9, 9), Application::WebServer, false);
        let result = evaluate(
            &packet,
            &RuleSet::new(),
            &ConnectionTable::default(),
            Toggles::default(),
        );

        assert_eq!(result.action, Action::Deny);
        assert_eq!(result.reason, "Zero Trust: Default Block");
        assert_eq!(result.trace.len(), 1);
        assert_eq!(result.trace[0].stage, Stage::Ingress);
        assert!(result.connection.is_none());
        assert!(result.incident.is_none());
    }

    #[test]
    fn test_wildcard_deny_cites_matched_rule() {
        let packet = make_packet(Ipv4Addr::new(9, 9, 9, 9), Application::WebServer, false);
        let toggles = Toggles {
            spi: false,
            dpi: false,
            ..Toggles::default()
        };
        let result = evaluate(
            &packet,
            &rules_with("*", Action::Deny),
            &ConnectionTable::default(),
            toggles,
        );

        assert_eq!(result.action, Action::Deny);
        assert_eq!(result.reason, "Policy Enforcement: test rule");
        let acl = &result.trace[1];
        assert_eq!(acl.stage, Stage::Acl);
        assert_eq!(acl.status, StageStatus::Blocked);
    }

    #[test]
    fn test_allowed_packet_creates_connection() {
        let source = Ipv4Addr::new(192, 168, 1, 50);
        let packet = make_packet(source, Application::WebServer, false);
        let result = evaluate(
            &packet,
            &rules_with("192.168.1.*", Action::Allow),
            &ConnectionTable::default(),
            Toggles::default(),
        );

        assert_eq!(result.action, Action::Allow);
        assert_eq!(result.reason, "Policy Enforcement: test rule");
        assert_eq!(
            result.connection,
            Some(ConnectionUpsert {
                source_ip: source,
                application: Application::WebServer,
            })
        );
        let last = result.trace.last().unwrap();
        assert_eq!(last.stage, Stage::Egress);
        assert_eq!(last.status, StageStatus::Passed);
    }

    #[test]
    fn test_spi_supersedes_default_deny() {
        let source = Ipv4Addr::new(192, 168, 1, 50);
        let packet = make_packet(source, Application::WebServer, false);
        let result = evaluate(
            &packet,
            &RuleSet::new(),
            &table_with(source),
            Toggles::default(),
        );

        assert_eq!(result.action, Action::Allow);
        assert_eq!(result.reason, "SPI: Matching Established Flow");
        // First trace stage after ingress is SPI: passed.
        assert_eq!(result.trace[1].stage, Stage::Spi);
        assert_eq!(result.trace[1].status, StageStatus::Passed);
    }

    #[test]
    fn test_spi_disabled_ignores_connection() {
        let source = Ipv4Addr::new(192, 168, 1, 50);
        let packet = make_packet(source, Application::WebServer, false);
        let toggles = Toggles {
            spi: false,
            ..Toggles::default()
        };
        let result = evaluate(&packet, &RuleSet::new(), &table_with(source), toggles);

        assert_eq!(result.action, Action::Deny);
        assert_eq!(result.reason, "Zero Trust: Default Block");
    }

    #[test]
    fn test_dpi_escalates_allow_to_ips_block() {
        let source = Ipv4Addr::new(192, 168, 1, 50);
        let packet = make_packet(source, Application::WebServer, true);
        let result = evaluate(
            &packet,
            &rules_with("*", Action::Allow),
            &ConnectionTable::default(),
            Toggles::default(),
        );

        assert_eq!(result.action, Action::IpsBlock);
        assert_eq!(result.reason, "IPS: Deep Packet Inspection Block");
        // Signature alert followed by the connection drop.
        let dpi = &result.trace[2];
        let ips = &result.trace[3];
        assert_eq!((dpi.stage, dpi.status), (Stage::Dpi, StageStatus::Alert));
        assert_eq!((ips.stage, ips.status), (Stage::Ips, StageStatus::Blocked));
        // Blocked packets never establish state.
        assert!(result.connection.is_none());
    }

    #[test]
    fn test_zero_trust_response_raises_one_incident() {
        let source = Ipv4Addr::new(198, 51, 100, 100);
        let packet = make_packet(source, Application::WebServer, true);
        let result = evaluate(
            &packet,
            &rules_with("*", Action::Allow),
            &ConnectionTable::default(),
            Toggles::default(),
        );

        let incident = result.incident.expect("incident intent");
        assert_eq!(incident.source_ip, source);
        assert_eq!(incident.severity, Severity::High);
        assert_eq!(incident.action_taken, Action::ZeroTrustLock);
        assert_eq!(incident.threat_type, "Exploit Attempt");
        assert!(result
            .announcement
            .as_deref()
            .unwrap()
            .contains("198.51.100.100"));
    }

    #[test]
    fn test_zero_trust_response_disabled_suppresses_incident() {
        let packet = make_packet(Ipv4Addr::new(192, 168, 1, 50), Application::WebServer, true);
        let toggles = Toggles {
            zero_trust_response: false,
            ..Toggles::default()
        };
        let result = evaluate(
            &packet,
            &rules_with("*", Action::Allow),
            &ConnectionTable::default(),
            toggles,
        );

        assert_eq!(result.action, Action::IpsBlock);
        assert!(result.incident.is_none());
        assert!(result.announcement.is_none());
    }

    #[test]
    fn test_behavioral_locks_privileged_target() {
        let packet = make_packet(Ipv4Addr::new(192, 168, 1, 50), Application::Kernel, true);
        let toggles = Toggles {
            dpi: false,
            ..Toggles::default()
        };
        let result = evaluate(
            &packet,
            &rules_with("*", Action::Allow),
            &ConnectionTable::default(),
            toggles,
        );

        assert_eq!(result.action, Action::ZeroTrustLock);
        assert_eq!(result.reason, "AI: Suspicious Behavioral Anomaly");
        let last = result.trace.last().unwrap();
        assert_eq!(last.stage, Stage::Behavioral);
        assert_eq!(last.status, StageStatus::Blocked);
    }

    #[test]
    fn test_dpi_runs_before_behavioral() {
        // Both stages would fire; DPI comes first in the fixed order.
        let packet = make_packet(Ipv4Addr::new(192, 168, 1, 50), Application::Kernel, true);
        let result = evaluate(
            &packet,
            &rules_with("*", Action::Allow),
            &ConnectionTable::default(),
            Toggles::default(),
        );

        assert_eq!(result.action, Action::IpsBlock);
    }

    #[test]
    fn test_behavioral_ignores_unprivileged_target() {
        let packet = make_packet(Ipv4Addr::new(192, 168, 1, 50), Application::DbAgent, true);
        let toggles = Toggles {
            dpi: false,
            ..Toggles::default()
        };
        let result = evaluate(
            &packet,
            &rules_with("*", Action::Allow),
            &ConnectionTable::default(),
            toggles,
        );

        // Without DPI and with an unprivileged target the packet passes.
        assert_eq!(result.action, Action::Allow);
        assert!(result.connection.is_some());
    }

    #[test]
    fn test_blocked_packet_never_reaches_dpi() {
        let packet = make_packet(Ipv4Addr::new(9, 9, 9, 9), Application::WebServer, true);
        let result = evaluate(
            &packet,
            &rules_with("*", Action::Deny),
            &ConnectionTable::default(),
            Toggles::default(),
        );

        // The deny stands; DPI only inspects allowed traffic.
        assert_eq!(result.action, Action::Deny);
        assert!(result.trace.iter().all(|t| t.stage != Stage::Dpi));
        assert!(result.incident.is_none());
    }

    #[test]
    fn test_malicious_spi_flow_still_escalates() {
        let source = Ipv4Addr::new(192, 168, 1, 50);
        let packet = make_packet(source, Application::WebServer, true);
        let result = evaluate(
            &packet,
            &RuleSet::new(),
            &table_with(source),
            Toggles::default(),
        );

        // SPI allowed the flow, then DPI escalated.
        assert_eq!(result.trace[1].stage, Stage::Spi);
        assert_eq!(result.action, Action::IpsBlock);
    }
}
