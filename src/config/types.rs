//! Configuration types

use crate::engine::{Action, Protocol, Rule, RuleSet, SourcePattern, Toggles};
use crate::sim::DriverTiming;
use crate::telemetry::LogFormat;
use crate::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// User-defined configuration (hostguard.toml)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub modules: ModulesConfig,
    pub rules: Vec<RuleConfig>,
    pub advisor: AdvisorConfig,
    pub narrator: NarratorConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            modules: ModulesConfig::default(),
            rules: default_rules(),
            advisor: AdvisorConfig::default(),
            narrator: NarratorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Build the ordered rule set from the configured entries
    pub fn rule_set(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            rules.push(rule.to_rule(index)?);
        }
        Ok(rules)
    }
}

/// Timing and randomness of the simulation loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Interval between synthesized packets, in milliseconds
    pub packet_interval_ms: u64,
    /// Interval between connection-table sweeps, in milliseconds
    pub sweep_interval_ms: u64,
    /// Idle time after which a connection entry is evicted, in milliseconds
    pub staleness_ms: u64,
    /// Fraction of synthesized packets flagged malicious (0.0 to 1.0)
    pub malicious_ratio: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            packet_interval_ms: 2000,
            sweep_interval_ms: 2500,
            staleness_ms: 12_000,
            malicious_ratio: 0.25,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn timing(&self) -> DriverTiming {
        DriverTiming {
            packet_interval: Duration::from_millis(self.packet_interval_ms),
            sweep_interval: Duration::from_millis(self.sweep_interval_ms),
            staleness: Duration::from_millis(self.staleness_ms),
        }
    }
}

/// Inspection module toggles
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Stateful packet inspection
    pub spi: bool,
    /// Deep packet inspection / IPS
    pub dpi: bool,
    /// Zero-trust incident response
    pub zero_trust_response: bool,
    /// Behavioral analysis
    pub behavioral: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            spi: true,
            dpi: true,
            zero_trust_response: true,
            behavioral: true,
        }
    }
}

impl ModulesConfig {
    pub fn toggles(&self) -> Toggles {
        Toggles {
            spi: self.spi,
            dpi: self.dpi,
            zero_trust_response: self.zero_trust_response,
            behavioral: self.behavioral,
        }
    }
}

/// Protocol tag as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolConfig {
    #[default]
    Tcp,
    Udp,
    Icmp,
}

impl ProtocolConfig {
    pub fn to_protocol(self) -> Protocol {
        match self {
            ProtocolConfig::Tcp => Protocol::Tcp,
            ProtocolConfig::Udp => Protocol::Udp,
            ProtocolConfig::Icmp => Protocol::Icmp,
        }
    }
}

/// Rule verdict as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

impl RuleAction {
    pub fn to_action(self) -> Action {
        match self {
            RuleAction::Allow => Action::Allow,
            RuleAction::Deny => Action::Deny,
        }
    }
}

/// One ACL entry as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    /// Source pattern: literal address, `*`, or a prefix like `192.168.1.*`
    pub source: String,
    #[serde(default = "default_destination")]
    pub destination: String,
    /// 0 means any port
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    pub action: RuleAction,
}

impl RuleConfig {
    /// Convert into an engine rule, assigning an id from the list position
    pub fn to_rule(&self, index: usize) -> Result<Rule> {
        let source =
            SourcePattern::parse(&self.source).ok_or_else(|| Error::Pattern(self.source.clone()))?;
        Ok(Rule {
            id: format!("rule-{}", index + 1),
            name: self.name.clone(),
            source,
            destination: self.destination.clone(),
            port: self.port,
            protocol: self.protocol.to_protocol(),
            action: self.action.to_action(),
        })
    }
}

fn default_destination() -> String {
    "Host".to_string()
}

/// The built-in policy used when no rules are configured
pub fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig {
            name: "Localhost Web Loopback".to_string(),
            source: "127.0.0.1".to_string(),
            destination: "127.0.0.1".to_string(),
            port: 80,
            protocol: ProtocolConfig::Tcp,
            action: RuleAction::Allow,
        },
        RuleConfig {
            name: "Internal LAN Secure Ingress".to_string(),
            source: "192.168.1.*".to_string(),
            destination: "HostSystem".to_string(),
            port: 22,
            protocol: ProtocolConfig::Tcp,
            action: RuleAction::Allow,
        },
        RuleConfig {
            name: "Zero Trust Default Block".to_string(),
            source: "*".to_string(),
            destination: "0.0.0.0".to_string(),
            port: 0,
            protocol: ProtocolConfig::Tcp,
            action: RuleAction::Deny,
        },
    ]
}

/// Advisor API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Base URL of the generative-AI API
    pub base_url: String,
    /// Model used for free-text consultations
    pub consult_model: String,
    /// Model used for structured rule audits
    pub audit_model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            consult_model: "gemini-3-flash-preview".to_string(),
            audit_model: "gemini-3-pro-preview".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

/// How pipeline announcements are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarratorMode {
    Off,
    #[default]
    Log,
    /// Pipe the message to an external speech command
    Command,
}

/// Narrator settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    pub mode: NarratorMode,
    /// Speech program for command mode (defaults to `espeak`)
    pub command: Option<String>,
    /// Extra arguments placed before the message
    pub args: Vec<String>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,
    /// Output format: pretty, compact, json
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
