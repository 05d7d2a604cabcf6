//! ACL rule store
//!
//! Ordered access-control entries evaluated against the declared source
//! address of a packet. First match wins; no match falls through to the
//! zero-trust default block. Patterns are deliberately simple:
//! - `*` matches any source
//! - `X.Y.*` matches by dotted-prefix comparison
//! - anything else is a literal address match
//!
//! No CIDR arithmetic and no IPv6; out of scope for the simulation.

use std::fmt;
use std::net::Ipv4Addr;

/// Verdict attached to a rule or produced by the evaluation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Let the packet through
    Allow,
    /// Silently drop the packet
    Deny,
    /// Dropped by the IPS after a payload signature match
    IpsBlock,
    /// Source locked down by the zero-trust response
    ZeroTrustLock,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "ALLOW",
            Action::Deny => "DENY",
            Action::IpsBlock => "IPS_BLOCK",
            Action::ZeroTrustLock => "ZERO_TRUST_LOCK",
        }
    }

    /// True for every verdict that stops the packet
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Action::Allow)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol tag carried by rules and connection entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source address pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePattern {
    /// `*` - matches any source
    Any,
    /// `X.Y.*` - dotted prefix, stored with its trailing dot
    Prefix(String),
    /// Literal address match
    Exact(Ipv4Addr),
}

impl SourcePattern {
    /// Parse from the textual form used in rule definitions
    pub fn parse(s: &str) -> Option<Self> {
        if s == "*" {
            return Some(SourcePattern::Any);
        }
        if let Some(prefix) = s.strip_suffix('*') {
            // The dot stays in the stored prefix so "192.168.1.*" cannot
            // match 192.168.10.x.
            if prefix.ends_with('.')
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == '.')
            {
                return Some(SourcePattern::Prefix(prefix.to_string()));
            }
            return None;
        }
        s.parse().ok().map(SourcePattern::Exact)
    }

    /// Check whether a source address matches this pattern
    pub fn matches(&self, source: Ipv4Addr) -> bool {
        match self {
            SourcePattern::Any => true,
            SourcePattern::Prefix(prefix) => source.to_string().starts_with(prefix.as_str()),
            SourcePattern::Exact(addr) => *addr == source,
        }
    }
}

impl fmt::Display for SourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcePattern::Any => f.write_str("*"),
            SourcePattern::Prefix(prefix) => write!(f, "{}*", prefix),
            SourcePattern::Exact(addr) => write!(f, "{}", addr),
        }
    }
}

/// A single access-control entry
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// Source pattern; the only field that participates in matching
    pub source: SourcePattern,
    /// Descriptive target shown in the policy table
    pub destination: String,
    /// 0 means any port
    pub port: u16,
    pub protocol: Protocol,
    pub action: Action,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = if self.port == 0 {
            "ANY".to_string()
        } else {
            self.port.to_string()
        };
        write!(
            f,
            "{} \"{}\": source={} dest={} port={} proto={} action={}",
            self.id, self.name, self.source, self.destination, port, self.protocol, self.action
        )
    }
}

/// Ordered rule store, first match wins
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule at the lowest priority position
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Scan rules in order and return the first whose source pattern
    /// matches the given address
    pub fn first_match(&self, source: Ipv4Addr) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.source.matches(source))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rule(id: &str, source: &str, action: Action) -> Rule {
        Rule {
            id: id.to_string(),
            name: format!("rule {}", id),
            source: SourcePattern::parse(source).unwrap(),
            destination: "Host".to_string(),
            port: 0,
            protocol: Protocol::Tcp,
            action,
        }
    }

    #[test]
    fn test_wildcard_matches_anything() {
        let pattern = SourcePattern::parse("*").unwrap();
        assert!(pattern.matches(Ipv4Addr::new(9, 9, 9, 9)));
        assert!(pattern.matches(Ipv4Addr::new(127, 0, 0, 1)));
    }

    #[test]
    fn test_exact_match() {
        let pattern = SourcePattern::parse("127.0.0.1").unwrap();
        assert!(pattern.matches(Ipv4Addr::new(127, 0, 0, 1)));
        assert!(!pattern.matches(Ipv4Addr::new(127, 0, 0, 2)));
    }

    #[test]
    fn test_prefix_match() {
        let pattern = SourcePattern::parse("192.168.1.*").unwrap();
        assert!(pattern.matches(Ipv4Addr::new(192, 168, 1, 50)));
        assert!(pattern.matches(Ipv4Addr::new(192, 168, 1, 254)));
        assert!(!pattern.matches(Ipv4Addr::new(192, 168, 2, 50)));
    }

    #[test]
    fn test_prefix_respects_dot_boundary() {
        // "192.168.1.*" must not match 192.168.10.x
        let pattern = SourcePattern::parse("192.168.1.*").unwrap();
        assert!(!pattern.matches(Ipv4Addr::new(192, 168, 10, 5)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SourcePattern::parse("not-an-ip").is_none());
        assert!(SourcePattern::parse("192.168.*").is_some());
        assert!(SourcePattern::parse("10.*").is_some());
        assert!(SourcePattern::parse("abc.*").is_none());
        assert!(SourcePattern::parse("192*").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let mut rules = RuleSet::new();
        rules.push(make_rule("1", "192.168.1.*", Action::Allow));
        rules.push(make_rule("2", "*", Action::Deny));

        let lan = rules.first_match(Ipv4Addr::new(192, 168, 1, 50)).unwrap();
        assert_eq!(lan.action, Action::Allow);
        assert_eq!(lan.id, "1");

        let other = rules.first_match(Ipv4Addr::new(9, 9, 9, 9)).unwrap();
        assert_eq!(other.action, Action::Deny);
        assert_eq!(other.id, "2");
    }

    #[test]
    fn test_no_match_returns_none() {
        let mut rules = RuleSet::new();
        rules.push(make_rule("1", "10.0.0.1", Action::Allow));
        assert!(rules.first_match(Ipv4Addr::new(9, 9, 9, 9)).is_none());
    }

    #[test]
    fn test_shadowing_order_preserved() {
        let mut rules = RuleSet::new();
        rules.push(make_rule("1", "*", Action::Deny));
        rules.push(make_rule("2", "192.168.1.50", Action::Allow));

        // The wildcard shadows the later allow rule.
        let matched = rules.first_match(Ipv4Addr::new(192, 168, 1, 50)).unwrap();
        assert_eq!(matched.action, Action::Deny);
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::IpsBlock.to_string(), "IPS_BLOCK");
        assert_eq!(Action::ZeroTrustLock.to_string(), "ZERO_TRUST_LOCK");
        assert!(Action::Deny.is_blocking());
        assert!(!Action::Allow.is_blocking());
    }
}
