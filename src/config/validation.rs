//! Configuration validation

use super::{Config, NarratorMode};
use crate::engine::SourcePattern;

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn print_diagnostics(&self) {
        for warning in &self.warnings {
            println!("[WARN] {}", warning);
        }
        for error in &self.errors {
            println!("[ERROR] {}", error);
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration and return warnings/errors
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_simulation(config, &mut result);
    validate_rules(config, &mut result);
    validate_narrator(config, &mut result);
    validate_logging(config, &mut result);

    result
}

fn validate_simulation(config: &Config, result: &mut ValidationResult) {
    let sim = &config.simulation;

    if sim.packet_interval_ms == 0 {
        result.error("simulation.packet_interval_ms must be greater than 0");
    }
    if sim.sweep_interval_ms == 0 {
        result.error("simulation.sweep_interval_ms must be greater than 0");
    }
    if !(0.0..=1.0).contains(&sim.malicious_ratio) {
        result.error(format!(
            "simulation.malicious_ratio must be between 0.0 and 1.0 (got {})",
            sim.malicious_ratio
        ));
    }
    if sim.staleness_ms < sim.sweep_interval_ms {
        result.warn(format!(
            "simulation.staleness_ms ({}) is shorter than the sweep interval ({}); connections will rarely survive a sweep",
            sim.staleness_ms, sim.sweep_interval_ms
        ));
    }
}

fn validate_rules(config: &Config, result: &mut ValidationResult) {
    if config.rules.is_empty() {
        result.warn("rules: no rules defined; every source falls through to the default block");
    }

    let mut wildcard_at: Option<usize> = None;
    let mut seen_sources: Vec<&str> = Vec::new();

    for (i, rule) in config.rules.iter().enumerate() {
        match SourcePattern::parse(&rule.source) {
            None => {
                result.error(format!(
                    "rules[{}] \"{}\": invalid source pattern '{}'",
                    i, rule.name, rule.source
                ));
                continue;
            }
            Some(SourcePattern::Any) => {
                if wildcard_at.is_none() {
                    wildcard_at = Some(i);
                }
            }
            Some(_) => {}
        }

        // First match wins, so anything after a wildcard never fires.
        if let Some(w) = wildcard_at {
            if i > w {
                result.warn(format!(
                    "rules[{}] \"{}\": shadowed by the wildcard rule at position {}",
                    i,
                    rule.name,
                    w + 1
                ));
            }
        }

        if seen_sources.contains(&rule.source.as_str()) {
            result.warn(format!(
                "rules[{}] \"{}\": duplicate source pattern '{}'; only the first entry can match",
                i, rule.name, rule.source
            ));
        }
        seen_sources.push(rule.source.as_str());
    }
}

fn validate_narrator(config: &Config, result: &mut ValidationResult) {
    if config.narrator.mode == NarratorMode::Command && config.narrator.command.is_none() {
        result.warn("narrator: command mode without a command set, falling back to 'espeak'");
    }
}

fn validate_logging(config: &Config, result: &mut ValidationResult) {
    let level = config.logging.level.to_lowercase();
    if !["error", "warn", "info", "debug", "trace"].contains(&level.as_str()) {
        result.warn(format!(
            "logging.level: unknown level '{}', using 'info'",
            config.logging.level
        ));
    }
}
