//! Configuration management
//!
//! Handles the simulator's TOML configuration: loop timing, inspection
//! module toggles, the ACL rule set and collaborator settings.

mod types;
mod validation;

pub use types::*;
pub use validation::{validate, ValidationResult};

use crate::{Error, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let config: Config = toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
    Ok(config)
}

/// Load from `path` if it exists, otherwise fall back to the built-in
/// defaults
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    if path.as_ref().exists() {
        load(path)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[simulation]
packet_interval_ms = 500
malicious_ratio = 0.5

[modules]
dpi = false

[[rules]]
name = "allow lan"
source = "192.168.1.*"
action = "allow"
"#
        )
        .unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.simulation.packet_interval_ms, 500);
        assert_eq!(config.simulation.malicious_ratio, 0.5);
        // Unset fields keep their defaults.
        assert_eq!(config.simulation.sweep_interval_ms, 2500);
        assert!(!config.modules.dpi);
        assert!(config.modules.spi);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].source, "192.168.1.*");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            load("/nonexistent/hostguard.toml"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let config = load_or_default("/nonexistent/hostguard.toml").unwrap();
        assert_eq!(config.rules.len(), 3);
        assert_eq!(config.simulation.staleness_ms, 12_000);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [").unwrap();
        assert!(matches!(load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_rule_set_converts() {
        let config = Config::default();
        let rules = config.rule_set().unwrap();
        assert_eq!(rules.len(), 3);
        // The built-in policy ends with the zero-trust wildcard.
        let last = rules.iter().last().unwrap();
        assert_eq!(last.source, crate::engine::SourcePattern::Any);
    }
}
