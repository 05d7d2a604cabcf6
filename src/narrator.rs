//! Narrator collaborator
//!
//! Renders pipeline announcements out-of-band, either as a log line or
//! by handing the text to an external speech command. Announcing is
//! best-effort: failures are reported to the caller, which logs and
//! counts them, and never reach the evaluation path.

use crate::config::{NarratorConfig, NarratorMode};
use std::io;
use std::process::{Command, Stdio};
use tracing::info;

/// Out-of-band announcement sink
pub trait Narrator: Send + Sync {
    /// Deliver one plain-text message, best effort
    fn announce(&self, message: &str) -> io::Result<()>;
}

/// Writes announcements to the log stream
#[derive(Debug, Default)]
pub struct LogNarrator;

impl Narrator for LogNarrator {
    fn announce(&self, message: &str) -> io::Result<()> {
        info!(target: "narrator", "{}", message);
        Ok(())
    }
}

/// Pipes announcements to an external speech command (e.g. `espeak`)
#[derive(Debug)]
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Narrator for CommandNarrator {
    fn announce(&self, message: &str) -> io::Result<()> {
        // Fire and forget: the child renders audio on its own time and is
        // never awaited.
        Command::new(&self.program)
            .args(&self.args)
            .arg(format!("System Alert: {}", message))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

/// Discards announcements (narrator disabled, tests)
#[derive(Debug, Default)]
pub struct NullNarrator;

impl Narrator for NullNarrator {
    fn announce(&self, _message: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Build the narrator selected by the configuration
pub fn from_config(config: &NarratorConfig) -> Box<dyn Narrator> {
    match config.mode {
        NarratorMode::Off => Box::new(NullNarrator),
        NarratorMode::Log => Box::new(LogNarrator),
        NarratorMode::Command => Box::new(CommandNarrator::new(
            config.command.clone().unwrap_or_else(|| "espeak".to_string()),
            config.args.clone(),
        )),
    }
}
