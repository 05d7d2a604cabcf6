//! Core evaluation engine
//!
//! Rule matching, connection tracking, incident recording and the staged
//! packet evaluation pipeline.

mod conntrack;
mod incidents;
mod pipeline;
mod rules;

pub use conntrack::{ConnState, ConnectionEntry, ConnectionTable, DEFAULT_STALENESS};
pub use incidents::{Incident, IncidentLog, Severity, INCIDENT_CAPACITY};
pub use pipeline::{
    evaluate, ConnectionUpsert, Evaluation, IncidentIntent, Stage, StageStatus, Toggles,
    TraceEntry,
};
pub use rules::{Action, Protocol, Rule, RuleSet, SourcePattern};
