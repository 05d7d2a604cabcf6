//! Hostguard - Host Firewall Simulator
//!
//! An educational host-firewall simulator for learning security concepts.
//! Stateful inspection, ACL policy, deep packet inspection and zero-trust
//! lockdown are demonstrated against synthetic traffic; no real packets
//! are captured or enforced.

pub mod advisor;
pub mod config;
pub mod engine;
pub mod error;
pub mod narrator;
pub mod sim;
pub mod telemetry;

pub use error::{Error, Result};
