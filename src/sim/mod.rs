//! Simulation layer
//!
//! Synthesizes candidate packets and drives the evaluation loop.

mod driver;
mod packet;

pub use driver::{DriverTiming, PacketRecord, Simulator, HISTORY_CAPACITY};
pub use packet::{
    Application, PacketSynthesizer, SyntheticPacket, EXPLOIT_SIGNATURES, SOURCE_HOSTS,
};
