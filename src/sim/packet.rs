//! Synthetic packet model
//!
//! The driver synthesizes candidate packets from a small cast of
//! simulated hosts and applications; the evaluation pipeline treats them
//! as opaque input and performs no generation logic itself.

use rand::Rng;
use std::fmt;
use std::net::Ipv4Addr;

/// Simulated source hosts: address and display label
pub const SOURCE_HOSTS: [(Ipv4Addr, &str); 3] = [
    (Ipv4Addr::new(192, 168, 1, 50), "Internal LAN Device"),
    (Ipv4Addr::new(198, 51, 100, 100), "External Cloud Host"),
    (Ipv4Addr::new(127, 0, 0, 1), "Loopback Interface"),
];

/// Payload signatures embedded in malicious packets
pub const EXPLOIT_SIGNATURES: [&str; 4] =
    ["SQL_INJECT", "SHELLCODE_EXEC", "MALWARE_DATA", "XSS_PAYLOAD"];

/// Filler payload for benign packets
const BENIGN_PAYLOAD: &str = "GET /index.html HTTP/1.1 Host: Local";

/// Target applications a packet can be addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Application {
    Kernel,
    WebServer,
    DbAgent,
    UnknownBinary,
    Messenger,
}

impl Application {
    pub const ALL: [Application; 5] = [
        Application::Kernel,
        Application::WebServer,
        Application::DbAgent,
        Application::UnknownBinary,
        Application::Messenger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Application::Kernel => "Kernel",
            Application::WebServer => "Web_Server",
            Application::DbAgent => "DB_Agent",
            Application::UnknownBinary => "Unknown.bin",
            Application::Messenger => "Discord.exe",
        }
    }

    /// The kernel process is the privileged target guarded by the
    /// behavioral stage.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Application::Kernel)
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate packet handed to the evaluation pipeline
#[derive(Debug, Clone)]
pub struct SyntheticPacket {
    pub source_ip: Ipv4Addr,
    pub source_label: &'static str,
    pub target_application: Application,
    /// Set by the synthesizer; the DPI stage inspects this flag, not the
    /// payload text
    pub malicious: bool,
    pub payload: String,
}

/// Randomized packet source
#[derive(Debug, Clone)]
pub struct PacketSynthesizer {
    malicious_ratio: f64,
}

impl PacketSynthesizer {
    pub fn new(malicious_ratio: f64) -> Self {
        Self {
            malicious_ratio: malicious_ratio.clamp(0.0, 1.0),
        }
    }

    /// Draw one candidate packet from the injected randomness source
    pub fn synthesize<R: Rng>(&self, rng: &mut R) -> SyntheticPacket {
        let (source_ip, source_label) = SOURCE_HOSTS[rng.gen_range(0..SOURCE_HOSTS.len())];
        let target_application = Application::ALL[rng.gen_range(0..Application::ALL.len())];
        let malicious = rng.gen_bool(self.malicious_ratio);
        let payload = if malicious {
            let signature = EXPLOIT_SIGNATURES[rng.gen_range(0..EXPLOIT_SIGNATURES.len())];
            format!("EXPLOIT: {}", signature)
        } else {
            BENIGN_PAYLOAD.to_string()
        };

        SyntheticPacket {
            source_ip,
            source_label,
            target_application,
            malicious,
            payload,
        }
    }
}

impl Default for PacketSynthesizer {
    fn default() -> Self {
        Self::new(0.25)
    }
}
