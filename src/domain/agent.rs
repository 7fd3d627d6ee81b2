//! Agent Identity
//!
//! Process-wide identity of the defender agent

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Address prefix shared by all agents on the network
pub const ADDRESS_PREFIX: &str = "agent1q";

/// Agent identity, built once at startup and read-only afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub name: String,
    pub address: String,
}

impl AgentIdentity {
    /// Derive the identity from a name and seed; the same seed always yields the same address
    pub fn from_seed(name: impl Into<String>, seed: &str) -> Self {
        Self {
            name: name.into(),
            address: derive_address(seed),
        }
    }
}

fn derive_address(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", ADDRESS_PREFIX, hex)
}
