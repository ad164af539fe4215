use std::fmt;
use thiserror::Error;

use super::{AddressResolutionEntry, ForwardingTableEntry, NeighborEntry};

/// Pipeline stage, named after the device table it reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AddressResolution,
    ForwardingTable,
    NeighborDiscovery,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AddressResolution => "ARP table",
            Self::ForwardingTable => "MAC table",
            Self::NeighborDiscovery => "CDP output",
        })
    }
}

/// Lookup key that produced no rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Ip(String),
    Mac(String),
}

impl Entity {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Ip(_) => Stage::AddressResolution,
            Self::Mac(_) => Stage::ForwardingTable,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => f.write_str(ip),
            Self::Mac(mac) => f.write_str(mac),
        }
    }
}

/// Per-branch failure. Never aborts sibling branches or other IPs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unable to find {0} in {stage}", stage = .0.stage())]
    NotFound(Entity),
    #[error("Unable to find any member interfaces in {port}{}", reason_suffix(.reason))]
    ExpansionFailed { port: String, reason: Option<String> },
    #[error("Unable to find {0} in CDP output")]
    NeighborNotFound(String),
    #[error("{stage} query failed: {message}")]
    Query { stage: Stage, message: String },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
}

/// Stage 3 outcome for one physical port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBranch {
    pub entry: ForwardingTableEntry,
    pub neighbor: Result<NeighborEntry, ResolveError>,
}

/// Stages 2 and 3 for one ARP row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBranch {
    pub arp: AddressResolutionEntry,
    pub forwarding: Result<Vec<PortBranch>, ResolveError>,
}

/// ResolutionResult is the full lookup tree for one IP address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub target: String,
    pub outcome: Result<Vec<AddressBranch>, ResolveError>,
}

impl ResolutionResult {
    /// Number of port branches that reached stage 3
    pub fn branch_count(&self) -> usize {
        match &self.outcome {
            Ok(branches) => branches
                .iter()
                .map(|b| b.forwarding.as_ref().map_or(0, Vec::len))
                .sum(),
            Err(_) => 0,
        }
    }
}
