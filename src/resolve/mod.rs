//! IP → MAC → port → CDP neighbor resolution.
//!
//! Each stage issues one query at a time and every failure past stage 1 is
//! recorded in the branch it belongs to, so sibling branches and other IPs
//! still get their outcome.

pub mod address;
pub mod forwarding;
pub mod neighbor;
pub mod port_channel;

use crate::models::{AddressBranch, Entity, PortBranch, ResolutionResult, ResolveError, Stage};
use crate::transport::{DeviceQuery, QueryError};

/// Target that selects the whole ARP table
pub const ALL: &str = "all";

pub struct Pipeline<'a> {
    device: &'a dyn DeviceQuery,
}

impl<'a> Pipeline<'a> {
    pub fn new(device: &'a dyn DeviceQuery) -> Self {
        Self { device }
    }

    /// Resolve `target` (an IPv4 address or [`ALL`]) in routing context `vrf`.
    ///
    /// Only [`QueryError::UnsupportedPlatform`] is returned as an error.
    pub async fn resolve(&self, target: &str, vrf: &str) -> Result<Vec<ResolutionResult>, QueryError> {
        let ip = (target != ALL).then_some(target);
        tracing::debug!("Resolving {} in vrf {}", target, vrf);

        let entries = match address::lookup(self.device, ip, vrf).await {
            Ok(entries) => entries,
            Err(e @ QueryError::UnsupportedPlatform(_)) => return Err(e),
            Err(e) => {
                return Ok(vec![ResolutionResult {
                    target: target.to_string(),
                    outcome: Err(ResolveError::Query {
                        stage: Stage::AddressResolution,
                        message: e.to_string(),
                    }),
                }])
            }
        };

        if entries.is_empty() {
            return Ok(vec![ResolutionResult {
                target: target.to_string(),
                outcome: Err(ResolveError::NotFound(Entity::Ip(target.to_string()))),
            }]);
        }

        let mut results = Vec::new();
        for (ip, group) in address::group_by_ip(entries) {
            let mut branches = Vec::with_capacity(group.len());
            for arp in group {
                tracing::debug!("{} is {} via {} (age {})", arp.ip_address, arp.mac_address, arp.egress_interface, arp.timestamp);
                let forwarding = self.resolve_ports(&arp).await;
                branches.push(AddressBranch { arp, forwarding });
            }
            let result = ResolutionResult {
                target: ip,
                outcome: Ok(branches),
            };
            tracing::debug!("{} resolved to {} port branches", result.target, result.branch_count());
            results.push(result);
        }
        Ok(results)
    }

    async fn resolve_ports(
        &self,
        arp: &crate::models::AddressResolutionEntry,
    ) -> Result<Vec<PortBranch>, ResolveError> {
        let entries = forwarding::lookup(self.device, arp).await?;
        let mut branches = Vec::with_capacity(entries.len());
        for entry in entries {
            tracing::debug!(
                "{} vlan {} on {} (parent {}, member {}): {} age {} secure {} notify {}",
                entry.mac_address,
                entry.vlan,
                entry.port,
                entry.parent_port,
                entry.is_member(),
                entry.entry_type,
                entry.age,
                entry.secure,
                entry.notify
            );
            let neighbor = neighbor::lookup(self.device, &entry.port).await;
            if let Err(e) = &neighbor {
                tracing::debug!("{}: {}", entry.port, e);
            }
            branches.push(PortBranch { entry, neighbor });
        }
        Ok(branches)
    }
}
