use serde_json::{Map, Value};

use super::port_channel;
use crate::models::{
    nxos_key, parse_flag, AddressResolutionEntry, Entity, EntryType, ForwardingTableEntry,
    ResolveError, Stage,
};
use crate::search::{field, rows};
use crate::transport::{DeviceQuery, QueryError};
use crate::utils::dotted_mac;

/// How a forwarding-table port is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Aggregate,
    VlanInterface,
    Physical,
}

impl PortKind {
    pub fn classify(port: &str) -> Self {
        let matches = |pattern: &str| {
            regex_lite::Regex::new(pattern)
                .map(|re| re.is_match(port.trim()))
                .unwrap_or(false)
        };
        if matches(r"(?i)^(po|port-channel)\s*\d") {
            Self::Aggregate
        } else if matches(r"(?i)^vlan\s*\d") {
            Self::VlanInterface
        } else {
            Self::Physical
        }
    }
}

/// Rows of the forwarding table for one MAC, before port expansion
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRow {
    vlan: String,
    mac_address: String,
    entry_type: EntryType,
    age: String,
    secure: bool,
    notify: bool,
    port: String,
}

/// Resolve the ARP entry's MAC to physical ports, expanding port-channels
pub async fn lookup(
    device: &dyn DeviceQuery,
    arp: &AddressResolutionEntry,
) -> Result<Vec<ForwardingTableEntry>, ResolveError> {
    let mac = dotted_mac(&arp.mac_address);
    let not_found = || ResolveError::NotFound(Entity::Mac(arp.mac_address.clone()));

    let doc = match device
        .structured_query(&format!("show mac address-table address {}", mac))
        .await
    {
        Ok(doc) => doc,
        Err(QueryError::UnstructuredOutput { .. }) => return Err(not_found()),
        Err(e) => {
            return Err(ResolveError::Query {
                stage: Stage::ForwardingTable,
                message: e.to_string(),
            })
        }
    };

    let vlan = arp.vlan_filter();
    let mut entries = Vec::new();
    for row in parse_rows(&doc) {
        if vlan.is_some_and(|v| v != row.vlan) {
            continue;
        }
        match PortKind::classify(&row.port) {
            PortKind::VlanInterface => {
                tracing::debug!("Discarding {} learned on {}", row.mac_address, row.port);
            }
            PortKind::Physical => {
                let port = row.port.clone();
                entries.push(row.into_entry(port.clone(), port));
            }
            PortKind::Aggregate => {
                let members = match port_channel::expand(device, &row.port).await {
                    Ok(members) if !members.is_empty() => members,
                    Ok(_) => {
                        return Err(ResolveError::ExpansionFailed {
                            port: row.port,
                            reason: None,
                        })
                    }
                    Err(e) => {
                        return Err(ResolveError::ExpansionFailed {
                            port: row.port,
                            reason: Some(e.to_string()),
                        })
                    }
                };
                for member in members {
                    entries.push(row.clone().into_entry(member, row.port.clone()));
                }
            }
        }
    }

    if entries.is_empty() {
        return Err(not_found());
    }
    Ok(entries)
}

fn parse_rows(doc: &Value) -> Vec<RawRow> {
    rows(doc, nxos_key::ROW_MAC_ADDRESS)
        .into_iter()
        .filter_map(|row| {
            let parsed = parse_row(row);
            if parsed.is_none() {
                tracing::debug!("Skipping incomplete MAC table row: {:?}", row);
            }
            parsed
        })
        .collect()
}

fn parse_row(row: &Map<String, Value>) -> Option<RawRow> {
    let flag = |key| field(row, key).map(|f| parse_flag(&f)).unwrap_or(false);
    Some(RawRow {
        vlan: field(row, nxos_key::MAC_VLAN)?,
        mac_address: field(row, nxos_key::MAC_ADDRESS)?,
        entry_type: EntryType::parse(&field(row, nxos_key::MAC_TYPE).unwrap_or_default()),
        age: field(row, nxos_key::MAC_AGE).unwrap_or_default(),
        secure: flag(nxos_key::MAC_SECURE),
        notify: flag(nxos_key::MAC_NOTIFY),
        port: field(row, nxos_key::MAC_PORT)?,
    })
}

impl RawRow {
    fn into_entry(self, port: String, parent_port: String) -> ForwardingTableEntry {
        ForwardingTableEntry {
            vlan: self.vlan,
            mac_address: self.mac_address,
            entry_type: self.entry_type,
            age: self.age,
            secure: self.secure,
            notify: self.notify,
            port,
            parent_port,
        }
    }
}
