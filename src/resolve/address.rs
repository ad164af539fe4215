use serde_json::{Map, Value};

use crate::models::{nxos_key, AddressResolutionEntry};
use crate::search::{field, rows};
use crate::transport::{DeviceQuery, QueryError};
use crate::utils::normalize_mac;

/// ARP command for one IP, or the whole table when `ip` is `None`
pub fn arp_command(ip: Option<&str>, vrf: &str) -> String {
    match ip {
        Some(ip) => format!("show ip arp {} vrf {}", ip, vrf),
        None => format!("show ip arp vrf {}", vrf),
    }
}

/// Query the ARP table and return every complete row
pub async fn lookup(
    device: &dyn DeviceQuery,
    ip: Option<&str>,
    vrf: &str,
) -> Result<Vec<AddressResolutionEntry>, QueryError> {
    let doc = device.structured_query(&arp_command(ip, vrf)).await?;
    Ok(parse_entries(&doc))
}

pub fn parse_entries(doc: &Value) -> Vec<AddressResolutionEntry> {
    rows(doc, nxos_key::ROW_ADJ)
        .into_iter()
        .filter_map(|row| {
            let entry = parse_row(row);
            if entry.is_none() {
                tracing::debug!("Skipping incomplete ARP row: {:?}", row);
            }
            entry
        })
        .collect()
}

fn parse_row(row: &Map<String, Value>) -> Option<AddressResolutionEntry> {
    Some(AddressResolutionEntry {
        ip_address: field(row, nxos_key::ARP_IP)?,
        timestamp: field(row, nxos_key::ARP_TIMESTAMP).unwrap_or_default(),
        mac_address: normalize_mac(&field(row, nxos_key::ARP_MAC)?),
        egress_interface: field(row, nxos_key::ARP_INTERFACE)?,
    })
}

/// Group entries by IP, keeping first-seen order
pub fn group_by_ip(entries: Vec<AddressResolutionEntry>) -> Vec<(String, Vec<AddressResolutionEntry>)> {
    let mut groups: Vec<(String, Vec<AddressResolutionEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(ip, _)| *ip == entry.ip_address) {
            Some((_, group)) => group.push(entry),
            None => groups.push((entry.ip_address.clone(), vec![entry])),
        }
    }
    groups
}
