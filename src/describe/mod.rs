//! Interface descriptions generated from CDP neighbors.

use serde_json::Value;

use crate::models::nxos_key;
use crate::search::{field, rows};
use crate::transport::{DeviceQuery, QueryError};

/// InterfaceDescription names the neighbor seen on a local interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescription {
    pub interface: String,
    pub device_id: String,
    pub port_id: String,
}

impl InterfaceDescription {
    /// Configuration lines that set the description
    pub fn config_lines(&self) -> Vec<String> {
        vec![
            format!("interface {}", self.interface),
            format!("description {} {}", self.device_id, self.port_id),
        ]
    }

    /// Single-line form, as printed
    pub fn command(&self) -> String {
        self.config_lines().join(" ; ")
    }

    /// One description per local interface, first CDP row wins, in switch order
    pub fn from_neighbors(doc: &Value) -> Vec<Self> {
        let mut descriptions: Vec<Self> = Vec::new();
        for row in rows(doc, nxos_key::ROW_CDP_NEIGHBOR) {
            let (Some(interface), Some(device_id), Some(port_id)) = (
                field(row, nxos_key::CDP_LOCAL_INTERFACE),
                field(row, nxos_key::CDP_DEVICE),
                field(row, nxos_key::CDP_REMOTE_PORT),
            ) else {
                tracing::debug!("Skipping incomplete CDP row: {:?}", row);
                continue;
            };
            if descriptions.iter().any(|d| d.interface == interface) {
                continue;
            }
            descriptions.push(Self { interface, device_id, port_id });
        }
        descriptions
    }
}

pub async fn collect(device: &dyn DeviceQuery) -> Result<Vec<InterfaceDescription>, QueryError> {
    let doc = device.structured_query("show cdp neighbors").await?;
    Ok(InterfaceDescription::from_neighbors(&doc))
}

/// Apply every description. Returns how many were applied.
pub async fn apply(device: &dyn DeviceQuery, descriptions: &[InterfaceDescription]) -> usize {
    let mut applied = 0;
    for description in descriptions {
        match device.configure(&description.config_lines()).await {
            Ok(_) => applied += 1,
            Err(e) => {
                tracing::error!("Failed to set description on {}: {}", description.interface, e);
            }
        }
    }
    applied
}
