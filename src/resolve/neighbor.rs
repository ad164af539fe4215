use serde_json::{Map, Value};

use crate::models::{nxos_key, NeighborEntry, ResolveError, Stage};
use crate::search::{field, rows};
use crate::transport::DeviceQuery;

/// CDP identity seen on `port`. The first complete row wins.
pub async fn lookup(device: &dyn DeviceQuery, port: &str) -> Result<NeighborEntry, ResolveError> {
    let doc = device
        .structured_query(&format!("show cdp neighbors interface {}", port))
        .await
        .map_err(|e| ResolveError::Query {
            stage: Stage::NeighborDiscovery,
            message: e.to_string(),
        })?;

    first_neighbor(&doc).ok_or_else(|| ResolveError::NeighborNotFound(port.to_string()))
}

pub fn first_neighbor(doc: &Value) -> Option<NeighborEntry> {
    let candidates = rows(doc, nxos_key::ROW_CDP_NEIGHBOR);
    if candidates.len() > 1 {
        tracing::debug!("{} CDP rows found, using the first", candidates.len());
    }
    candidates.into_iter().find_map(parse_row)
}

fn parse_row(row: &Map<String, Value>) -> Option<NeighborEntry> {
    Some(NeighborEntry {
        platform_id: field(row, nxos_key::CDP_PLATFORM)?,
        device_id: field(row, nxos_key::CDP_DEVICE)?,
        remote_port_id: field(row, nxos_key::CDP_REMOTE_PORT)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeDevice;
    use serde_json::json;

    fn cdp_row(device_id: &str, port_id: &str) -> Value {
        json!({
            "ifindex": "436207616",
            "device_id": device_id,
            "intf_id": "Ethernet1/3",
            "ttl": "163",
            "capability": ["router", "switch"],
            "platform_id": "N9K-C93180YC-EX",
            "port_id": port_id
        })
    }

    #[test]
    fn test_first_row_wins() {
        let doc = json!({"TABLE_cdp_neighbor_brief_info": {"ROW_cdp_neighbor_brief_info": [
            cdp_row("leaf-3", "Ethernet1/49"),
            cdp_row("leaf-4", "Ethernet1/50")
        ]}});
        let neighbor = first_neighbor(&doc).unwrap();
        assert_eq!(neighbor.device_id, "leaf-3");
        assert_eq!(neighbor.remote_port_id, "Ethernet1/49");
        assert_eq!(neighbor.platform_id, "N9K-C93180YC-EX");
    }

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let doc = json!({"TABLE_cdp_neighbor_brief_info": {"ROW_cdp_neighbor_brief_info": [
            {"device_id": "half-row"},
            cdp_row("leaf-4", "Ethernet1/50")
        ]}});
        assert_eq!(first_neighbor(&doc).unwrap().device_id, "leaf-4");
    }

    #[tokio::test]
    async fn test_no_rows_is_neighbor_not_found() {
        let device = FakeDevice::new().with("show cdp neighbors interface Eth1/9", Value::Null);
        let err = lookup(&device, "Eth1/9").await.unwrap_err();
        assert_eq!(err, ResolveError::NeighborNotFound("Eth1/9".to_string()));
    }

    #[tokio::test]
    async fn test_query_failure_names_stage() {
        let device = FakeDevice::new();
        let err = lookup(&device, "Eth1/9").await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Query { stage: Stage::NeighborDiscovery, .. }
        ));
    }
}
