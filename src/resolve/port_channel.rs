use serde_json::Value;

use crate::models::nxos_key;
use crate::search::find_key;
use crate::transport::{DeviceQuery, QueryError};

/// Member ports of a port-channel, in the order the switch lists them.
/// An empty list means the summary named no members.
pub async fn expand(device: &dyn DeviceQuery, port: &str) -> Result<Vec<String>, QueryError> {
    let doc = device
        .structured_query(&format!("show port-channel summary interface {}", port))
        .await?;
    Ok(members(&doc))
}

pub fn members(doc: &Value) -> Vec<String> {
    find_key(doc, nxos_key::PORT_CHANNEL_MEMBER, None)
        .unwrap_or_default()
        .into_iter()
        .filter_map(Value::as_str)
        .map(|port| port.trim().to_string())
        .filter(|port| !port.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeDevice;
    use serde_json::json;

    #[test]
    fn test_members_from_summary() {
        let doc = json!({"TABLE_channel": {"ROW_channel": {
            "group": "2",
            "port-channel": "port-channel2",
            "layer": "S",
            "status": "U",
            "type": "Eth",
            "prtcl": "LACP",
            "TABLE_member": {"ROW_member": [
                {"port": "Ethernet1/3", "port-status": "P"},
                {"port": "Ethernet1/4", "port-status": "P"}
            ]}
        }}});
        assert_eq!(members(&doc), vec!["Ethernet1/3", "Ethernet1/4"]);
    }

    #[test]
    fn test_members_single_member_and_none() {
        let single = json!({"TABLE_channel": {"ROW_channel": {"TABLE_member": {"ROW_member": {"port": "Eth1/7"}}}}});
        assert_eq!(members(&single), vec!["Eth1/7"]);

        let empty = json!({"TABLE_channel": {"ROW_channel": {"port-channel": "port-channel9"}}});
        assert!(members(&empty).is_empty());
        assert!(members(&Value::Null).is_empty());
    }

    #[tokio::test]
    async fn test_expand_propagates_query_errors() {
        let device = FakeDevice::new().with_error(
            "show port-channel summary interface po5",
            QueryError::Transport("timed out".to_string()),
        );
        let err = expand(&device, "po5").await.unwrap_err();
        assert_eq!(err, QueryError::Transport("timed out".to_string()));
    }
}
