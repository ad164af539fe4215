mod resolution;

pub use resolution::*;

/// NX-OS structured-output keys used by the lookups
pub mod nxos_key {
    pub const ROW_ADJ: &str = "ROW_adj";
    pub const ARP_IP: &str = "ip-addr-out";
    pub const ARP_TIMESTAMP: &str = "time-stamp";
    pub const ARP_MAC: &str = "mac";
    pub const ARP_INTERFACE: &str = "intf-out";

    pub const ROW_MAC_ADDRESS: &str = "ROW_mac_address";
    pub const MAC_VLAN: &str = "disp_vlan";
    pub const MAC_ADDRESS: &str = "disp_mac_addr";
    pub const MAC_TYPE: &str = "disp_type";
    pub const MAC_AGE: &str = "disp_age";
    pub const MAC_SECURE: &str = "disp_is_secure";
    pub const MAC_NOTIFY: &str = "disp_is_ntfy";
    pub const MAC_PORT: &str = "disp_port";

    pub const PORT_CHANNEL_MEMBER: &str = "port";

    pub const ROW_CDP_NEIGHBOR: &str = "ROW_cdp_neighbor_brief_info";
    pub const CDP_LOCAL_INTERFACE: &str = "intf_id";
    pub const CDP_PLATFORM: &str = "platform_id";
    pub const CDP_DEVICE: &str = "device_id";
    pub const CDP_REMOTE_PORT: &str = "port_id";

    pub const HOST_NAME: &str = "host_name";
}

/// AddressResolutionEntry is one row of the ARP table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressResolutionEntry {
    pub ip_address: String,
    /// Device-local age, kept as reported
    pub timestamp: String,
    /// Canonical lowercase colon form
    pub mac_address: String,
    pub egress_interface: String,
}

impl AddressResolutionEntry {
    /// VLAN number when the egress interface is a VLAN interface (`Vlan100` -> `100`)
    pub fn vlan_filter(&self) -> Option<&str> {
        self.egress_interface
            .split_once("Vlan")
            .map(|(_, vlan)| vlan.trim())
            .filter(|vlan| !vlan.is_empty())
    }
}

/// MAC address table entry type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryType {
    Dynamic,
    Static,
    Other(String),
}

impl EntryType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dynamic" => Self::Dynamic,
            "static" => Self::Static,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dynamic => f.write_str("dynamic"),
            Self::Static => f.write_str("static"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// ForwardingTableEntry is one row of the MAC address table, resolved to a physical port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingTableEntry {
    pub vlan: String,
    pub mac_address: String,
    pub entry_type: EntryType,
    pub age: String,
    pub secure: bool,
    pub notify: bool,
    /// Physical port the MAC was learned on (a member port after expansion)
    pub port: String,
    /// Aggregate the port belongs to, or the port itself when not expanded
    pub parent_port: String,
}

impl ForwardingTableEntry {
    /// Whether this entry was produced by expanding a port-channel
    pub fn is_member(&self) -> bool {
        self.port != self.parent_port
    }
}

/// NeighborEntry is the CDP identity seen on a local port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborEntry {
    pub platform_id: String,
    pub device_id: String,
    pub remote_port_id: String,
}

/// Parse an NX-OS flag column (`enabled`/`disabled`, `T`/`F`, ...)
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "enabled" | "true" | "t" | "yes" | "y" | "1"
    )
}
