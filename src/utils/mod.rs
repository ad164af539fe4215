/// Normalize MAC address to lowercase with colons
pub fn normalize_mac(mac: &str) -> String {
    // Remove any existing separators
    let clean: String = mac
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect();

    if clean.len() != 12 {
        return mac.to_lowercase();
    }

    clean
        .chars()
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
        .to_lowercase()
}

/// Convert a MAC address to NX-OS dotted form
/// e.g., "aa:bb:cc:dd:ee:ff" -> "aabb.ccdd.eeff"
pub fn dotted_mac(mac: &str) -> String {
    let clean: String = mac
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_lowercase();

    if clean.len() != 12 {
        return mac.to_lowercase();
    }

    format!("{}.{}.{}", &clean[0..4], &clean[4..8], &clean[8..12])
}

/// Validate an IPv4 address (e.g., "192.168.1.1").
/// Returns true if the string is a valid dotted-decimal IPv4 address.
pub fn is_valid_ipv4(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|p| p.parse::<u8>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mac() {
        assert_eq!(normalize_mac("AA:BB:CC:DD:EE:FF"), "aa:bb:cc:dd:ee:ff");
        assert_eq!(normalize_mac("AABB.CCDD.EEFF"), "aa:bb:cc:dd:ee:ff");
        assert_eq!(normalize_mac("0011.2233.4455"), "00:11:22:33:44:55");
        assert_eq!(normalize_mac("incomplete"), "incomplete");
    }

    #[test]
    fn test_dotted_mac() {
        assert_eq!(dotted_mac("aa:bb:cc:dd:ee:ff"), "aabb.ccdd.eeff");
        assert_eq!(dotted_mac("AA-BB-CC-DD-EE-FF"), "aabb.ccdd.eeff");
        assert_eq!(dotted_mac("aabb.ccdd.eeff"), "aabb.ccdd.eeff");
        assert_eq!(dotted_mac("AB:CD"), "ab:cd");
    }

    #[test]
    fn test_is_valid_ipv4() {
        assert!(is_valid_ipv4("198.51.100.7"));
        assert!(is_valid_ipv4("0.0.0.0"));
        assert!(!is_valid_ipv4(""));
        assert!(!is_valid_ipv4("all"));
        assert!(!is_valid_ipv4("256.1.1.1"));
        assert!(!is_valid_ipv4("1.2.3"));
        assert!(!is_valid_ipv4("1.2.3.4.5"));
        assert!(!is_valid_ipv4("; rm -rf /"));
    }
}
