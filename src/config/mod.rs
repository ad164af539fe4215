use std::env;
use std::str::FromStr;

/// How queries reach the switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportKind {
    /// NX-API over HTTP(S)
    Nxapi,
    /// CLI over SSH, using `| json` or `| xml` for structured output
    Ssh,
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nxapi" | "nx-api" => Ok(Self::Nxapi),
            "ssh" => Ok(Self::Ssh),
            other => Err(anyhow::anyhow!("Unknown transport: {}", other)),
        }
    }
}

/// Upper bound for the per-query transport timeout
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// One addressable switch with its credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTarget {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub switch: SwitchTarget,
    pub transport: TransportKind,
    pub nxapi_scheme: String,
    pub nxapi_port: Option<u16>,
    pub nxapi_insecure: bool,
    pub ssh_port: u16,
    pub timeout_secs: u64,
    pub default_vrf: String,
    /// Switch list for multi-switch commands
    pub switches: Vec<SwitchTarget>,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let username = get("SWITCH_USER", "admin");
        let password = get("SWITCH_PASS", "");

        let nxapi_port = match lookup("NXAPI_PORT") {
            Some(raw) if !raw.trim().is_empty() => Some(parse_number("NXAPI_PORT", &raw)?),
            _ => None,
        };

        let timeout_secs: u64 = parse_number("QUERY_TIMEOUT_SECS", &get("QUERY_TIMEOUT_SECS", "30"))?;
        if timeout_secs == 0 || timeout_secs > MAX_TIMEOUT_SECS {
            anyhow::bail!(
                "Invalid QUERY_TIMEOUT_SECS {}: must be between 1 and {}",
                timeout_secs,
                MAX_TIMEOUT_SECS
            );
        }

        Ok(Self {
            switch: SwitchTarget {
                host: get("SWITCH_HOST", "127.0.0.1"),
                username: username.clone(),
                password: password.clone(),
            },
            transport: get("SWITCH_TRANSPORT", "nxapi").parse()?,
            nxapi_scheme: get("NXAPI_SCHEME", "http"),
            nxapi_port,
            nxapi_insecure: parse_bool(&get("NXAPI_INSECURE", "false")),
            ssh_port: parse_number("SSH_PORT", &get("SSH_PORT", "22"))?,
            timeout_secs,
            default_vrf: get("DEFAULT_VRF", "all"),
            switches: parse_switches(&get("SWITCHES", ""), &username, &password),
        })
    }
}

/// Parse a `host[:user[:pass]]` list, comma-separated.
/// Missing credentials fall back to the defaults. The password may contain `:`.
pub fn parse_switches(raw: &str, default_user: &str, default_pass: &str) -> Vec<SwitchTarget> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let host = parts.next().unwrap_or_default().to_string();
            let username = parts
                .next()
                .filter(|u| !u.is_empty())
                .unwrap_or(default_user)
                .to_string();
            let password = parts.next().unwrap_or(default_pass).to_string();
            SwitchTarget { host, username, password }
        })
        .collect()
}

fn parse_number<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid {} {}: {}", key, raw, e))
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.switch.host, "127.0.0.1");
        assert_eq!(cfg.switch.username, "admin");
        assert_eq!(cfg.transport, TransportKind::Nxapi);
        assert_eq!(cfg.nxapi_scheme, "http");
        assert_eq!(cfg.nxapi_port, None);
        assert!(!cfg.nxapi_insecure);
        assert_eq!(cfg.ssh_port, 22);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.default_vrf, "all");
        assert!(cfg.switches.is_empty());
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("SWITCH_HOST", "10.1.1.1"),
            ("SWITCH_TRANSPORT", "SSH"),
            ("NXAPI_PORT", "8443"),
            ("NXAPI_INSECURE", "yes"),
            ("DEFAULT_VRF", "management"),
            ("SWITCHES", "10.0.0.1, 10.0.0.2:ops:s3:cr3t"),
        ]))
        .unwrap();
        assert_eq!(cfg.switch.host, "10.1.1.1");
        assert_eq!(cfg.transport, TransportKind::Ssh);
        assert_eq!(cfg.nxapi_port, Some(8443));
        assert!(cfg.nxapi_insecure);
        assert_eq!(cfg.default_vrf, "management");
        assert_eq!(cfg.switches.len(), 2);
        assert_eq!(cfg.switches[1].password, "s3:cr3t");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("SWITCH_TRANSPORT", "telnet")])).is_err());
        assert!(Config::from_lookup(lookup(&[("NXAPI_PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SSH_PORT", "twenty-two")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SSH_PORT", "70000")])).is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        assert!(Config::from_lookup(lookup(&[("QUERY_TIMEOUT_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("QUERY_TIMEOUT_SECS", "5000000")])).is_err());
        assert!(Config::from_lookup(lookup(&[("QUERY_TIMEOUT_SECS", "soon")])).is_err());

        let cfg = Config::from_lookup(lookup(&[("QUERY_TIMEOUT_SECS", "3600")])).unwrap();
        assert_eq!(cfg.timeout_secs, MAX_TIMEOUT_SECS);
        let cfg = Config::from_lookup(lookup(&[("QUERY_TIMEOUT_SECS", "1"), ("SSH_PORT", "2222")])).unwrap();
        assert_eq!(cfg.timeout_secs, 1);
        assert_eq!(cfg.ssh_port, 2222);
    }

    #[test]
    fn test_parse_switches_defaults_credentials() {
        let switches = parse_switches("172.23.3.116,172.23.3.117::other,,", "admin", "cisco");
        assert_eq!(
            switches,
            vec![
                SwitchTarget {
                    host: "172.23.3.116".to_string(),
                    username: "admin".to_string(),
                    password: "cisco".to_string(),
                },
                SwitchTarget {
                    host: "172.23.3.117".to_string(),
                    username: "admin".to_string(),
                    password: "other".to_string(),
                },
            ]
        );
    }
}
