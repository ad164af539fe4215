//! Ping sweep over an address range, run from the switch.

use anyhow::{bail, Context, Result};

use crate::transport::{DeviceQuery, QueryError};

pub const DEFAULT_OPTIONS: &str = "count 1";

/// Largest sweep accepted in one run
pub const MAX_TARGETS: usize = 65_536;

/// PingResult is the outcome of pinging one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingResult {
    pub ip: String,
    /// Packet-loss summary, `None` when the output carried none
    pub loss: Result<Option<String>, QueryError>,
}

impl PingResult {
    pub fn line(&self) -> String {
        match &self.loss {
            Ok(Some(loss)) => format!("{} - {}", self.ip, loss),
            Ok(None) => format!("{} - no packet loss reported", self.ip),
            Err(e) => format!("{} - {}", self.ip, e),
        }
    }
}

/// Expand a dotted target whose octets are `N` or `N-M` into every address, in order
pub fn expand_range(target: &str) -> Result<Vec<String>> {
    let octets: Vec<&str> = target.trim().split('.').collect();
    if octets.len() != 4 {
        bail!("Invalid range {}: expected four octets", target);
    }

    let ranges = octets
        .iter()
        .map(|octet| expand_octet(octet).with_context(|| format!("Invalid range {}", target)))
        .collect::<Result<Vec<_>>>()?;

    let total = ranges.iter().map(|r| r.len()).product::<usize>();
    if total > MAX_TARGETS {
        bail!("Range {} covers {} addresses, limit is {}", target, total, MAX_TARGETS);
    }

    let mut ips = Vec::with_capacity(total);
    for a in &ranges[0] {
        for b in &ranges[1] {
            for c in &ranges[2] {
                for d in &ranges[3] {
                    ips.push(format!("{}.{}.{}.{}", a, b, c, d));
                }
            }
        }
    }
    Ok(ips)
}

fn expand_octet(octet: &str) -> Result<Vec<u8>> {
    let parse = |raw: &str| {
        raw.trim()
            .parse::<u8>()
            .map_err(|e| anyhow::anyhow!("bad octet {}: {}", raw, e))
    };
    match octet.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if start > end {
                bail!("octet range {} is reversed", octet);
            }
            Ok((start..=end).collect())
        }
        None => Ok(vec![parse(octet)?]),
    }
}

/// Packet-loss summary from ping output, e.g. `0.00% packet loss`
pub fn packet_loss(output: &str) -> Option<String> {
    regex_lite::Regex::new(r"([0-9.]+% packet loss)")
        .ok()?
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn ping_command(ip: &str, options: &str) -> String {
    format!("ping {} {}", ip, options.trim()).trim_end().to_string()
}

/// Ping every address in turn. A failed ping is recorded and the sweep continues.
pub async fn sweep(device: &dyn DeviceQuery, ips: &[String], options: &str) -> Vec<PingResult> {
    let mut results = Vec::with_capacity(ips.len());
    for ip in ips {
        let loss = device
            .text_query(&ping_command(ip, options))
            .await
            .map(|output| packet_loss(&output));
        if let Err(e) = &loss {
            tracing::debug!("ping {} failed: {}", ip, e);
        }
        results.push(PingResult { ip: ip.clone(), loss });
    }
    results
}
