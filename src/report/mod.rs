use std::fmt::Write;

use crate::models::{AddressBranch, PortBranch, ResolutionResult};

const STEP: usize = 2;

/// Render resolution results as the indented text report, one block per IP
pub fn render(results: &[ResolutionResult]) -> String {
    let mut out = String::new();
    for result in results {
        render_result(&mut out, result);
    }
    out
}

fn line(out: &mut String, depth: usize, text: impl std::fmt::Display) {
    let _ = writeln!(out, "{:depth$}{}", "", text, depth = depth);
}

fn render_result(out: &mut String, result: &ResolutionResult) {
    let branches = match &result.outcome {
        Ok(branches) => branches,
        Err(e) => {
            line(out, 0, e);
            return;
        }
    };

    line(out, 0, format!("Here is some information on {}:", result.target));
    for branch in branches {
        let mut depth = STEP;
        if branches.len() > 1 {
            line(out, depth, format!("ARP entry on {}", branch.arp.egress_interface));
            depth += STEP;
        }
        render_address(out, depth, branch);
    }
}

fn render_address(out: &mut String, depth: usize, branch: &AddressBranch) {
    line(out, depth, format!("MAC address: {}", branch.arp.mac_address));
    line(out, depth, format!("L3 gateway: {}", branch.arp.egress_interface));

    let ports = match &branch.forwarding {
        Ok(ports) => ports,
        Err(e) => {
            line(out, depth, e);
            return;
        }
    };
    for port in ports {
        let mut depth = depth;
        if ports.len() > 1 {
            line(
                out,
                depth,
                format!("Port Channel {} member {}", port.entry.parent_port, port.entry.port),
            );
            depth += STEP;
        }
        render_port(out, depth, port);
    }
}

fn render_port(out: &mut String, depth: usize, branch: &PortBranch) {
    line(out, depth, format!("Local interface: {}", branch.entry.port));
    line(out, depth, format!("VLAN: {}", branch.entry.vlan));
    match &branch.neighbor {
        Ok(cdp) => {
            line(out, depth, format!("CDP Platform: {}", cdp.platform_id));
            line(out, depth, format!("CDP Device ID: {}", cdp.device_id));
            line(out, depth, format!("CDP Remote Port ID: {}", cdp.remote_port_id));
        }
        Err(e) => line(out, depth, e),
    }
}
