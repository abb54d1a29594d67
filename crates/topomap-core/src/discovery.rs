//! Network discovery results
//!
//! The scanner itself lives outside this crate; here we only merge what it
//! reports with the ARP table so candidates carry a MAC where one is known.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// A host that answered a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredHost {
    pub ip: String,
    #[serde(default)]
    pub mac: Option<String>,
}

impl DiscoveredHost {
    #[must_use]
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            mac: None,
        }
    }

    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }
}

/// One row of the ARP cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpEntry {
    pub ip: String,
    pub mac: String,
}

/// Pair each responding address with its ARP MAC
///
/// Output follows scan order; blank addresses are dropped and repeated ones
/// reported once.
#[must_use]
pub fn merge_scan_with_arp(responding: &[String], arp: &[ArpEntry]) -> Vec<DiscoveredHost> {
    let macs: HashMap<&str, &str> = arp
        .iter()
        .filter(|e| !e.mac.trim().is_empty())
        .map(|e| (e.ip.trim(), e.mac.trim()))
        .collect();

    let mut seen = std::collections::HashSet::new();
    responding
        .iter()
        .map(|ip| ip.trim())
        .filter(|ip| !ip.is_empty() && seen.insert(*ip))
        .map(|ip| DiscoveredHost {
            ip: ip.to_string(),
            mac: macs.get(ip).map(|m| (*m).to_string()),
        })
        .collect()
}

/// Parse ARP cache listings
///
/// Accepts both `ip mac` lines and `arp -a` output such as
/// `? (10.0.0.1) at aa:bb:cc:dd:ee:ff [ether] on eth0`. Lines without an IP
/// address and a MAC are skipped, as are incomplete entries.
#[must_use]
pub fn parse_arp_table(text: &str) -> Vec<ArpEntry> {
    text.lines()
        .filter_map(|line| {
            let tokens = line.split_whitespace().map(|t| t.trim_matches(|c: char| c == '(' || c == ')'));
            let mut ip = None;
            let mut mac = None;
            for token in tokens {
                if ip.is_none() && token.parse::<IpAddr>().is_ok() {
                    ip = Some(token);
                } else if mac.is_none() && is_mac(token) {
                    mac = Some(token);
                }
            }
            Some(ArpEntry {
                ip: ip?.to_string(),
                mac: mac?.to_ascii_lowercase().replace('-', ":"),
            })
        })
        .collect()
}

fn is_mac(token: &str) -> bool {
    let parts: Vec<&str> = token.split([':', '-']).collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| (1..=2).contains(&p.len()) && p.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_known_macs() {
        let scan = vec!["10.0.0.2".to_string(), "10.0.0.3".to_string(), " 10.0.0.2".to_string()];
        let arp = vec![ArpEntry {
            ip: "10.0.0.3".into(),
            mac: "de:ad:be:ef:00:01".into(),
        }];
        let hosts = merge_scan_with_arp(&scan, &arp);
        assert_eq!(
            hosts,
            vec![
                DiscoveredHost::new("10.0.0.2"),
                DiscoveredHost::new("10.0.0.3").with_mac("de:ad:be:ef:00:01"),
            ]
        );
    }

    #[test]
    fn parses_arp_listings() {
        let text = "\
? (192.168.1.1) at AA:BB:CC:00:11:22 [ether] on eth0
? (192.168.1.9) at <incomplete> on eth0
10.0.0.5 de-ad-be-ef-00-02
garbage line
";
        assert_eq!(
            parse_arp_table(text),
            vec![
                ArpEntry {
                    ip: "192.168.1.1".into(),
                    mac: "aa:bb:cc:00:11:22".into(),
                },
                ArpEntry {
                    ip: "10.0.0.5".into(),
                    mac: "de:ad:be:ef:00:02".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_scan_gives_nothing() {
        assert!(merge_scan_with_arp(&[], &[]).is_empty());
        assert!(merge_scan_with_arp(&[String::new()], &[]).is_empty());
    }
}
