//! Pattern scanners over page text.
//!
//! Some attributes never get a reliable label in the DOM, so they are
//! recovered from the raw visible text with resource-id and address
//! patterns. Scanners preserve first-seen order and drop duplicates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static INSTANCE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bi-[0-9a-f]{8,17}\b").unwrap());
static SECURITY_GROUP_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsg-[0-9a-f]{8,17}\b").unwrap());
static VOLUME_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bvol-[0-9a-f]{8,17}\b").unwrap());
static ENI_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\beni-[0-9a-f]{8,17}\b").unwrap());
static VPC_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bvpc-[0-9a-f]{8,17}\b").unwrap());
static SUBNET_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsubnet-[0-9a-f]{8,17}\b").unwrap());
static EIP_ALLOCATION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\beipalloc-[0-9a-f]{8,17}\b").unwrap());
static ACCOUNT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{12}\b").unwrap());
static AVAILABILITY_ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z]{2}(?:-[a-z]+)+-\d[a-z]\b").unwrap());
static IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap());
// Deliberately loose: candidates are validated with the address parser.
static IPV6_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[0-9a-fA-F]{0,4}:){2,7}[0-9a-fA-F]{0,4}").unwrap());

/// All matches of `re` in `text`, first occurrence of each kept.
fn scan(re: &Regex, text: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        if !seen.iter().any(|s| s == m.as_str()) {
            seen.push(m.as_str().to_string());
        }
    }
    seen
}

pub fn scan_instance_ids(text: &str) -> Vec<String> {
    scan(&INSTANCE_ID, text)
}

pub fn scan_security_group_ids(text: &str) -> Vec<String> {
    scan(&SECURITY_GROUP_ID, text)
}

pub fn scan_volume_ids(text: &str) -> Vec<String> {
    scan(&VOLUME_ID, text)
}

pub fn scan_eni_ids(text: &str) -> Vec<String> {
    scan(&ENI_ID, text)
}

pub fn scan_vpc_ids(text: &str) -> Vec<String> {
    scan(&VPC_ID, text)
}

pub fn scan_subnet_ids(text: &str) -> Vec<String> {
    scan(&SUBNET_ID, text)
}

pub fn scan_eip_allocation_ids(text: &str) -> Vec<String> {
    scan(&EIP_ALLOCATION_ID, text)
}

/// First 12-digit run in the text, taken as the account id
pub fn first_account_id(text: &str) -> Option<String> {
    ACCOUNT_ID.find(text).map(|m| m.as_str().to_string())
}

pub fn first_availability_zone(text: &str) -> Option<String> {
    AVAILABILITY_ZONE.find(text).map(|m| m.as_str().to_string())
}

/// The region is the availability zone with its trailing letter removed
pub fn region_of_zone(zone: &str) -> String {
    let mut region = zone.to_string();
    if region
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_lowercase())
    {
        region.pop();
    }
    region
}

/// Every well-formed IPv4 address in the text, in first-seen order
pub fn scan_ipv4s(text: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for m in IPV4.find_iter(text) {
        let candidate = m.as_str();
        let valid = candidate
            .split('.')
            .all(|octet| octet.parse::<u16>().map(|n| n <= 255).unwrap_or(false));
        if valid && !seen.iter().any(|s| s == candidate) {
            seen.push(candidate.to_string());
        }
    }
    seen
}

/// Every parseable IPv6 address in the text, in first-seen order
pub fn scan_ipv6s(text: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for m in IPV6_CANDIDATE.find_iter(text) {
        // The candidate regex can capture a stray trailing colon; retry
        // without it before giving up on the match.
        let raw = m.as_str();
        let candidate = if raw.parse::<std::net::Ipv6Addr>().is_ok() {
            raw
        } else {
            let trimmed = raw.strip_suffix(':').unwrap_or(raw);
            if trimmed.parse::<std::net::Ipv6Addr>().is_ok() {
                trimmed
            } else {
                continue;
            }
        };
        if !seen.iter().any(|s| s == candidate) {
            seen.push(candidate.to_string());
        }
    }
    seen
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    Public,
    Private,
    /// Loopback, link-local and other ranges that are never reported
    Excluded,
}

/// Classify a dotted-quad address by its leading octets
pub fn classify_ipv4(ip: &str) -> AddressClass {
    if ip.starts_with("127.") || ip.starts_with("169.254.") || ip.starts_with("0.") {
        AddressClass::Excluded
    } else if ip.starts_with("10.") || ip.starts_with("172.") || ip.starts_with("192.168.") {
        AddressClass::Private
    } else {
        AddressClass::Public
    }
}

/// Classify an IPv6 address by its leading group
pub fn classify_ipv6(ip: &str) -> AddressClass {
    let lower = ip.to_lowercase();
    if lower == "::1" || lower == "::" {
        AddressClass::Excluded
    } else if lower.starts_with("fe80:") || lower.starts_with("fc00:") || lower.starts_with("fd00:")
    {
        AddressClass::Private
    } else {
        AddressClass::Public
    }
}

/// First public/private IPv4 and IPv6 addresses found in a text blob
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpCatalog {
    pub public_ipv4: Option<String>,
    pub private_ipv4: Option<String>,
    pub public_ipv6: Option<String>,
    pub private_ipv6: Option<String>,
}

/// Scan a text blob for addresses and keep the first of each class
pub fn extract_ips(text: &str) -> IpCatalog {
    let mut catalog = IpCatalog::default();
    for ip in scan_ipv4s(text) {
        match classify_ipv4(&ip) {
            AddressClass::Public if catalog.public_ipv4.is_none() => {
                catalog.public_ipv4 = Some(ip)
            }
            AddressClass::Private if catalog.private_ipv4.is_none() => {
                catalog.private_ipv4 = Some(ip)
            }
            _ => {}
        }
    }
    for ip in scan_ipv6s(text) {
        match classify_ipv6(&ip) {
            AddressClass::Public if catalog.public_ipv6.is_none() => {
                catalog.public_ipv6 = Some(ip)
            }
            AddressClass::Private if catalog.private_ipv6.is_none() => {
                catalog.private_ipv6 = Some(ip)
            }
            _ => {}
        }
    }
    catalog
}
