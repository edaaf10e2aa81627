//! Lightsail instance detail page extractors, one per console tab.
//!
//! Lightsail renders far fewer labeled fields than EC2, so these lean on
//! text patterns over the page body: bundle sizing, pricing, support code
//! and SSH details all live in prose rather than label/value pairs.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{Document, ElementNode};
use crate::extract::field::{extract_field, presence};
use crate::extract::os::infer_os;
use crate::extract::tables::{self, TableRole};
use crate::extract::patterns;
use crate::record::{
    DiskInfo, FirewallRule, LightsailConnect, LightsailDomains, LightsailNetworking,
    LightsailStorage,
};

static RAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*GB\s+RAM").unwrap());
static VCPUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*vCPUs?").unwrap());
static SSD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*GB\s+SSD").unwrap());
static TRANSFER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*TB\s+transfer").unwrap());
static PRICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\d+(?:\.\d+)?").unwrap());
static BUNDLE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:nano|micro|small|medium|large|xlarge|2xlarge)_\d+_\d+\b").unwrap()
});
static BLUEPRINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(ubuntu \d+\.\d+(?: lts)?|amazon linux \d+|debian \d+|centos(?: stream)? \d+|windows server \d+|bitnami [a-z0-9 ]+?|alma ?linux \d+)\b",
    )
    .unwrap()
});
static STATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(Running|Stopped|Stopping|Pending|Rebooting)\b").unwrap());
static SSH_USER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(ubuntu|ec2-user|centos|admin|bitnami|root)@").unwrap());
static SUPPORT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{6,}/i-[0-9a-f]{8,17}\b").unwrap());
static CREATED_AT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s+\d{4}\b|\b\d{4}-\d{2}-\d{2}\b",
    )
    .unwrap()
});
static DEVICE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/dev/[a-z0-9]+").unwrap());

fn first_match(re: &Regex, text: &str) -> Option<String> {
    re.find(text).map(|m| m.as_str().to_string())
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Instance name from the page URL, e.g. `…/instances/web-1/connect`
fn name_from_url(doc: &Document) -> Option<String> {
    let url = doc.url.as_deref()?;
    let rest = url.split("/instances/").nth(1)?;
    let name = rest.split(['/', '?', '#']).next()?;
    presence(&urlencoding::decode(name).ok()?)
}

/// Extract the Connect tab: identity, bundle sizing, pricing and SSH.
pub fn extract_connect(doc: &Document) -> LightsailConnect {
    let root = &doc.root;
    let text = doc.visible_text();
    let ips = patterns::extract_ips(&text);

    let zone = patterns::first_availability_zone(&text);
    let name = name_from_url(doc).or_else(|| extract_field(root, "Name"));

    let blueprint = first_match(&BLUEPRINT, &text);
    let os = infer_os(blueprint.as_deref().unwrap_or(&text));

    let ram = first_capture(&RAM, &text).map(|n| format!("{n} GB"));
    let vcpus = first_capture(&VCPUS, &text);
    let storage = first_capture(&SSD, &text).map(|n| format!("{n} GB SSD"));
    let transfer = first_capture(&TRANSFER, &text).map(|n| format!("{n} TB"));
    let bundle = match (&ram, &vcpus, &storage) {
        (Some(ram), Some(vcpus), Some(storage)) => {
            Some(format!("{ram} RAM, {vcpus} vCPUs, {storage}"))
        }
        _ => None,
    };

    let connect_url = match (&name, &zone) {
        (Some(name), Some(zone)) => Some(format!(
            "https://lightsail.aws.amazon.com/ls/remote/{}/instances/{}/terminal?protocol=ssh",
            patterns::region_of_zone(zone),
            urlencoding::encode(name)
        )),
        _ => None,
    };

    let lower = text.to_lowercase();
    LightsailConnect {
        name,
        state: first_match(&STATE, &text),
        availability_zone: zone,
        blueprint,
        os: os.os,
        os_version: os.version,
        bundle,
        ram,
        vcpus,
        storage,
        transfer_allowance: transfer,
        monthly_price: first_match(&PRICE, &text).map(|p| format!("{p} per month")),
        instance_type: first_match(&BUNDLE_ID, &text),
        networking_type: if lower.contains("dual-stack") {
            Some("Dual-stack".to_string())
        } else if lower.contains("ipv6-only") {
            Some("IPv6-only".to_string())
        } else {
            None
        },
        ssh_key_name: extract_field(root, "SSH key").or_else(|| {
            text.contains("LightsailDefaultKeyPair")
                .then(|| "LightsailDefaultKeyPair".to_string())
        }),
        ssh_user: first_capture(&SSH_USER, &text),
        connect_url,
        public_ipv4: ips.public_ipv4,
        private_ipv4: ips.private_ipv4,
        public_ipv6: ips.public_ipv6,
        is_static_ip: lower.contains("static ip") && lower.contains("detach"),
        support_code: first_match(&SUPPORT_CODE, &text),
        created_at: first_match(&CREATED_AT, &text),
    }
}

/// Extract the Storage tab: system disk, attached disks, snapshots.
pub fn extract_storage(doc: &Document) -> LightsailStorage {
    let text = doc.visible_text();
    let lower = text.to_lowercase();

    let system_size = first_capture(&SSD, &text);
    let system_disk_size = system_size.as_ref().map(|n| format!("{n} GB"));

    let mut additional_disks = Vec::new();
    for table in doc.tables() {
        if !(table.header_contains("disk") || table.header_contains("path")) {
            continue;
        }
        let name_col = tables::column(&table, "name").unwrap_or(0);
        let size_col = tables::column(&table, "size");
        let status_col = tables::column(&table, "status");
        for row in table.data_rows() {
            let name = presence(row.cell(name_col));
            if name.is_none() {
                continue;
            }
            additional_disks.push(DiskInfo {
                name,
                size_gib: size_col.and_then(|i| {
                    row.cell(i)
                        .chars()
                        .take_while(|c| c.is_ascii_digit())
                        .collect::<String>()
                        .parse()
                        .ok()
                }),
                path: first_match(&DEVICE_PATH, &row.text),
                status: status_col.and_then(|i| presence(row.cell(i))),
            });
        }
    }

    let automatic_snapshots = if lower.contains("automatic snapshots") {
        let tail = &lower[lower.find("automatic snapshots").unwrap_or(0)..];
        if tail.contains("enabled") && !tail.contains("disabled") {
            Some("Enabled".to_string())
        } else {
            Some("Disabled".to_string())
        }
    } else {
        None
    };

    let system_gib: u64 = system_size.and_then(|n| n.parse().ok()).unwrap_or(0);
    let total_storage_gib =
        system_gib + additional_disks.iter().filter_map(|d| d.size_gib).sum::<u64>();

    LightsailStorage {
        system_disk_size,
        system_disk_path: first_match(&DEVICE_PATH, &text),
        system_disk_name: None,
        system_disk_type: Some("SSD".to_string()).filter(|_| lower.contains("ssd")),
        additional_disks,
        automatic_snapshots,
        total_storage_gib,
    }
}

/// Extract the Networking tab: addresses, static IP attachment, both
/// firewall tables, load balancer and distribution status.
pub fn extract_networking(doc: &Document) -> LightsailNetworking {
    let text = doc.visible_text();
    let lower = text.to_lowercase();
    let ips = patterns::extract_ips(&text);

    let ipv6_addresses: Vec<String> = patterns::scan_ipv6s(&text)
        .into_iter()
        .filter(|ip| patterns::classify_ipv6(ip) == patterns::AddressClass::Public)
        .collect();

    let (firewall_ipv4_rules, firewall_ipv6_rules) = split_firewall_tables(doc);

    LightsailNetworking {
        public_ipv4: ips.public_ipv4,
        private_ipv4: ips.private_ipv4,
        is_static_ip: lower.contains("static ip") && lower.contains("detach"),
        static_ip_name: static_ip_name(doc),
        ipv6_enabled: !ipv6_addresses.is_empty() || lower.contains("dual-stack"),
        ipv6_addresses,
        firewall_ipv4_rules,
        firewall_ipv6_rules,
        load_balancing_status: section_status(&lower, "load balanc"),
        distribution_status: section_status(&lower, "distribution"),
    }
}

/// Attached static IP name from its console link
fn static_ip_name(doc: &Document) -> Option<String> {
    let link = doc.find_first(|n: &ElementNode| {
        n.is_tag("a") && n.attr_contains("href", "/static-ips/")
    })?;
    let href = link.attr("href")?;
    let rest = href.split("/static-ips/").nth(1)?;
    presence(rest.split(['/', '?', '#']).next().unwrap_or(""))
}

fn section_status(lower: &str, topic: &str) -> Option<String> {
    if !lower.contains(topic) {
        return None;
    }
    if lower.contains("not attached") || lower.contains("not enabled") {
        Some("Not attached".to_string())
    } else {
        Some("Attached".to_string())
    }
}

/// Walk the page in document order, bucketing firewall tables under the
/// nearest preceding "IPv4 Firewall" / "IPv6 Firewall" heading.
fn split_firewall_tables(doc: &Document) -> (Vec<FirewallRule>, Vec<FirewallRule>) {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    let mut current_is_v6 = false;

    for node in doc.root.descendants() {
        if matches!(node.tag_name.as_str(), "h1" | "h2" | "h3" | "h4") {
            let heading = node.deep_text().to_lowercase();
            if heading.contains("firewall") {
                current_is_v6 = heading.contains("ipv6");
            }
            continue;
        }
        if !node.is_tag("table") {
            continue;
        }
        let Some(table) = crate::dom::TableView::from_element(node) else {
            continue;
        };
        if tables::classify(&table) != TableRole::Firewall {
            continue;
        }
        let rules = parse_firewall_rules(&table);
        if current_is_v6 {
            v6.extend(rules);
        } else {
            v4.extend(rules);
        }
    }
    (v4, v6)
}

fn parse_firewall_rules(table: &crate::dom::TableView) -> Vec<FirewallRule> {
    let application = tables::column(table, "application");
    let protocol = tables::column(table, "protocol");
    let port = tables::column(table, "port");
    let restricted = tables::column(table, "restrict");

    table
        .data_rows()
        .map(|row| FirewallRule {
            application: application
                .and_then(|i| presence(row.cell(i)))
                .unwrap_or_default(),
            protocol: protocol
                .and_then(|i| presence(row.cell(i)))
                .unwrap_or_default(),
            port_range: port
                .and_then(|i| presence(row.cell(i)))
                .map(|p| tables::repair_port_range(&p))
                .unwrap_or_default(),
            restricted_to: restricted
                .and_then(|i| presence(row.cell(i)))
                .unwrap_or_default(),
        })
        .filter(|rule| !rule.application.is_empty() || !rule.port_range.is_empty())
        .collect()
}

/// Extract the Domains tab: mapped domain names.
pub fn extract_domains(doc: &Document) -> LightsailDomains {
    let mut domains = Vec::new();
    let mut status = None;
    for table in doc.tables() {
        if !table.header_contains("domain") {
            continue;
        }
        let domain_col = tables::column(&table, "domain").unwrap_or(0);
        let status_col = tables::column(&table, "status");
        for row in table.data_rows() {
            if let Some(domain) = presence(row.cell(domain_col)) {
                if !domains.contains(&domain) {
                    domains.push(domain);
                }
            }
            if status.is_none() {
                status = status_col.and_then(|i| presence(row.cell(i)));
            }
        }
    }
    LightsailDomains { domains, status }
}
