//! EC2 instance detail page extractors, one per console tab.
//!
//! Each function takes a DOM snapshot of the page with the corresponding
//! tab active and returns that tab's partial record. Labeled fields are
//! tried first; pattern scanners over the visible text fill the gaps.

use crate::dom::{Document, TableView};
use crate::extract::field::{extract_field, extract_field_any, extract_field_exact, presence};
use crate::extract::os::infer_os;
use crate::extract::tables::{self, TableRole};
use crate::extract::patterns;
use crate::record::{
    BlockDevice, Ec2Details, Ec2Networking, Ec2Security, Ec2Storage, NetworkInterface,
    RuleDirection, SecurityGroupRef, SecurityRule,
};

/// First integer run in a cell, for GiB / IOPS / throughput columns
fn parse_number(cell: &str) -> Option<u64> {
    let digits: String = cell
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Yes/No style cells to a tristate bool
fn parse_flag(cell: &str) -> Option<bool> {
    let lower = cell.trim().to_lowercase();
    match lower.as_str() {
        "yes" | "true" | "enabled" => Some(true),
        "no" | "false" | "disabled" => Some(false),
        _ => None,
    }
}

/// Extract the Details tab: identity, placement, AMI, networking summary,
/// CPU, metadata options and protections.
pub fn extract_details(doc: &Document) -> Ec2Details {
    let root = &doc.root;
    let text = doc.visible_text();
    let ips = patterns::extract_ips(&text);

    let mut details = Ec2Details {
        instance_id: extract_field(root, "Instance ID")
            .or_else(|| patterns::scan_instance_ids(&text).into_iter().next()),
        name: extract_field_exact(root, "Name"),
        state: extract_field_any(root, &["Instance state", "State"]),
        instance_type: extract_field(root, "Instance type"),
        lifecycle: extract_field_any(root, &["Instance lifecycle", "Lifecycle"]),
        launch_time: extract_field(root, "Launch time"),
        usage_operation: extract_field(root, "Usage operation"),

        availability_zone: extract_field(root, "Availability Zone")
            .or_else(|| patterns::first_availability_zone(&text)),
        tenancy: extract_field(root, "Tenancy"),
        placement_group: extract_field(root, "Placement group"),
        host_id: extract_field(root, "Host ID"),
        capacity_reservation: extract_field_any(
            root,
            &["Capacity Reservation ID", "Capacity reservation"],
        ),
        partition_number: extract_field(root, "Partition number"),

        ami_id: extract_field(root, "AMI ID"),
        ami_name: extract_field(root, "AMI name"),
        ami_location: extract_field(root, "AMI location"),
        platform: extract_field(root, "Platform"),
        platform_details: extract_field(root, "Platform details"),
        architecture: extract_field(root, "Architecture"),
        virtualization_type: extract_field_any(root, &["Virtualization type", "Virtualization"]),
        boot_mode: extract_field(root, "Boot mode"),

        iam_role: extract_field(root, "IAM Role"),
        iam_instance_profile: extract_field(root, "IAM instance profile"),
        key_pair: extract_field_any(
            root,
            &["Key pair assigned at launch", "Key pair name", "Key pair"],
        ),

        public_ipv4: extract_field(root, "Public IPv4 address"),
        private_ipv4: extract_field_any(
            root,
            &["Private IPv4 addresses", "Private IPv4 address"],
        ),
        public_ipv6: extract_field_any(root, &["IPv6 address", "IPv6 addresses"]),
        private_ipv6: None,
        public_dns_name: extract_field(root, "Public IPv4 DNS"),
        private_dns_name: extract_field_any(
            root,
            &["Private IP DNS name", "Private DNS name"],
        ),
        vpc_id: extract_field(root, "VPC ID"),
        subnet_id: extract_field(root, "Subnet ID"),
        source_dest_check: extract_field_any(
            root,
            &["Source/destination check", "Source / destination check"],
        ),
        hostname_type: extract_field(root, "Hostname type"),
        answer_private_dns_name: extract_field(root, "Answer private resource DNS name"),
        elastic_ip: extract_field_any(root, &["Elastic IP addresses", "Elastic IP"]),
        auto_assigned_ip: extract_field(root, "Auto-assigned IP address"),

        instance_arn: extract_field_any(root, &["Instance ARN", "ARN"]),
        owner_id: extract_field_any(root, &["Owner account ID", "Owner"])
            .or_else(|| patterns::first_account_id(&text)),
        managed: extract_field(root, "Managed"),
        operator: extract_field(root, "Operator"),

        system_status_check: extract_field_any(
            root,
            &["System status checks", "System status check"],
        ),
        instance_status_check: extract_field_any(
            root,
            &["Instance status checks", "Instance status check"],
        ),

        cpu_core_count: extract_field_any(root, &["CPU core count", "Core count"]),
        cpu_threads_per_core: extract_field(root, "Threads per core"),
        cpu_options: extract_field(root, "CPU options"),
        credit_specification: extract_field(root, "Credit specification"),

        monitoring: extract_field(root, "Monitoring"),
        ebs_optimized: extract_field_any(root, &["EBS-optimized", "EBS optimization"]),
        nitro_enclave: extract_field_any(root, &["Nitro Enclaves", "Nitro Enclave"]),
        hibernation: extract_field_any(
            root,
            &["Stop-hibernate behavior", "Hibernation"],
        ),
        elastic_gpu_id: extract_field(root, "Elastic Graphics ID"),
        elastic_inference_accelerator: extract_field(
            root,
            "Elastic inference accelerator",
        ),

        root_device_name: extract_field(root, "Root device name"),
        root_device_type: extract_field(root, "Root device type"),

        metadata_accessible: extract_field(root, "Metadata accessible"),
        imdsv2: extract_field(root, "IMDSv2"),
        http_tokens: extract_field(root, "HTTP tokens"),
        http_put_response_hop_limit: extract_field_any(
            root,
            &["Metadata response hop limit", "HTTP PUT response hop limit"],
        ),
        http_endpoint: extract_field(root, "HTTP endpoint"),
        instance_metadata_tags: extract_field(root, "Allow tags in instance metadata"),

        auto_recovery: extract_field_any(root, &["Auto-recovery", "Auto recovery"]),
        stop_protection: extract_field(root, "Stop protection"),
        termination_protection: extract_field(root, "Termination protection"),
        maintenance_status: extract_field_any(root, &["Maintenance status", "Maintenance"]),
        license_configuration: extract_field_any(
            root,
            &["License configurations", "License configuration"],
        ),

        os: None,
        os_version: None,

        security_groups: None,
        volume_ids: patterns::scan_volume_ids(&text),
    };

    // The summary heading renders "i-… (name)"; recover the name from
    // that suffix when no labeled field carries it
    if details.name.is_none() {
        if let Some(id) = details.instance_id.as_deref() {
            details.name = name_after_id(&text, id);
        }
    }

    // Address scanners back-fill whatever the labels missed
    if details.public_ipv4.is_none() {
        details.public_ipv4 = ips.public_ipv4;
    }
    if details.private_ipv4.is_none() {
        details.private_ipv4 = ips.private_ipv4;
    }
    if details.public_ipv6.is_none() {
        details.public_ipv6 = ips.public_ipv6;
    }
    details.private_ipv6 = ips.private_ipv6;

    let groups = patterns::scan_security_group_ids(&text);
    if !groups.is_empty() {
        details.security_groups = Some(groups.join(", "));
    }

    let os_text = [
        details.ami_name.as_deref().unwrap_or(""),
        details.platform_details.as_deref().unwrap_or(""),
        details.platform.as_deref().unwrap_or(""),
    ]
    .join(" ");
    let os = infer_os(&os_text);
    details.os = os.os;
    details.os_version = os.version;

    details
}

/// Name from the `i-… (name)` suffix the summary heading renders
fn name_after_id(text: &str, id: &str) -> Option<String> {
    let pos = text.find(id)?;
    let after = text[pos + id.len()..].trim_start();
    let rest = after.strip_prefix('(')?;
    let end = rest.find(')')?;
    presence(&rest[..end])
}

/// Extract the Security tab: security groups with names, rule tables,
/// IAM role and key pair.
pub fn extract_security(doc: &Document) -> Ec2Security {
    let root = &doc.root;
    let text = doc.visible_text();

    let group_ids = patterns::scan_security_group_ids(&text);
    let group_tables = doc.tables();
    let details: Vec<SecurityGroupRef> = group_ids
        .iter()
        .map(|id| SecurityGroupRef {
            group_id: id.clone(),
            group_name: group_name_for(id, &text, &group_tables),
        })
        .collect();

    let security_groups = if details.is_empty() {
        None
    } else {
        Some(
            details
                .iter()
                .map(|g| match &g.group_name {
                    Some(name) => format!("{} ({})", g.group_id, name),
                    None => g.group_id.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    let mut inbound_rules = Vec::new();
    let mut outbound_rules = Vec::new();
    for table in &group_tables {
        match tables::classify(table) {
            TableRole::Inbound => {
                inbound_rules.extend(parse_rules(table, RuleDirection::Inbound, "source"))
            }
            TableRole::Outbound => {
                outbound_rules.extend(parse_rules(table, RuleDirection::Outbound, "destination"))
            }
            _ => {}
        }
    }

    Ec2Security {
        security_groups,
        security_group_details: details,
        inbound_rules,
        outbound_rules,
        iam_role: extract_field(root, "IAM Role"),
        key_pair: extract_field_any(root, &["Key pair assigned at launch", "Key pair name"]),
    }
}

/// Resolve a group name: prefer the `sg-… (name)` text the console renders
/// inline, then a group listing table row containing the id.
fn group_name_for(id: &str, text: &str, tables_on_page: &[TableView]) -> Option<String> {
    if let Some(pos) = text.find(id) {
        let after = &text[pos + id.len()..];
        let after = after.trim_start();
        if let Some(rest) = after.strip_prefix('(') {
            if let Some(end) = rest.find(')') {
                return presence(&rest[..end]);
            }
        }
    }
    for table in tables_on_page {
        let name_col = tables::column(table, "group name").or_else(|| {
            if table.header_contains("group id") {
                tables::column(table, "name")
            } else {
                None
            }
        });
        let Some(name_col) = name_col else { continue };
        for row in table.data_rows() {
            if row.text.contains(id) {
                return presence(row.cell(name_col));
            }
        }
    }
    None
}

/// Map rule table rows to [`SecurityRule`]s using header-derived columns
fn parse_rules(table: &TableView, direction: RuleDirection, peer_col: &str) -> Vec<SecurityRule> {
    let port = tables::column(table, "port");
    let protocol = tables::column(table, "protocol");
    let peer = tables::column(table, peer_col);
    let description = tables::column(table, "description");

    table
        .data_rows()
        .map(|row| SecurityRule {
            direction,
            protocol: protocol.and_then(|i| presence(row.cell(i))),
            port_range: port
                .and_then(|i| presence(row.cell(i)))
                .map(|p| tables::repair_port_range(&p)),
            source_or_dest: peer.and_then(|i| presence(row.cell(i))),
            description: description.and_then(|i| presence(row.cell(i))),
        })
        .filter(|rule| {
            rule.protocol.is_some() || rule.port_range.is_some() || rule.source_or_dest.is_some()
        })
        .collect()
}

/// Extract the Networking tab: addresses, VPC placement and interfaces.
pub fn extract_networking(doc: &Document) -> Ec2Networking {
    let root = &doc.root;
    let text = doc.visible_text();
    let ips = patterns::extract_ips(&text);

    let mut networking = Ec2Networking {
        vpc_id: extract_field(root, "VPC ID")
            .or_else(|| patterns::scan_vpc_ids(&text).into_iter().next()),
        subnet_id: extract_field(root, "Subnet ID")
            .or_else(|| patterns::scan_subnet_ids(&text).into_iter().next()),
        public_dns_name: extract_field(root, "Public IPv4 DNS"),
        private_dns_name: extract_field_any(
            root,
            &["Private IP DNS name", "Private DNS name"],
        ),
        public_ipv4: extract_field(root, "Public IPv4 address").or(ips.public_ipv4),
        private_ipv4: extract_field_any(
            root,
            &["Private IPv4 addresses", "Private IPv4 address"],
        )
        .or(ips.private_ipv4),
        public_ipv6: extract_field_any(root, &["IPv6 address", "IPv6 addresses"])
            .or(ips.public_ipv6),
        private_ipv6: ips.private_ipv6,
        security_groups: None,
        network_interfaces: Vec::new(),
        elastic_ip_allocations: patterns::scan_eip_allocation_ids(&text),
    };

    let groups = patterns::scan_security_group_ids(&text);
    if !groups.is_empty() {
        networking.security_groups = Some(groups.join(", "));
    }

    networking.network_interfaces = parse_interfaces(doc, &text);
    networking
}

/// Interface rows from the ENI table, falling back to bare scanned ids
fn parse_interfaces(doc: &Document, text: &str) -> Vec<NetworkInterface> {
    let mut interfaces: Vec<NetworkInterface> = Vec::new();
    for table in doc.tables() {
        if !table.header_contains("interface") {
            continue;
        }
        let description = tables::column(&table, "description");
        for row in table.data_rows() {
            let Some(eni_id) = patterns::scan_eni_ids(&row.text).into_iter().next() else {
                continue;
            };
            let row_ips = patterns::extract_ips(&row.text);
            interfaces.push(NetworkInterface {
                eni_id,
                private_ip: row_ips.private_ipv4,
                public_ip: row_ips.public_ipv4,
                subnet_id: patterns::scan_subnet_ids(&row.text).into_iter().next(),
                description: description.and_then(|i| presence(row.cell(i))),
            });
        }
    }
    if interfaces.is_empty() {
        interfaces = patterns::scan_eni_ids(text)
            .into_iter()
            .map(NetworkInterface::new)
            .collect();
    }
    interfaces
}

/// Extract the Storage tab: root device, block device rows, total size.
pub fn extract_storage(doc: &Document) -> Ec2Storage {
    let root = &doc.root;

    let mut block_devices = Vec::new();
    for table in doc.tables() {
        if tables::classify(&table) != TableRole::BlockDevices {
            continue;
        }
        let device = tables::column(&table, "device");
        let size = tables::column(&table, "size");
        let volume_type = tables::column(&table, "volume type")
            .or_else(|| tables::column(&table, "type"));
        let iops = tables::column(&table, "iops");
        let throughput = tables::column(&table, "throughput");
        let delete = tables::column(&table, "delete on termination");
        let encrypted = tables::column(&table, "encrypt");

        for row in table.data_rows() {
            let volume_id = patterns::scan_volume_ids(&row.text).into_iter().next();
            let device_name = device.and_then(|i| presence(row.cell(i)));
            if volume_id.is_none() && device_name.is_none() {
                continue;
            }
            block_devices.push(BlockDevice {
                volume_id,
                device_name,
                size_gib: size.and_then(|i| parse_number(row.cell(i))),
                volume_type: volume_type.and_then(|i| presence(row.cell(i))),
                iops: iops.and_then(|i| parse_number(row.cell(i))),
                throughput: throughput.and_then(|i| parse_number(row.cell(i))),
                delete_on_termination: delete.and_then(|i| parse_flag(row.cell(i))),
                encrypted: encrypted.and_then(|i| parse_flag(row.cell(i))),
            });
        }
    }
    // With no parseable device table, bare scanned volume ids still count
    if block_devices.is_empty() {
        block_devices = patterns::scan_volume_ids(&doc.visible_text())
            .into_iter()
            .map(|volume_id| BlockDevice { volume_id: Some(volume_id), ..Default::default() })
            .collect();
    }
    let total_storage_gib = block_devices.iter().filter_map(|d| d.size_gib).sum();

    Ec2Storage {
        root_device_name: extract_field(root, "Root device name"),
        root_device_type: extract_field(root, "Root device type"),
        ebs_optimization: extract_field_any(root, &["EBS-optimized", "EBS optimization"]),
        block_devices,
        total_storage_gib,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    fn labeled(label: &str, value: &str) -> ElementNode {
        ElementNode::new("div")
            .with_attr("class", "awsui_column_layout_x")
            .with_children(vec![
                ElementNode::new("span")
                    .with_attr("data-analytics", format!("label-for-{label}"))
                    .with_text(label),
                ElementNode::new("div")
                    .with_attr("class", "awsui_text-to-copy_x")
                    .with_text(value),
            ])
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> ElementNode {
        let header_row = ElementNode::new("tr").with_children(
            headers
                .iter()
                .map(|h| ElementNode::new("th").with_text(*h))
                .collect(),
        );
        let body_rows: Vec<ElementNode> = rows
            .iter()
            .map(|cells| {
                ElementNode::new("tr").with_children(
                    cells
                        .iter()
                        .map(|c| ElementNode::new("td").with_text(*c))
                        .collect(),
                )
            })
            .collect();
        ElementNode::new("table")
            .with_child(ElementNode::new("thead").with_child(header_row))
            .with_children(body_rows)
    }

    #[test]
    fn test_details_core_fields() {
        let doc = Document::from_root(ElementNode::new("body").with_children(vec![
            labeled("Instance ID", "i-0abc12345def67890"),
            labeled("Instance state", "Running"),
            labeled("Instance type", "t3.medium"),
            labeled("Availability Zone", "us-east-1a"),
            labeled("AMI name", "ubuntu-jammy-22.04-amd64-server"),
            labeled("Public IPv4 address", "34.201.5.9"),
            labeled("Private IPv4 addresses", "10.0.1.5"),
        ]));
        let details = extract_details(&doc);
        assert_eq!(details.instance_id.as_deref(), Some("i-0abc12345def67890"));
        assert_eq!(details.state.as_deref(), Some("Running"));
        assert_eq!(details.instance_type.as_deref(), Some("t3.medium"));
        assert_eq!(details.availability_zone.as_deref(), Some("us-east-1a"));
        assert_eq!(details.os.as_deref(), Some("Ubuntu"));
        assert_eq!(details.os_version.as_deref(), Some("22.04"));
        assert_eq!(details.public_ipv4.as_deref(), Some("34.201.5.9"));
        assert_eq!(details.private_ipv4.as_deref(), Some("10.0.1.5"));
    }

    #[test]
    fn test_details_name_from_heading_suffix() {
        let doc = Document::from_root(ElementNode::new("body").with_child(
            ElementNode::new("h1").with_text("Instance summary for i-0abc12345def67890 (web-1)"),
        ));
        let details = extract_details(&doc);
        assert_eq!(details.instance_id.as_deref(), Some("i-0abc12345def67890"));
        assert_eq!(details.name.as_deref(), Some("web-1"));
    }

    #[test]
    fn test_storage_bare_volume_ids_without_table() {
        let doc = Document::from_root(
            ElementNode::new("body")
                .with_child(ElementNode::new("div").with_text("vol-0abc12345def67890 attached")),
        );
        let storage = extract_storage(&doc);
        assert_eq!(storage.block_devices.len(), 1);
        assert_eq!(
            storage.block_devices[0].volume_id.as_deref(),
            Some("vol-0abc12345def67890")
        );
        assert_eq!(storage.total_storage_gib, 0);
    }

    #[test]
    fn test_details_instance_id_falls_back_to_scanner() {
        let doc = Document::from_root(
            ElementNode::new("body")
                .with_child(ElementNode::new("h1").with_text("Instance summary for i-0aa11bb22cc33dd44")),
        );
        let details = extract_details(&doc);
        assert_eq!(details.instance_id.as_deref(), Some("i-0aa11bb22cc33dd44"));
    }

    #[test]
    fn test_security_rules_and_group_names() {
        let doc = Document::from_root(ElementNode::new("body").with_children(vec![
            ElementNode::new("div").with_text("sg-0ab12cd34ef56ab78 (web-sg)"),
            table(
                &["Name", "Port range", "Protocol", "Source", "Description"],
                &[
                    &["ssh", "22", "TCP", "0.0.0.0/0", "admin access"],
                    &["app", "5010050500", "TCP", "10.0.0.0/16", ""],
                ],
            ),
            table(
                &["Port range", "Protocol", "Destination"],
                &[&["All", "All", "0.0.0.0/0"]],
            ),
        ]));
        let security = extract_security(&doc);
        assert_eq!(
            security.security_groups.as_deref(),
            Some("sg-0ab12cd34ef56ab78 (web-sg)")
        );
        assert_eq!(security.inbound_rules.len(), 2);
        assert_eq!(security.inbound_rules[0].port_range.as_deref(), Some("22"));
        assert_eq!(
            security.inbound_rules[1].port_range.as_deref(),
            Some("50100-50500")
        );
        assert_eq!(security.outbound_rules.len(), 1);
        assert_eq!(
            security.outbound_rules[0].source_or_dest.as_deref(),
            Some("0.0.0.0/0")
        );
    }

    #[test]
    fn test_networking_interfaces_from_table() {
        let doc = Document::from_root(ElementNode::new("body").with_child(table(
            &["Interface ID", "Description", "Private IPv4 address"],
            &[&["eni-0abc12345def67890", "primary", "10.0.1.5"]],
        )));
        let networking = extract_networking(&doc);
        assert_eq!(networking.network_interfaces.len(), 1);
        let eni = &networking.network_interfaces[0];
        assert_eq!(eni.eni_id, "eni-0abc12345def67890");
        assert_eq!(eni.private_ip.as_deref(), Some("10.0.1.5"));
        assert_eq!(eni.description.as_deref(), Some("primary"));
    }

    #[test]
    fn test_storage_devices_and_total() {
        let doc = Document::from_root(ElementNode::new("body").with_children(vec![
            labeled("Root device name", "/dev/sda1"),
            table(
                &["Volume ID", "Device name", "Volume size (GiB)", "Volume type", "Encrypted"],
                &[
                    &["vol-0abc12345def67890", "/dev/sda1", "8 GiB", "gp3", "Yes"],
                    &["vol-0fed98765cba43210", "/dev/sdf", "100", "gp3", "No"],
                    &["No volumes to display", "", "", "", ""],
                ],
            ),
        ]));
        let storage = extract_storage(&doc);
        assert_eq!(storage.root_device_name.as_deref(), Some("/dev/sda1"));
        assert_eq!(storage.block_devices.len(), 2);
        assert_eq!(storage.block_devices[0].size_gib, Some(8));
        assert_eq!(storage.block_devices[0].encrypted, Some(true));
        assert_eq!(storage.total_storage_gib, 108);
    }
}
