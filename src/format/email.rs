//! Email body and subject formatting.
//!
//! A record renders into an emoji-sectioned plain-text report. Sections
//! appear in a fixed order and a section with no populated fields is
//! omitted entirely. Formatting is pure: the same record always renders
//! to the same string.

use crate::record::{AccountInfo, InstanceRecord, RuleDirection, Service};

/// Separator used throughout the compact body
pub const SEPARATOR_SHORT: &str =
    "────────────────────────────────";
/// Separator used throughout the full body
pub const SEPARATOR_FULL: &str =
    "─────────────────────────────────────────────────────────────────────";

/// Subject line: `🚀 {name} - AWS EC2 Instance [RUNNING]`
pub fn format_subject(record: &InstanceRecord) -> String {
    let name = record
        .name
        .as_deref()
        .unwrap_or(record.instance_id.as_str());
    let state = record
        .state
        .as_deref()
        .unwrap_or("UNKNOWN")
        .to_uppercase();
    format!(
        "🚀 {} - AWS {} Instance [{}]",
        name,
        record.service.display_name(),
        state
    )
}

struct Section {
    header: &'static str,
    lines: Vec<String>,
}

impl Section {
    fn new(header: &'static str) -> Self {
        Self { header, lines: Vec::new() }
    }

    /// Append `emoji Label: value` when the value is present
    fn field(&mut self, emoji: &str, label: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.lines.push(format!("{emoji} {label}: {value}"));
        }
        self
    }

    fn line(&mut self, line: String) -> &mut Self {
        self.lines.push(line);
        self
    }
}

/// Render the report body for one record. `compact` selects the short
/// separator set, keeping the body small enough to ride in a compose
/// URL; the full set is for clipboard and preview output.
pub fn format_body(record: &InstanceRecord, account: &AccountInfo, compact: bool) -> String {
    let mut sections: Vec<Section> = Vec::new();

    let mut s = Section::new("🏢 ACCOUNT INFORMATION");
    s.field("🆔", "Account ID", account.id.as_deref().or(record.owner_id.as_deref()))
        .field("👤", "Account Name", account.name.as_deref())
        .field("🌍", "Region", record.region.as_deref().or(account.region.as_deref()));
    sections.push(s);

    let mut s = Section::new("📊 INSTANCE OVERVIEW");
    s.field("🔖", "Instance ID", Some(record.instance_id.as_str()))
        .field("🏷️", "Name", record.name.as_deref())
        .field(
            "🔄",
            "State",
            record.state.as_deref().map(|v| v.to_uppercase()).as_deref(),
        )
        .field("💻", "Instance Type", record.instance_type.as_deref())
        .field("📍", "Availability Zone", record.availability_zone.as_deref())
        .field("🕐", "Launch Time", record.launch_time.as_deref())
        .field("🕐", "Created", record.created_at.as_deref())
        .field("♻️", "Lifecycle", record.lifecycle.as_deref())
        .field("🏠", "Tenancy", record.tenancy.as_deref())
        .field("📦", "Bundle", record.bundle.as_deref())
        .field("💰", "Monthly Price", record.monthly_price.as_deref())
        .field("🌐", "Networking Type", record.networking_type.as_deref())
        .field("🧾", "Support Code", record.support_code.as_deref())
        .field("👥", "Owner ID", record.owner_id.as_deref())
        .field("🔗", "Instance ARN", record.instance_arn.as_deref());
    sections.push(s);

    let mut s = Section::new("📀 AMI INFORMATION");
    s.field("💿", "AMI ID", record.ami_id.as_deref())
        .field("📛", "AMI Name", record.ami_name.as_deref())
        .field("📂", "AMI Location", record.ami_location.as_deref())
        .field("📘", "Blueprint", record.blueprint.as_deref())
        .field("🧩", "Platform", record.platform.as_deref())
        .field("🧩", "Platform Details", record.platform_details.as_deref())
        .field("🏗️", "Architecture", record.architecture.as_deref())
        .field("🖥️", "Virtualization", record.virtualization_type.as_deref())
        .field("⚙️", "Boot Mode", record.boot_mode.as_deref());
    sections.push(s);

    let mut s = Section::new("🐧 OPERATING SYSTEM");
    s.field("🖥️", "OS", record.os.as_deref())
        .field("🔢", "Version", record.os_version.as_deref());
    sections.push(s);

    let mut s = Section::new("⚙️ CPU & HARDWARE");
    s.field("🧮", "CPU Core Count", record.cpu_core_count.as_deref())
        .field("🧵", "Threads per Core", record.cpu_threads_per_core.as_deref())
        .field("🧮", "vCPUs", record.vcpus.as_deref())
        .field("🧠", "RAM", record.ram.as_deref())
        .field("⚙️", "CPU Options", record.cpu_options.as_deref())
        .field("💳", "Credit Specification", record.credit_specification.as_deref())
        .field("🔐", "Nitro Enclave", record.nitro_enclave.as_deref())
        .field("😴", "Hibernation", record.hibernation.as_deref());
    sections.push(s);

    let mut s = Section::new("💾 STORAGE");
    s.field("📁", "Root Device Name", record.root_device_name.as_deref())
        .field("📁", "Root Device Type", record.root_device_type.as_deref())
        .field("🚀", "EBS Optimization", record.ebs_optimization.as_deref())
        .field("💿", "System Disk", record.system_disk_size.as_deref())
        .field("📂", "System Disk Path", record.system_disk_path.as_deref())
        .field("📸", "Automatic Snapshots", record.automatic_snapshots.as_deref())
        .field("📊", "Storage", record.storage_summary.as_deref())
        .field("📡", "Transfer Allowance", record.transfer_allowance.as_deref());
    for device in &record.block_devices {
        let mut parts: Vec<String> = Vec::new();
        if let Some(name) = &device.device_name {
            parts.push(name.clone());
        }
        if let Some(id) = &device.volume_id {
            parts.push(id.clone());
        }
        if let Some(size) = device.size_gib {
            parts.push(format!("{size} GiB"));
        }
        if let Some(kind) = &device.volume_type {
            parts.push(kind.clone());
        }
        if device.encrypted == Some(true) {
            parts.push("encrypted".to_string());
        }
        if !parts.is_empty() {
            s.line(format!("📦 Volume: {}", parts.join(", ")));
        }
    }
    for disk in &record.additional_disks {
        let name = disk.name.as_deref().unwrap_or("disk");
        let size = disk
            .size_gib
            .map(|n| format!(" {n} GiB"))
            .unwrap_or_default();
        let path = disk
            .path
            .as_deref()
            .map(|p| format!(" at {p}"))
            .unwrap_or_default();
        s.line(format!("📦 Disk: {name}{size}{path}"));
    }
    if record.total_storage_gib > 0 {
        s.line(format!("📊 Total Storage: {} GiB", record.total_storage_gib));
    }
    sections.push(s);

    let mut s = Section::new("🌐 NETWORK");
    s.field("🌍", "Public IPv4", record.public_ipv4.as_deref())
        .field("🏠", "Private IPv4", record.private_ipv4.as_deref())
        .field("🌍", "Public IPv6", record.public_ipv6.as_deref())
        .field("🏠", "Private IPv6", record.private_ipv6.as_deref())
        .field("📌", "Elastic IP", record.elastic_ip.as_deref())
        .field(
            "📌",
            "Static IP",
            record
                .static_ip_name
                .as_deref()
                .or_else(|| record.is_static_ip.then_some("Attached")),
        )
        .field("🌐", "Public DNS", record.public_dns_name.as_deref())
        .field("🌐", "Private DNS", record.private_dns_name.as_deref())
        .field("🔤", "Hostname Type", record.hostname_type.as_deref())
        .field("🛃", "Source/Dest Check", record.source_dest_check.as_deref())
        .field("🕸️", "VPC ID", record.vpc_id.as_deref())
        .field("🧱", "Subnet ID", record.subnet_id.as_deref());
    for eni in &record.network_interfaces {
        let mut line = format!("🔌 Interface: {}", eni.eni_id);
        if let Some(ip) = &eni.private_ip {
            line.push_str(&format!(", {ip}"));
        }
        if let Some(desc) = &eni.description {
            line.push_str(&format!(" ({desc})"));
        }
        s.line(line);
    }
    for domain in &record.domains {
        s.line(format!("🌍 Domain: {domain}"));
    }
    sections.push(s);

    let mut s = Section::new("🔑 IAM & PERMISSIONS");
    s.field("🎭", "IAM Role", record.iam_role.as_deref())
        .field("🎭", "IAM Instance Profile", record.iam_instance_profile.as_deref())
        .field("🗝️", "Key Pair", record.key_pair.as_deref());
    sections.push(s);

    let mut s = Section::new("📈 MONITORING & STATUS");
    s.field("📊", "Monitoring", record.monitoring.as_deref())
        .field("✅", "System Status Check", record.system_status_check.as_deref())
        .field("✅", "Instance Status Check", record.instance_status_check.as_deref())
        .field("🔁", "Auto Recovery", record.auto_recovery.as_deref())
        .field("⚖️", "Load Balancing", record.load_balancing_status.as_deref())
        .field("📡", "Distribution", record.distribution_status.as_deref());
    sections.push(s);

    let mut s = Section::new("🧩 METADATA OPTIONS");
    s.field("🔐", "IMDSv2", record.imdsv2.as_deref())
        .field("🚪", "Metadata Accessible", record.metadata_accessible.as_deref())
        .field("🎫", "HTTP Tokens", record.http_tokens.as_deref())
        .field("🔢", "Hop Limit", record.http_put_response_hop_limit.as_deref());
    sections.push(s);

    let mut s = Section::new("🛡️ SECURITY");
    s.field("🛡️", "Security Groups", record.security_groups.as_deref());
    for rule in &record.security_group_rules {
        let arrow = match rule.direction {
            RuleDirection::Inbound => "⬅️",
            RuleDirection::Outbound => "➡️",
        };
        let peer_label = match rule.direction {
            RuleDirection::Inbound => "from",
            RuleDirection::Outbound => "to",
        };
        let mut line = format!(
            "{arrow} {} {} {}",
            rule.direction.as_str(),
            rule.protocol.as_deref().unwrap_or("any"),
            rule.port_range.as_deref().unwrap_or("all ports"),
        );
        if let Some(peer) = &rule.source_or_dest {
            line.push_str(&format!(" {peer_label} {peer}"));
        }
        if let Some(desc) = &rule.description {
            line.push_str(&format!(" ({desc})"));
        }
        s.line(line);
    }
    for (rules, label) in [
        (&record.firewall_ipv4_rules, "IPv4"),
        (&record.firewall_ipv6_rules, "IPv6"),
    ] {
        for rule in rules.iter() {
            s.line(format!(
                "🔥 {label} firewall: {} {} {} restricted to {}",
                rule.application, rule.protocol, rule.port_range, rule.restricted_to
            ));
        }
    }
    sections.push(s);

    let mut s = Section::new("🏷️ TAGS");
    for (key, value) in &record.tags {
        s.line(format!("🔸 {key}: {value}"));
    }
    sections.push(s);

    let mut s = Section::new("🔑 SSH KEY");
    let key_name = record.ssh_key_name.as_deref().or(record.key_pair.as_deref());
    if key_name.is_some() || record.ssh_user.is_some() {
        s.field("🗝️", "Key Name", key_name)
            .field("👤", "SSH User", Some(ssh_user_for(record)));
        if let (Some(key), Some(addr)) = (key_name, record.best_public_address()) {
            s.line(format!("💻 {}", ssh_command(key, ssh_user_for(record), addr)));
        }
    }
    sections.push(s);

    let mut s = Section::new("⚡ QUICK ACCESS");
    if let Some(url) = console_url(record) {
        s.line(format!("🔗 Console: {url}"));
    }
    if let Some(url) = lightsail_connect_url(record) {
        s.line(format!("🖥️ Browser SSH: {url}"));
    }
    sections.push(s);

    let sep = if compact { SEPARATOR_SHORT } else { SEPARATOR_FULL };

    let mut out = String::new();
    out.push_str(&format!(
        "🚀 AWS {} Instance Details\n{sep}\n\n",
        record.service.display_name()
    ));
    for section in sections.into_iter().filter(|s| !s.lines.is_empty()) {
        out.push_str(section.header);
        out.push('\n');
        out.push_str(sep);
        out.push('\n');
        for line in &section.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(sep);
    out.push('\n');
    out.push_str("📋 Generated by aws-harvest\n");
    out
}

fn lightsail_connect_url(record: &InstanceRecord) -> Option<String> {
    match &record.tabs_data {
        crate::record::TabsData::Lightsail(tabs) => tabs.connect.connect_url.clone(),
        _ => None,
    }
}

/// SSH user: an observed user wins, then the OS decides, then the
/// service default (`ec2-user` for EC2, `admin` for Lightsail).
pub fn ssh_user_for(record: &InstanceRecord) -> &str {
    if let Some(user) = record.ssh_user.as_deref() {
        return user;
    }
    let os = record
        .os
        .as_deref()
        .or(record.blueprint.as_deref())
        .unwrap_or("")
        .to_lowercase();
    match record.service {
        Service::Ec2 => {
            if os.contains("ubuntu") {
                "ubuntu"
            } else {
                "ec2-user"
            }
        }
        Service::Lightsail => {
            if os.contains("ubuntu") {
                "ubuntu"
            } else if os.contains("amazon") {
                "ec2-user"
            } else if os.contains("centos") {
                "centos"
            } else if os.contains("bitnami") {
                "bitnami"
            } else {
                "admin"
            }
        }
    }
}

/// `ssh -i key.pem user@addr`, bracketing IPv6 literals
pub fn ssh_command(key_name: &str, user: &str, address: &str) -> String {
    let key = key_name.trim_end_matches(".pem");
    let addr = if address.contains(':') {
        format!("[{address}]")
    } else {
        address.to_string()
    };
    format!("ssh -i {key}.pem {user}@{addr}")
}

/// Deep link into the console page for this instance
pub fn console_url(record: &InstanceRecord) -> Option<String> {
    let region = record.region.as_deref()?;
    match record.service {
        Service::Ec2 => Some(format!(
            "https://{region}.console.aws.amazon.com/ec2/home?region={region}#Instances:instanceId={}",
            record.instance_id
        )),
        Service::Lightsail => {
            let name = record.name.as_deref().unwrap_or(record.instance_id.as_str());
            Some(format!(
                "https://lightsail.aws.amazon.com/ls/webapp/{region}/instances/{}",
                urlencoding::encode(name)
            ))
        }
    }
}
