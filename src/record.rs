//! The Instance Record data model.
//!
//! An [`InstanceRecord`] is the normalized, merged representation of one
//! cloud instance's scraped attributes. Records are built fresh per
//! extraction run by the aggregator, never mutated after formatting, and
//! serialized with the original camelCase key names so JSON/CSV output
//! stays stable.
//!
//! Scalar fields are `Option<String>`: `None` means "not present in the
//! DOM". Serde keeps the `null`s — a consumer always sees every key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which console the record was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Ec2,
    Lightsail,
}

impl Service {
    /// Lowercase wire name ("ec2" / "lightsail")
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Ec2 => "ec2",
            Service::Lightsail => "lightsail",
        }
    }

    /// Human display name ("EC2" / "Lightsail")
    pub fn display_name(&self) -> &'static str {
        match self {
            Service::Ec2 => "EC2",
            Service::Lightsail => "Lightsail",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a security group rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDirection {
    Inbound,
    Outbound,
}

impl RuleDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleDirection::Inbound => "inbound",
            RuleDirection::Outbound => "outbound",
        }
    }
}

/// One security group rule scraped from the Security tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    #[serde(rename = "type")]
    pub direction: RuleDirection,
    pub protocol: Option<String>,
    pub port_range: Option<String>,
    /// Source (inbound) or destination (outbound) CIDR/group
    pub source_or_dest: Option<String>,
    pub description: Option<String>,
}

/// A security group id/name pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRef {
    pub group_id: String,
    pub group_name: Option<String>,
}

/// One EBS block device row from the Storage tab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDevice {
    pub volume_id: Option<String>,
    pub device_name: Option<String>,
    /// Size in GiB; `None` when the cell could not be parsed
    pub size_gib: Option<u64>,
    pub volume_type: Option<String>,
    pub iops: Option<u64>,
    pub throughput: Option<u64>,
    pub delete_on_termination: Option<bool>,
    pub encrypted: Option<bool>,
}

/// One elastic network interface from the Networking tab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub eni_id: String,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub subnet_id: Option<String>,
    pub description: Option<String>,
}

impl NetworkInterface {
    pub fn new(eni_id: impl Into<String>) -> Self {
        Self { eni_id: eni_id.into(), ..Default::default() }
    }
}

/// One Lightsail firewall rule (IPv4 or IPv6 table)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    pub application: String,
    pub protocol: String,
    pub port_range: String,
    pub restricted_to: String,
}

/// One attached Lightsail disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskInfo {
    pub name: Option<String>,
    pub size_gib: Option<u64>,
    pub path: Option<String>,
    pub status: Option<String>,
}

/// Account identity pulled from the console session metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub region: Option<String>,
}

/// Tag key → value mapping; keys unique, insertion order preserved
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsData {
    pub tags: IndexMap<String, String>,
    pub tag_count: usize,
}

impl TagsData {
    pub fn from_tags(tags: IndexMap<String, String>) -> Self {
        let tag_count = tags.len();
        Self { tags, tag_count }
    }
}

// ---------------------------------------------------------------------------
// Per-tab partial records
//
// Each extractor returns one of these, fully populated: every field the
// extractor owns is present, with `None` standing in for "not found".
// ---------------------------------------------------------------------------

/// EC2 Details tab partial record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Details {
    pub instance_id: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub instance_type: Option<String>,
    pub lifecycle: Option<String>,
    pub launch_time: Option<String>,
    pub usage_operation: Option<String>,

    // Placement
    pub availability_zone: Option<String>,
    pub tenancy: Option<String>,
    pub placement_group: Option<String>,
    pub host_id: Option<String>,
    pub capacity_reservation: Option<String>,
    pub partition_number: Option<String>,

    // AMI
    pub ami_id: Option<String>,
    pub ami_name: Option<String>,
    pub ami_location: Option<String>,
    pub platform: Option<String>,
    pub platform_details: Option<String>,
    pub architecture: Option<String>,
    pub virtualization_type: Option<String>,
    pub boot_mode: Option<String>,

    // Operating system inferred from the AMI name or page text
    pub os: Option<String>,
    pub os_version: Option<String>,

    // IAM & access
    pub iam_role: Option<String>,
    pub iam_instance_profile: Option<String>,
    pub key_pair: Option<String>,

    // Networking summary shown on the Details tab
    pub public_ipv4: Option<String>,
    pub private_ipv4: Option<String>,
    pub public_ipv6: Option<String>,
    pub private_ipv6: Option<String>,
    pub public_dns_name: Option<String>,
    pub private_dns_name: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub source_dest_check: Option<String>,
    pub hostname_type: Option<String>,
    pub answer_private_dns_name: Option<String>,
    pub elastic_ip: Option<String>,
    pub auto_assigned_ip: Option<String>,

    // Identity
    pub instance_arn: Option<String>,
    pub owner_id: Option<String>,
    pub managed: Option<String>,
    pub operator: Option<String>,

    // Status
    pub system_status_check: Option<String>,
    pub instance_status_check: Option<String>,

    // CPU
    pub cpu_core_count: Option<String>,
    pub cpu_threads_per_core: Option<String>,
    pub cpu_options: Option<String>,
    pub credit_specification: Option<String>,

    // Hardware features
    pub monitoring: Option<String>,
    pub ebs_optimized: Option<String>,
    pub nitro_enclave: Option<String>,
    pub hibernation: Option<String>,
    pub elastic_gpu_id: Option<String>,
    pub elastic_inference_accelerator: Option<String>,

    // Storage summary
    pub root_device_name: Option<String>,
    pub root_device_type: Option<String>,

    // Metadata options
    pub metadata_accessible: Option<String>,
    pub imdsv2: Option<String>,
    pub http_tokens: Option<String>,
    pub http_put_response_hop_limit: Option<String>,
    pub http_endpoint: Option<String>,
    pub instance_metadata_tags: Option<String>,

    // Maintenance & protection
    pub auto_recovery: Option<String>,
    pub stop_protection: Option<String>,
    pub termination_protection: Option<String>,
    pub maintenance_status: Option<String>,
    pub license_configuration: Option<String>,

    // Scanner-derived
    pub security_groups: Option<String>,
    pub volume_ids: Vec<String>,
}

/// EC2 Security tab partial record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Security {
    /// Name-augmented human string, e.g. `sg-0ab12 (web-sg)`
    pub security_groups: Option<String>,
    pub security_group_details: Vec<SecurityGroupRef>,
    pub inbound_rules: Vec<SecurityRule>,
    pub outbound_rules: Vec<SecurityRule>,
    pub iam_role: Option<String>,
    pub key_pair: Option<String>,
}

/// EC2 Networking tab partial record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Networking {
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub public_dns_name: Option<String>,
    pub private_dns_name: Option<String>,
    pub public_ipv4: Option<String>,
    pub private_ipv4: Option<String>,
    pub public_ipv6: Option<String>,
    pub private_ipv6: Option<String>,
    /// Bare scanner-derived id list, e.g. `sg-0ab12, sg-0cd34`
    pub security_groups: Option<String>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub elastic_ip_allocations: Vec<String>,
}

/// EC2 Storage tab partial record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Storage {
    pub root_device_name: Option<String>,
    pub root_device_type: Option<String>,
    pub ebs_optimization: Option<String>,
    pub block_devices: Vec<BlockDevice>,
    #[serde(rename = "totalStorageGiB")]
    pub total_storage_gib: u64,
}

/// All EC2 per-tab partials, retained on the record for reference
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Tabs {
    pub details: Ec2Details,
    pub security: Ec2Security,
    pub networking: Ec2Networking,
    pub storage: Ec2Storage,
    pub tags: TagsData,
}

/// Lightsail Connect tab partial record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightsailConnect {
    pub name: Option<String>,
    pub state: Option<String>,
    pub availability_zone: Option<String>,

    pub blueprint: Option<String>,
    pub os: Option<String>,
    pub os_version: Option<String>,

    pub bundle: Option<String>,
    pub ram: Option<String>,
    pub vcpus: Option<String>,
    pub storage: Option<String>,
    pub transfer_allowance: Option<String>,
    pub monthly_price: Option<String>,

    pub instance_type: Option<String>,
    pub networking_type: Option<String>,

    pub ssh_key_name: Option<String>,
    pub ssh_user: Option<String>,
    pub connect_url: Option<String>,

    pub public_ipv4: Option<String>,
    pub private_ipv4: Option<String>,
    pub public_ipv6: Option<String>,
    pub is_static_ip: bool,

    pub support_code: Option<String>,
    pub created_at: Option<String>,
}

/// Lightsail Storage tab partial record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightsailStorage {
    pub system_disk_size: Option<String>,
    pub system_disk_path: Option<String>,
    pub system_disk_name: Option<String>,
    pub system_disk_type: Option<String>,
    pub additional_disks: Vec<DiskInfo>,
    pub automatic_snapshots: Option<String>,
    #[serde(rename = "totalStorageGiB")]
    pub total_storage_gib: u64,
}

/// Lightsail Networking tab partial record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightsailNetworking {
    pub public_ipv4: Option<String>,
    pub private_ipv4: Option<String>,
    pub is_static_ip: bool,
    pub static_ip_name: Option<String>,
    pub ipv6_enabled: bool,
    pub ipv6_addresses: Vec<String>,
    pub firewall_ipv4_rules: Vec<FirewallRule>,
    pub firewall_ipv6_rules: Vec<FirewallRule>,
    pub load_balancing_status: Option<String>,
    pub distribution_status: Option<String>,
}

/// Lightsail Domains tab partial record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightsailDomains {
    pub domains: Vec<String>,
    pub status: Option<String>,
}

/// All Lightsail per-tab partials
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightsailTabs {
    pub connect: LightsailConnect,
    pub storage: LightsailStorage,
    pub networking: LightsailNetworking,
    pub domains: LightsailDomains,
    pub tags: TagsData,
}

/// Raw per-tab partials attached to a record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TabsData {
    Ec2(Box<Ec2Tabs>),
    Lightsail(Box<LightsailTabs>),
}

/// The canonical output of one scrape: every attribute of one instance,
/// merged across tabs with Details/Connect precedence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    // Identity
    pub instance_id: String,
    pub service: Service,
    pub region: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,

    // Compute
    pub instance_type: Option<String>,
    pub availability_zone: Option<String>,
    pub tenancy: Option<String>,
    pub placement_group: Option<String>,
    pub lifecycle: Option<String>,
    pub launch_time: Option<String>,
    pub owner_id: Option<String>,
    pub instance_arn: Option<String>,
    pub managed: Option<String>,
    pub operator: Option<String>,
    pub cpu_core_count: Option<String>,
    pub cpu_threads_per_core: Option<String>,
    pub cpu_options: Option<String>,
    pub credit_specification: Option<String>,
    pub nitro_enclave: Option<String>,
    pub hibernation: Option<String>,
    pub elastic_gpu_id: Option<String>,
    pub elastic_inference_accelerator: Option<String>,

    // AMI / platform
    pub ami_id: Option<String>,
    pub ami_name: Option<String>,
    pub ami_location: Option<String>,
    pub platform: Option<String>,
    pub platform_details: Option<String>,
    pub architecture: Option<String>,
    pub virtualization_type: Option<String>,
    pub boot_mode: Option<String>,
    pub os: Option<String>,
    pub os_version: Option<String>,

    // Network
    pub public_ipv4: Option<String>,
    pub private_ipv4: Option<String>,
    pub public_ipv6: Option<String>,
    pub private_ipv6: Option<String>,
    pub public_dns_name: Option<String>,
    pub private_dns_name: Option<String>,
    pub hostname_type: Option<String>,
    pub elastic_ip: Option<String>,
    pub auto_assigned_ip: Option<String>,
    pub source_dest_check: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub network_interfaces: Vec<NetworkInterface>,

    // Security
    pub security_groups: Option<String>,
    pub security_group_rules: Vec<SecurityRule>,
    pub iam_role: Option<String>,
    pub iam_instance_profile: Option<String>,
    pub key_pair: Option<String>,

    // Monitoring & metadata options
    pub monitoring: Option<String>,
    pub system_status_check: Option<String>,
    pub instance_status_check: Option<String>,
    pub auto_recovery: Option<String>,
    pub imdsv2: Option<String>,
    pub metadata_accessible: Option<String>,
    pub http_tokens: Option<String>,
    pub http_put_response_hop_limit: Option<String>,

    // Storage
    pub root_device_name: Option<String>,
    pub root_device_type: Option<String>,
    pub ebs_optimization: Option<String>,
    pub block_devices: Vec<BlockDevice>,
    #[serde(rename = "totalStorageGiB")]
    pub total_storage_gib: u64,

    // Lightsail bundle/blueprint
    pub blueprint: Option<String>,
    pub bundle: Option<String>,
    pub ram: Option<String>,
    pub vcpus: Option<String>,
    pub storage_summary: Option<String>,
    pub transfer_allowance: Option<String>,
    pub monthly_price: Option<String>,
    pub networking_type: Option<String>,
    pub support_code: Option<String>,
    pub created_at: Option<String>,
    pub ssh_key_name: Option<String>,
    pub ssh_user: Option<String>,
    pub is_static_ip: bool,
    pub static_ip_name: Option<String>,
    pub ipv6_enabled: bool,
    pub firewall_ipv4_rules: Vec<FirewallRule>,
    pub firewall_ipv6_rules: Vec<FirewallRule>,
    pub system_disk_size: Option<String>,
    pub system_disk_path: Option<String>,
    pub additional_disks: Vec<DiskInfo>,
    pub automatic_snapshots: Option<String>,
    pub load_balancing_status: Option<String>,
    pub distribution_status: Option<String>,
    pub domains: Vec<String>,

    // Tags
    pub tags: IndexMap<String, String>,

    // Raw per-tab partials for reference
    pub tabs_data: TabsData,
}

impl InstanceRecord {
    /// Start an empty record for the given identity. All optional fields
    /// begin absent; the aggregator fills them in.
    pub fn new(instance_id: impl Into<String>, service: Service) -> Self {
        let tabs_data = match service {
            Service::Ec2 => TabsData::Ec2(Box::default()),
            Service::Lightsail => TabsData::Lightsail(Box::default()),
        };
        Self {
            instance_id: instance_id.into(),
            service,
            region: None,
            name: None,
            state: None,
            instance_type: None,
            availability_zone: None,
            tenancy: None,
            placement_group: None,
            lifecycle: None,
            launch_time: None,
            owner_id: None,
            instance_arn: None,
            managed: None,
            operator: None,
            cpu_core_count: None,
            cpu_threads_per_core: None,
            cpu_options: None,
            credit_specification: None,
            nitro_enclave: None,
            hibernation: None,
            elastic_gpu_id: None,
            elastic_inference_accelerator: None,
            ami_id: None,
            ami_name: None,
            ami_location: None,
            platform: None,
            platform_details: None,
            architecture: None,
            virtualization_type: None,
            boot_mode: None,
            os: None,
            os_version: None,
            public_ipv4: None,
            private_ipv4: None,
            public_ipv6: None,
            private_ipv6: None,
            public_dns_name: None,
            private_dns_name: None,
            hostname_type: None,
            elastic_ip: None,
            auto_assigned_ip: None,
            source_dest_check: None,
            vpc_id: None,
            subnet_id: None,
            network_interfaces: Vec::new(),
            security_groups: None,
            security_group_rules: Vec::new(),
            iam_role: None,
            iam_instance_profile: None,
            key_pair: None,
            monitoring: None,
            system_status_check: None,
            instance_status_check: None,
            auto_recovery: None,
            imdsv2: None,
            metadata_accessible: None,
            http_tokens: None,
            http_put_response_hop_limit: None,
            root_device_name: None,
            root_device_type: None,
            ebs_optimization: None,
            block_devices: Vec::new(),
            total_storage_gib: 0,
            blueprint: None,
            bundle: None,
            ram: None,
            vcpus: None,
            storage_summary: None,
            transfer_allowance: None,
            monthly_price: None,
            networking_type: None,
            support_code: None,
            created_at: None,
            ssh_key_name: None,
            ssh_user: None,
            is_static_ip: false,
            static_ip_name: None,
            ipv6_enabled: false,
            firewall_ipv4_rules: Vec::new(),
            firewall_ipv6_rules: Vec::new(),
            system_disk_size: None,
            system_disk_path: None,
            additional_disks: Vec::new(),
            automatic_snapshots: None,
            load_balancing_status: None,
            distribution_status: None,
            domains: Vec::new(),
            tags: IndexMap::new(),
            tabs_data,
        }
    }

    /// Best public address for SSH: public IPv4 first, then public IPv6
    pub fn best_public_address(&self) -> Option<&str> {
        self.public_ipv4.as_deref().or(self.public_ipv6.as_deref())
    }
}

impl Default for TabsData {
    fn default() -> Self {
        TabsData::Ec2(Box::default())
    }
}
