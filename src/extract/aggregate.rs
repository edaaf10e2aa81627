//! Record aggregation.
//!
//! Per-tab partials merge into one [`InstanceRecord`]. The Details (EC2)
//! or Connect (Lightsail) tab is the base; later tabs only fill fields the
//! base left absent. The one curated exception: the Security tab's
//! name-augmented group list beats the bare id list scanned elsewhere.

use crate::error::{HarvestError, Result};
use crate::record::{
    AccountInfo, Ec2Tabs, InstanceRecord, LightsailTabs, Service, TabsData,
};

/// Fill `dst` from `src` when `dst` is still absent
fn fill(dst: &mut Option<String>, src: &Option<String>) {
    if dst.is_none() {
        *dst = src.clone();
    }
}

/// Merge EC2 tab partials into a record.
///
/// Fails with [`HarvestError::InstanceIdNotFound`] when no tab produced an
/// instance id; a record without identity is useless downstream.
pub fn build_ec2_record(tabs: Ec2Tabs, account: &AccountInfo) -> Result<InstanceRecord> {
    let instance_id = tabs.details.instance_id.clone().ok_or_else(|| {
        HarvestError::InstanceIdNotFound(
            tabs.details
                .name
                .clone()
                .unwrap_or_else(|| "unnamed instance".to_string()),
        )
    })?;

    let mut record = InstanceRecord::new(instance_id, Service::Ec2);
    let details = &tabs.details;
    let security = &tabs.security;
    let networking = &tabs.networking;
    let storage = &tabs.storage;

    record.region = account
        .region
        .clone()
        .or_else(|| details.availability_zone.as_deref().map(crate::extract::patterns::region_of_zone));

    record.name = details.name.clone();
    record.state = details.state.clone();
    record.instance_type = details.instance_type.clone();
    record.availability_zone = details.availability_zone.clone();
    record.tenancy = details.tenancy.clone();
    record.placement_group = details.placement_group.clone();
    record.lifecycle = details.lifecycle.clone();
    record.launch_time = details.launch_time.clone();
    record.owner_id = details.owner_id.clone().or_else(|| account.id.clone());
    record.instance_arn = details.instance_arn.clone();
    record.managed = details.managed.clone();
    record.operator = details.operator.clone();
    record.cpu_core_count = details.cpu_core_count.clone();
    record.cpu_threads_per_core = details.cpu_threads_per_core.clone();
    record.cpu_options = details.cpu_options.clone();
    record.credit_specification = details.credit_specification.clone();
    record.nitro_enclave = details.nitro_enclave.clone();
    record.hibernation = details.hibernation.clone();
    record.elastic_gpu_id = details.elastic_gpu_id.clone();
    record.elastic_inference_accelerator = details.elastic_inference_accelerator.clone();

    record.ami_id = details.ami_id.clone();
    record.ami_name = details.ami_name.clone();
    record.ami_location = details.ami_location.clone();
    record.platform = details.platform.clone();
    record.platform_details = details.platform_details.clone();
    record.architecture = details.architecture.clone();
    record.virtualization_type = details.virtualization_type.clone();
    record.boot_mode = details.boot_mode.clone();
    record.os = details.os.clone();
    record.os_version = details.os_version.clone();

    record.public_ipv4 = details.public_ipv4.clone();
    record.private_ipv4 = details.private_ipv4.clone();
    record.public_ipv6 = details.public_ipv6.clone();
    record.private_ipv6 = details.private_ipv6.clone();
    record.public_dns_name = details.public_dns_name.clone();
    record.private_dns_name = details.private_dns_name.clone();
    record.hostname_type = details.hostname_type.clone();
    record.elastic_ip = details.elastic_ip.clone();
    record.auto_assigned_ip = details.auto_assigned_ip.clone();
    record.source_dest_check = details.source_dest_check.clone();
    record.vpc_id = details.vpc_id.clone();
    record.subnet_id = details.subnet_id.clone();

    record.monitoring = details.monitoring.clone();
    record.system_status_check = details.system_status_check.clone();
    record.instance_status_check = details.instance_status_check.clone();
    record.auto_recovery = details.auto_recovery.clone();
    record.imdsv2 = details.imdsv2.clone();
    record.metadata_accessible = details.metadata_accessible.clone();
    record.http_tokens = details.http_tokens.clone();
    record.http_put_response_hop_limit = details.http_put_response_hop_limit.clone();

    record.root_device_name = details.root_device_name.clone();
    record.root_device_type = details.root_device_type.clone();
    record.ebs_optimization = details.ebs_optimized.clone();

    record.iam_role = details.iam_role.clone();
    record.iam_instance_profile = details.iam_instance_profile.clone();
    record.key_pair = details.key_pair.clone();
    record.security_groups = details.security_groups.clone();

    // Security tab
    if security.security_groups.is_some() {
        record.security_groups = security.security_groups.clone();
    }
    record.security_group_rules = security
        .inbound_rules
        .iter()
        .chain(security.outbound_rules.iter())
        .cloned()
        .collect();
    fill(&mut record.iam_role, &security.iam_role);
    fill(&mut record.key_pair, &security.key_pair);

    // Networking tab
    fill(&mut record.vpc_id, &networking.vpc_id);
    fill(&mut record.subnet_id, &networking.subnet_id);
    fill(&mut record.public_dns_name, &networking.public_dns_name);
    fill(&mut record.private_dns_name, &networking.private_dns_name);
    fill(&mut record.public_ipv4, &networking.public_ipv4);
    fill(&mut record.private_ipv4, &networking.private_ipv4);
    fill(&mut record.public_ipv6, &networking.public_ipv6);
    fill(&mut record.private_ipv6, &networking.private_ipv6);
    record.network_interfaces = networking.network_interfaces.clone();

    // Storage tab
    fill(&mut record.root_device_name, &storage.root_device_name);
    fill(&mut record.root_device_type, &storage.root_device_type);
    fill(&mut record.ebs_optimization, &storage.ebs_optimization);
    record.block_devices = storage.block_devices.clone();
    record.total_storage_gib = storage.total_storage_gib;

    // Tags tab; the Name tag stands in for a missing name
    record.tags = tabs.tags.tags.clone();
    if record.name.is_none() {
        record.name = record.tags.get("Name").cloned();
    }

    record.tabs_data = TabsData::Ec2(Box::new(tabs));
    Ok(record)
}

/// Merge Lightsail tab partials into a record. Lightsail instances are
/// identified by name, which doubles as the record's instance id.
pub fn build_lightsail_record(
    tabs: LightsailTabs,
    account: &AccountInfo,
) -> Result<InstanceRecord> {
    let name = tabs.connect.name.clone().ok_or_else(|| {
        HarvestError::InstanceIdNotFound("unnamed Lightsail instance".to_string())
    })?;

    let mut record = InstanceRecord::new(name.clone(), Service::Lightsail);
    let connect = &tabs.connect;
    let storage = &tabs.storage;
    let networking = &tabs.networking;
    let domains = &tabs.domains;

    record.name = Some(name);
    record.state = connect.state.clone();
    record.availability_zone = connect.availability_zone.clone();
    record.region = account.region.clone().or_else(|| {
        connect
            .availability_zone
            .as_deref()
            .map(crate::extract::patterns::region_of_zone)
    });
    record.owner_id = account.id.clone();

    record.blueprint = connect.blueprint.clone();
    record.os = connect.os.clone();
    record.os_version = connect.os_version.clone();
    record.bundle = connect.bundle.clone();
    record.ram = connect.ram.clone();
    record.vcpus = connect.vcpus.clone();
    record.storage_summary = connect.storage.clone();
    record.transfer_allowance = connect.transfer_allowance.clone();
    record.monthly_price = connect.monthly_price.clone();
    record.instance_type = connect.instance_type.clone();
    record.networking_type = connect.networking_type.clone();
    record.ssh_key_name = connect.ssh_key_name.clone();
    record.ssh_user = connect.ssh_user.clone();
    record.support_code = connect.support_code.clone();
    record.created_at = connect.created_at.clone();

    record.public_ipv4 = connect.public_ipv4.clone();
    record.private_ipv4 = connect.private_ipv4.clone();
    record.public_ipv6 = connect.public_ipv6.clone();
    record.is_static_ip = connect.is_static_ip;

    // Storage tab
    record.system_disk_size = storage.system_disk_size.clone();
    record.system_disk_path = storage.system_disk_path.clone();
    record.additional_disks = storage.additional_disks.clone();
    record.automatic_snapshots = storage.automatic_snapshots.clone();
    record.total_storage_gib = storage.total_storage_gib;

    // Networking tab
    fill(&mut record.public_ipv4, &networking.public_ipv4);
    fill(&mut record.private_ipv4, &networking.private_ipv4);
    record.is_static_ip = record.is_static_ip || networking.is_static_ip;
    record.static_ip_name = networking.static_ip_name.clone();
    record.ipv6_enabled = networking.ipv6_enabled;
    if record.public_ipv6.is_none() {
        record.public_ipv6 = networking.ipv6_addresses.first().cloned();
    }
    record.firewall_ipv4_rules = networking.firewall_ipv4_rules.clone();
    record.firewall_ipv6_rules = networking.firewall_ipv6_rules.clone();
    record.load_balancing_status = networking.load_balancing_status.clone();
    record.distribution_status = networking.distribution_status.clone();

    record.domains = domains.domains.clone();

    record.tags = tabs.tags.tags.clone();

    record.tabs_data = TabsData::Lightsail(Box::new(tabs));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Ec2Details, Ec2Security, LightsailConnect};
    use indexmap::IndexMap;

    #[test]
    fn test_ec2_requires_instance_id() {
        let tabs = Ec2Tabs::default();
        let err = build_ec2_record(tabs, &AccountInfo::default()).unwrap_err();
        assert!(matches!(err, HarvestError::InstanceIdNotFound(_)));
    }

    #[test]
    fn test_ec2_merge_precedence() {
        let mut tabs = Ec2Tabs {
            details: Ec2Details {
                instance_id: Some("i-0abc12345def67890".to_string()),
                vpc_id: Some("vpc-from-details".to_string()),
                security_groups: Some("sg-0aa11bb22cc33dd44".to_string()),
                ..Default::default()
            },
            security: Ec2Security {
                security_groups: Some("sg-0aa11bb22cc33dd44 (web-sg)".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        tabs.networking.vpc_id = Some("vpc-from-networking".to_string());
        tabs.networking.subnet_id = Some("subnet-0abc12345def67890".to_string());

        let record = build_ec2_record(tabs, &AccountInfo::default()).unwrap();
        // Details wins for fields it already has
        assert_eq!(record.vpc_id.as_deref(), Some("vpc-from-details"));
        // Networking fills the gap
        assert_eq!(record.subnet_id.as_deref(), Some("subnet-0abc12345def67890"));
        // Security tab's name-augmented list beats the bare scan
        assert_eq!(
            record.security_groups.as_deref(),
            Some("sg-0aa11bb22cc33dd44 (web-sg)")
        );
    }

    #[test]
    fn test_ec2_name_falls_back_to_name_tag() {
        let mut tags = IndexMap::new();
        tags.insert("Name".to_string(), "web-1".to_string());
        let tabs = Ec2Tabs {
            details: Ec2Details {
                instance_id: Some("i-0abc12345def67890".to_string()),
                ..Default::default()
            },
            tags: crate::record::TagsData::from_tags(tags),
            ..Default::default()
        };
        let record = build_ec2_record(tabs, &AccountInfo::default()).unwrap();
        assert_eq!(record.name.as_deref(), Some("web-1"));
    }

    #[test]
    fn test_ec2_region_from_zone_when_account_silent() {
        let tabs = Ec2Tabs {
            details: Ec2Details {
                instance_id: Some("i-0abc12345def67890".to_string()),
                availability_zone: Some("eu-west-2b".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let record = build_ec2_record(tabs, &AccountInfo::default()).unwrap();
        assert_eq!(record.region.as_deref(), Some("eu-west-2"));
    }

    #[test]
    fn test_lightsail_requires_name() {
        let err =
            build_lightsail_record(LightsailTabs::default(), &AccountInfo::default()).unwrap_err();
        assert!(matches!(err, HarvestError::InstanceIdNotFound(_)));
    }

    #[test]
    fn test_lightsail_record_identity_is_name() {
        let tabs = LightsailTabs {
            connect: LightsailConnect {
                name: Some("web-1".to_string()),
                state: Some("Running".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let record = build_lightsail_record(tabs, &AccountInfo::default()).unwrap();
        assert_eq!(record.instance_id, "web-1");
        assert_eq!(record.service, Service::Lightsail);
        assert_eq!(record.state.as_deref(), Some("Running"));
    }
}
