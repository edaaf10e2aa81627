//! End-to-end pipeline tests over constructed DOM snapshots: per-tab
//! extraction, aggregation, report formatting, composer dispatch and
//! export, with no browser involved.

use aws_harvest::dom::{Document, ElementNode};
use aws_harvest::export::{HarvestResults, ScrapeOutcome};
use aws_harvest::extract::{self, aggregate, ec2, lightsail};
use aws_harvest::format::{self, plan_compose, ComposeAction, Composer};
use aws_harvest::record::{AccountInfo, Ec2Tabs, LightsailTabs, Service};

fn labeled(label: &str, value: &str) -> ElementNode {
    ElementNode::new("div")
        .with_attr("class", "awsui_column_layout_k2w3x")
        .with_children(vec![
            ElementNode::new("span")
                .with_attr("data-analytics", format!("label-for-{label}"))
                .with_text(label),
            ElementNode::new("div")
                .with_attr("class", "awsui_text-to-copy_h3ll0")
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
    let body: Vec<ElementNode> = rows
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
        .with_children(body)
}

fn ec2_details_doc() -> Document {
    Document::from_root(ElementNode::new("body").with_children(vec![
        labeled("Instance ID", "i-0abc12345def67890"),
        labeled("Instance state", "Running"),
        labeled("Instance type", "t3.medium"),
        labeled("Availability Zone", "us-east-1a"),
        labeled("AMI ID", "ami-0fedcba9876543210"),
        labeled("AMI name", "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server"),
        labeled("Public IPv4 address", "34.201.5.9"),
        labeled("Private IPv4 addresses", "10.0.1.5"),
        labeled("VPC ID", "vpc-0aa11bb22cc33dd44"),
        labeled("Key pair assigned at launch", "prod-key"),
        labeled("Root device name", "/dev/sda1"),
        ElementNode::new("div").with_text("Owner 123456789012"),
    ]))
}

fn ec2_security_doc() -> Document {
    Document::from_root(ElementNode::new("body").with_children(vec![
        ElementNode::new("div").with_text("sg-0ab12cd34ef56ab78 (web-sg)"),
        table(
            &["Name", "Port range", "Protocol", "Source", "Description"],
            &[
                &["ssh", "22", "TCP", "0.0.0.0/0", "admin"],
                &["app range", "5010050500", "TCP", "10.0.0.0/16", ""],
            ],
        ),
        table(
            &["Port range", "Protocol", "Destination"],
            &[&["All", "All", "0.0.0.0/0"]],
        ),
    ]))
}

fn ec2_networking_doc() -> Document {
    Document::from_root(ElementNode::new("body").with_children(vec![
        labeled("Subnet ID", "subnet-0abc12345def67890"),
        table(
            &["Interface ID", "Description", "Private IPv4 address"],
            &[&["eni-0abc12345def67890", "primary", "10.0.1.5"]],
        ),
    ]))
}

fn ec2_storage_doc() -> Document {
    Document::from_root(ElementNode::new("body").with_children(vec![
        labeled("Root device type", "EBS"),
        table(
            &["Volume ID", "Device name", "Volume size (GiB)", "Volume type"],
            &[
                &["vol-0abc12345def67890", "/dev/sda1", "8", "gp3"],
                &["vol-0fed98765cba43210", "/dev/sdf", "100", "gp3"],
            ],
        ),
    ]))
}

fn ec2_tags_doc() -> Document {
    Document::from_root(ElementNode::new("body").with_child(table(
        &["Key", "Value"],
        &[&["Name", "web-1"], &["env", "prod"]],
    )))
}

fn harvest_ec2() -> aws_harvest::InstanceRecord {
    let tabs = Ec2Tabs {
        details: ec2::extract_details(&ec2_details_doc()),
        security: ec2::extract_security(&ec2_security_doc()),
        networking: ec2::extract_networking(&ec2_networking_doc()),
        storage: ec2::extract_storage(&ec2_storage_doc()),
        tags: extract::extract_tags(&ec2_tags_doc()),
    };
    let account = AccountInfo {
        id: Some("123456789012".to_string()),
        name: Some("prod-account".to_string()),
        region: Some("us-east-1".to_string()),
    };
    aggregate::build_ec2_record(tabs, &account).unwrap()
}

#[test]
fn ec2_pipeline_builds_a_complete_record() {
    let record = harvest_ec2();

    assert_eq!(record.instance_id, "i-0abc12345def67890");
    assert_eq!(record.service, Service::Ec2);
    assert_eq!(record.region.as_deref(), Some("us-east-1"));
    assert_eq!(record.state.as_deref(), Some("Running"));
    assert_eq!(record.os.as_deref(), Some("Ubuntu"));
    assert_eq!(record.os_version.as_deref(), Some("22.04"));

    // Details had no subnet; the Networking tab fills it
    assert_eq!(record.subnet_id.as_deref(), Some("subnet-0abc12345def67890"));
    // Security tab's name-augmented group list wins
    assert_eq!(
        record.security_groups.as_deref(),
        Some("sg-0ab12cd34ef56ab78 (web-sg)")
    );
    // Inbound rules come before outbound, fused port ranges are repaired
    assert_eq!(record.security_group_rules.len(), 3);
    assert_eq!(
        record.security_group_rules[1].port_range.as_deref(),
        Some("50100-50500")
    );
    assert_eq!(record.security_group_rules[2].direction.as_str(), "outbound");

    assert_eq!(record.total_storage_gib, 108);
    assert_eq!(record.network_interfaces.len(), 1);
    assert_eq!(record.tags.get("env").map(String::as_str), Some("prod"));
}

#[test]
fn ec2_report_contains_exact_identity_lines() {
    let record = harvest_ec2();
    let account = AccountInfo {
        id: Some("123456789012".to_string()),
        name: Some("prod-account".to_string()),
        region: Some("us-east-1".to_string()),
    };

    let subject = format::format_subject(&record);
    assert_eq!(subject, "🚀 web-1 - AWS EC2 Instance [RUNNING]");

    let body = format::format_body(&record, &account, false);
    assert!(body.contains("🔖 Instance ID: i-0abc12345def67890"));
    assert!(body.contains("🔄 State: RUNNING"));
    assert!(body.contains("🆔 Account ID: 123456789012"));
    assert!(body.contains("🔸 Name: web-1"));
    assert!(body.contains("📊 Total Storage: 108 GiB"));
    assert!(body.contains("ssh -i prod-key.pem ubuntu@34.201.5.9"));
    assert!(body.contains(
        "https://us-east-1.console.aws.amazon.com/ec2/home?region=us-east-1#Instances:instanceId=i-0abc12345def67890"
    ));

    // Formatting is deterministic
    assert_eq!(body, format::format_body(&record, &account, false));
}

#[test]
fn long_report_degrades_to_clipboard() {
    let record = harvest_ec2();
    let account = AccountInfo::default();
    let subject = format::format_subject(&record);
    let body = format::format_body(&record, &account, true);

    // The full report is far beyond the URL budget once encoded
    let padded = body.repeat(20);
    let action = plan_compose(Composer::Gmail, &subject, &padded, Some(&padded));
    match action {
        ComposeAction::CopyAndOpen { url, clipboard } => {
            assert!(url.len() <= format::MAX_URL_LENGTH);
            assert!(!url.contains("&body="));
            assert_eq!(clipboard, padded);
        }
        ComposeAction::Open { .. } => panic!("expected clipboard fallback"),
    }
}

fn lightsail_connect_doc() -> Document {
    Document::from_root(ElementNode::new("body").with_children(vec![
        ElementNode::new("div").with_text("Running us-east-1a Ubuntu 22.04 LTS"),
        ElementNode::new("div").with_text("1 GB RAM, 2 vCPUs, 40 GB SSD, 2 TB transfer $7 USD"),
        ElementNode::new("div").with_text("ssh ubuntu@52.3.7.99 Private IP: 172.26.5.11"),
    ]))
    .with_url("https://lightsail.aws.amazon.com/ls/webapp/us-east-1/instances/blog/connect")
}

#[test]
fn lightsail_pipeline_builds_a_record_keyed_by_name() {
    let tabs = LightsailTabs {
        connect: lightsail::extract_connect(&lightsail_connect_doc()),
        ..Default::default()
    };
    let record = aggregate::build_lightsail_record(tabs, &AccountInfo::default()).unwrap();

    assert_eq!(record.instance_id, "blog");
    assert_eq!(record.service, Service::Lightsail);
    assert_eq!(record.region.as_deref(), Some("us-east-1"));
    assert_eq!(record.ram.as_deref(), Some("1 GB"));
    assert_eq!(record.public_ipv4.as_deref(), Some("52.3.7.99"));
    assert_eq!(record.private_ipv4.as_deref(), Some("172.26.5.11"));

    let subject = format::format_subject(&record);
    assert_eq!(subject, "🚀 blog - AWS Lightsail Instance [RUNNING]");
}

#[test]
fn export_round_covers_both_services_and_failures() {
    let mut results = HarvestResults::new(Some("us-east-1"));
    results.ec2.push(harvest_ec2().into());
    results.ec2.push(ScrapeOutcome::Failure {
        instance_id: "i-0dead00000000beef".to_string(),
        error: "detail page never settled".to_string(),
    });

    let tabs = LightsailTabs {
        connect: lightsail::extract_connect(&lightsail_connect_doc()),
        ..Default::default()
    };
    results
        .lightsail
        .push(aggregate::build_lightsail_record(tabs, &AccountInfo::default()).unwrap().into());

    // JSON keeps records and failure stubs side by side
    let json: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
    assert_eq!(json["ec2"][0]["instanceId"], "i-0abc12345def67890");
    assert_eq!(json["ec2"][1]["error"], "detail page never settled");
    assert_eq!(json["lightsail"][0]["instanceId"], "blog");
    // Absent fields are nulls, not missing keys
    assert!(json["ec2"][0].as_object().unwrap().contains_key("elasticIp"));

    // CSV header is the sorted union of keys across every row
    let csv = results.to_csv().unwrap();
    let header: Vec<&str> = csv.lines().next().unwrap().split(',').collect();
    assert!(header.contains(&"instanceId"));
    assert!(header.contains(&"blueprint"));
    assert!(header.contains(&"error"));
    let mut sorted = header.clone();
    sorted.sort_unstable();
    assert_eq!(header, sorted);
    assert_eq!(csv.lines().count(), 4);
}
