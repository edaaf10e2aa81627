//! Table role detection.
//!
//! Detail pages render several tables without stable ids, so each table is
//! classified by its header vocabulary before row parsing.

use indexmap::IndexMap;

use crate::dom::{Document, TableView};
use crate::extract::field::presence;
use crate::record::TagsData;

/// What a scraped table holds, judged from its headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// Security group rules with a Source column
    Inbound,
    /// Security group rules with a Destination column
    Outbound,
    /// Lightsail firewall rules (Application / Protocol / Port)
    Firewall,
    /// EBS volumes / block device mappings
    BlockDevices,
    /// Key/value tag listing
    Tags,
    Unknown,
}

/// Classify a table by substring matches on its (lowercased) headers.
/// Checks run in specificity order; the first vocabulary hit wins.
pub fn classify(table: &TableView) -> TableRole {
    if table.header_contains("source") {
        TableRole::Inbound
    } else if table.header_contains("destination") {
        TableRole::Outbound
    } else if table.header_contains("application") {
        TableRole::Firewall
    } else if table.header_contains("device")
        || table.header_contains("volume")
        || table.header_contains("size")
    {
        TableRole::BlockDevices
    } else if table.header_contains("key") && table.header_contains("value") {
        TableRole::Tags
    } else {
        TableRole::Unknown
    }
}

/// Index of the first header containing the given substring
pub fn column(table: &TableView, fragment: &str) -> Option<usize> {
    table.headers.iter().position(|h| h.contains(fragment))
}

/// Collect tags from every Key/Value table on the page. Keys keep their
/// first value; later duplicates are ignored.
pub fn extract_tags(doc: &Document) -> TagsData {
    let mut tags: IndexMap<String, String> = IndexMap::new();
    for table in doc.tables() {
        if classify(&table) != TableRole::Tags {
            continue;
        }
        let key_col = column(&table, "key").unwrap_or(0);
        let value_col = column(&table, "value").unwrap_or(1);
        for row in table.data_rows() {
            if let Some(key) = presence(row.cell(key_col)) {
                let value = presence(row.cell(value_col)).unwrap_or_default();
                tags.entry(key).or_insert(value);
            }
        }
    }
    TagsData::from_tags(tags)
}

/// Repair a port range whose separator the DOM serializer dropped.
///
/// A long all-digit run like `5010050500` is almost always two equal-width
/// port numbers fused together; split it at the midpoint. Anything short,
/// non-numeric or already dashed passes through untouched.
pub fn repair_port_range(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() > 5 && !trimmed.contains('-') && trimmed.chars().all(|c| c.is_ascii_digit())
    {
        let mid = trimmed.len() / 2;
        let (low, high) = trimmed.split_at(mid);
        if low.parse::<u32>().is_ok() && high.parse::<u32>().is_ok() && low != high {
            return format!("{low}-{high}");
        }
    }
    trimmed.to_string()
}
