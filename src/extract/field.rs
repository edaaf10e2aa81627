//! Labeled field extraction.
//!
//! The console renders most attributes as a label element next to a value
//! element inside a shared column/grid container. [`extract_field`] walks
//! an ordered list of strategies and takes the first hit; every value goes
//! through [`presence`] so placeholder text never leaks into a record.

use crate::dom::ElementNode;

/// Placeholder strings the console renders for absent values
const SENTINELS: &[&str] = &["N/A", "n/a", "–", "-", ""];

/// Normalize a raw DOM string: trim, then map console placeholders to
/// `None` so absence is represented uniformly.
pub fn presence(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if SENTINELS.iter().any(|s| trimmed.eq_ignore_ascii_case(s)) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Convenience: `presence` over an optional raw string
pub fn presence_opt(raw: Option<&str>) -> Option<String> {
    raw.and_then(presence)
}

/// Extract the value for a labeled field anywhere under `root`.
///
/// Strategies, in order:
/// 1. A `data-analytics="label-for-…"` element whose text contains the
///    label, resolved to a value within its nearest column/grid container.
/// 2. A `<dt>` containing the label, paired with its following `<dd>`.
pub fn extract_field(root: &ElementNode, label: &str) -> Option<String> {
    // Exact label text first, so "Name" cannot land on "AMI name"
    by_analytics_label(root, label, true)
        .or_else(|| by_analytics_label(root, label, false))
        .or_else(|| by_definition_list(root, label))
}

/// Extract a field and fall back through alternate label spellings.
/// The console is not consistent about wording across services.
pub fn extract_field_any(root: &ElementNode, labels: &[&str]) -> Option<String> {
    labels.iter().find_map(|label| extract_field(root, label))
}

/// Exact-label extraction only. Required for short labels like "Name"
/// that are substrings of other labels on the same page.
pub fn extract_field_exact(root: &ElementNode, label: &str) -> Option<String> {
    by_analytics_label(root, label, true)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Strategy 1: analytics-tagged label inside a column/grid container.
fn by_analytics_label(root: &ElementNode, label: &str, exact: bool) -> Option<String> {
    let mut stack: Vec<&ElementNode> = Vec::new();
    let mut found: Option<String> = None;
    walk_labels(root, label, exact, &mut stack, &mut found);
    found
}

/// Depth-first walk tracking the ancestor chain, so a matching label can
/// climb to its container without parent pointers.
fn walk_labels<'a>(
    node: &'a ElementNode,
    label: &str,
    exact: bool,
    ancestors: &mut Vec<&'a ElementNode>,
    found: &mut Option<String>,
) {
    if found.is_some() {
        return;
    }
    if is_label_node(node, label, exact) {
        let container = ancestors
            .iter()
            .rev()
            .find(|a| a.has_class_fragment("column") || a.has_class_fragment("grid"));
        if let Some(container) = container {
            if let Some(value) = value_from_container(container, label) {
                *found = Some(value);
                return;
            }
        }
    }
    ancestors.push(node);
    for child in &node.children {
        walk_labels(child, label, exact, ancestors, found);
        if found.is_some() {
            break;
        }
    }
    ancestors.pop();
}

fn is_label_node(node: &ElementNode, label: &str, exact: bool) -> bool {
    match node.attr("data-analytics") {
        Some(value) if value.starts_with("label-for-") => {
            let text = node.deep_text();
            if exact {
                text.trim().eq_ignore_ascii_case(label)
            } else {
                contains_ignore_case(&text, label)
            }
        }
        _ => false,
    }
}

/// Pick the value element inside a label's container: a copy widget wins,
/// then the last link, then the container text with the label stripped.
fn value_from_container(container: &ElementNode, label: &str) -> Option<String> {
    if let Some(copy) = container.find_first(|n| n.has_class_fragment("text-to-copy")) {
        return presence(&copy.deep_text());
    }
    if let Some(link) = container.find_all(|n| n.is_tag("a")).last() {
        return presence(&link.deep_text());
    }
    let text = container.deep_text();
    presence(strip_label_prefix(&text, label))
}

/// Remove a leading label (and trailing separator) from the combined
/// container text, case-insensitively. Offsets are tracked on the
/// original text, not a lowered copy; lowercasing can change byte
/// length (e.g. `İ`) and a cross-indexed slice would split a char.
fn strip_label_prefix<'a>(text: &'a str, label: &str) -> &'a str {
    let label_lower = label.to_lowercase();
    if label_lower.is_empty() {
        return text;
    }
    for (start, _) in text.char_indices() {
        if let Some(len) = label_match_len(&text[start..], &label_lower) {
            return text[start + len..].trim_start_matches([':', ' ', '\u{a0}']);
        }
    }
    text
}

/// Byte length of a prefix of `text` whose lowercase form equals
/// `label_lower`, if there is one.
fn label_match_len(text: &str, label_lower: &str) -> Option<usize> {
    let mut lowered = String::new();
    for (idx, c) in text.char_indices() {
        lowered.extend(c.to_lowercase());
        if lowered.len() >= label_lower.len() {
            return (lowered == label_lower).then_some(idx + c.len_utf8());
        }
        if !label_lower.starts_with(&lowered) {
            return None;
        }
    }
    None
}

/// Strategy 2: `<dt>` / `<dd>` definition pairs.
fn by_definition_list(root: &ElementNode, label: &str) -> Option<String> {
    let mut found: Option<String> = None;
    walk_definitions(root, label, &mut found);
    found
}

fn walk_definitions(node: &ElementNode, label: &str, found: &mut Option<String>) {
    if found.is_some() {
        return;
    }
    let mut pending_match = false;
    for child in &node.children {
        if pending_match && child.is_tag("dd") {
            if let Some(value) = presence(&child.deep_text()) {
                *found = Some(value);
                return;
            }
            pending_match = false;
        }
        if child.is_tag("dt") {
            pending_match = contains_ignore_case(&child.deep_text(), label);
        }
        walk_definitions(child, label, found);
        if found.is_some() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    fn labeled_column(label: &str, value_node: ElementNode) -> ElementNode {
        ElementNode::new("div")
            .with_attr("class", "awsui_column_layout_abc123")
            .with_children(vec![
                ElementNode::new("span")
                    .with_attr("data-analytics", format!("label-for-{label}"))
                    .with_text(label),
                value_node,
            ])
    }

    #[test]
    fn test_presence_maps_placeholders_to_none() {
        assert_eq!(presence("  i-0abc  "), Some("i-0abc".to_string()));
        assert_eq!(presence("N/A"), None);
        assert_eq!(presence("–"), None);
        assert_eq!(presence("-"), None);
        assert_eq!(presence("   "), None);
    }

    #[test]
    fn test_extract_prefers_copy_widget() {
        let root = ElementNode::new("body").with_child(labeled_column(
            "Instance ID",
            ElementNode::new("div")
                .with_attr("class", "awsui_text-to-copy_xyz")
                .with_text("i-0abc12345def67890"),
        ));
        assert_eq!(
            extract_field(&root, "Instance ID"),
            Some("i-0abc12345def67890".to_string())
        );
    }

    #[test]
    fn test_extract_takes_last_link() {
        let root = ElementNode::new("body").with_child(labeled_column(
            "VPC ID",
            ElementNode::new("div").with_children(vec![
                ElementNode::new("a").with_text("open"),
                ElementNode::new("a").with_text("vpc-0aa11bb22cc33dd44"),
            ]),
        ));
        assert_eq!(
            extract_field(&root, "VPC ID"),
            Some("vpc-0aa11bb22cc33dd44".to_string())
        );
    }

    #[test]
    fn test_extract_strips_label_from_plain_text() {
        let root = ElementNode::new("body").with_child(labeled_column(
            "Tenancy",
            ElementNode::new("span").with_text("default"),
        ));
        assert_eq!(extract_field(&root, "Tenancy"), Some("default".to_string()));
    }

    #[test]
    fn test_extract_survives_multibyte_container_text() {
        // "İ" lowercases to two chars and grows by a byte, so label
        // offsets must come from the original text
        let root = ElementNode::new("body").with_child(
            ElementNode::new("div")
                .with_attr("class", "awsui_column_layout_abc123")
                .with_child(
                    ElementNode::new("span")
                        .with_attr("data-analytics", "label-for-Tenancy")
                        .with_text("İİzone Tenancy éx"),
                ),
        );
        assert_eq!(extract_field(&root, "Tenancy"), Some("éx".to_string()));
    }

    #[test]
    fn test_extract_dt_dd_fallback() {
        let root = ElementNode::new("dl").with_children(vec![
            ElementNode::new("dt").with_text("Availability Zone"),
            ElementNode::new("dd").with_text("us-east-1a"),
        ]);
        assert_eq!(
            extract_field(&root, "availability zone"),
            Some("us-east-1a".to_string())
        );
    }

    #[test]
    fn test_extract_missing_label_is_none() {
        let root = ElementNode::new("body").with_child(labeled_column(
            "Instance ID",
            ElementNode::new("span").with_text("i-0abc12345def67890"),
        ));
        assert_eq!(extract_field(&root, "Elastic IP"), None);
        assert_eq!(extract_field_exact(&root, "Name"), None);
    }

    #[test]
    fn test_extract_placeholder_value_is_absent() {
        let root = ElementNode::new("body").with_child(labeled_column(
            "Placement group",
            ElementNode::new("span").with_text("–"),
        ));
        assert_eq!(extract_field(&root, "Placement group"), None);
    }

    #[test]
    fn test_extract_field_any_tries_alternates() {
        let root = ElementNode::new("body").with_child(labeled_column(
            "Key pair assigned at launch",
            ElementNode::new("span").with_text("prod-key"),
        ));
        assert_eq!(
            extract_field_any(&root, &["Key pair name", "Key pair assigned at launch"]),
            Some("prod-key".to_string())
        );
    }
}
