use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One element of a rendered-page snapshot.
///
/// The AWS Console emits class names with generated suffixes
/// (`awsui_text-to-copy_ljpwc_30z5b_9`), so class matching is always
/// "contains fragment", never equality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "table", "dt")
    pub tag_name: String,

    /// Element attributes (id, class, data-testid, data-analytics, href, ...)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text belonging directly to this element (child text nodes,
    /// whitespace-collapsed), not including descendant element text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Builder method: set an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder method: set direct text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder method: append children, keeping any added earlier
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Builder method: append one child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add a child element
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// Get attribute value by key
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Get element ID
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Check if element is a specific tag (case-insensitive)
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Check if any class token contains the given fragment
    pub fn has_class_fragment(&self, fragment: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c.contains(fragment)))
            .unwrap_or(false)
    }

    /// Check if an attribute value contains the given fragment
    pub fn attr_contains(&self, key: &str, fragment: &str) -> bool {
        self.attr(key).map(|v| v.contains(fragment)).unwrap_or(false)
    }

    /// Direct text of this element, trimmed; empty string when absent
    pub fn own_text(&self) -> &str {
        self.text.as_deref().unwrap_or("").trim()
    }

    /// Concatenated text of this element and all descendants, in document
    /// order, segments joined with a single space
    pub fn deep_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        let own = self.own_text();
        if !own.is_empty() {
            parts.push(own);
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }

    /// Depth-first iterator over this element and all descendants
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First descendant (or self) matching the predicate, in document order
    pub fn find_first<P>(&self, pred: P) -> Option<&ElementNode>
    where
        P: Fn(&ElementNode) -> bool,
    {
        self.descendants().find(|node| pred(node))
    }

    /// All descendants (and self) matching the predicate, in document order
    pub fn find_all<P>(&self, pred: P) -> Vec<&ElementNode>
    where
        P: Fn(&ElementNode) -> bool,
    {
        self.descendants().filter(|node| pred(node)).collect()
    }
}

/// Depth-first, document-order traversal over an element subtree
pub struct Descendants<'a> {
    stack: Vec<&'a ElementNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a ElementNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children in reverse so they pop in document order
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ElementNode {
        ElementNode::new("div")
            .with_attr("class", "awsui_grid-column_14yj0_16am7_186 wrapper")
            .with_child(
                ElementNode::new("span")
                    .with_attr("class", "awsui_text-to-copy_ljpwc_30z5b_9")
                    .with_text("vpc-0abc123"),
            )
            .with_child(ElementNode::new("a").with_attr("href", "/vpc").with_text("open"))
    }

    #[test]
    fn test_class_fragment_matching() {
        let el = sample();
        assert!(el.has_class_fragment("grid-column"));
        assert!(el.has_class_fragment("wrapper"));
        assert!(!el.has_class_fragment("text-to-copy"));
    }

    #[test]
    fn test_deep_text_document_order() {
        let el = sample();
        assert_eq!(el.deep_text(), "vpc-0abc123 open");
    }

    #[test]
    fn test_own_text_trims() {
        let el = ElementNode::new("dt").with_text("  Instance type  ");
        assert_eq!(el.own_text(), "Instance type");
    }

    #[test]
    fn test_find_first_document_order() {
        let el = sample();
        let found = el.find_first(|n| n.has_class_fragment("text-to-copy"));
        assert_eq!(found.map(|n| n.own_text()), Some("vpc-0abc123"));
    }

    #[test]
    fn test_find_all() {
        let el = sample();
        let links = el.find_all(|n| n.is_tag("a"));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].own_text(), "open");
    }

    #[test]
    fn test_with_children_appends_after_with_child() {
        let el = ElementNode::new("table")
            .with_child(ElementNode::new("thead"))
            .with_children(vec![ElementNode::new("tr"), ElementNode::new("tr")]);
        assert_eq!(el.children.len(), 3);
        assert!(el.children[0].is_tag("thead"));
    }

    #[test]
    fn test_descendants_count() {
        let el = sample();
        assert_eq!(el.descendants().count(), 3);
    }

    #[test]
    fn test_serde_roundtrip() {
        let el = sample();
        let json = serde_json::to_string(&el).unwrap();
        let back: ElementNode = serde_json::from_str(&json).unwrap();
        assert_eq!(el, back);
    }

    #[test]
    fn test_deserialize_sparse() {
        // Snapshot script omits empty text/children entirely
        let json = r#"{"tag_name":"div","attributes":{}}"#;
        let el: ElementNode = serde_json::from_str(json).unwrap();
        assert!(el.text.is_none());
        assert!(el.children.is_empty());
    }
}
