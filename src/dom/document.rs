use crate::dom::element::ElementNode;
use crate::dom::table::TableView;
use crate::error::{HarvestError, Result};
use headless_chrome::Tab;
use std::sync::Arc;

/// A rendered-page snapshot taken from a browser tab.
///
/// All extractors operate on snapshots, never on the live tab, so the
/// heuristics stay pure and can be exercised in tests with trees built
/// by hand.
#[derive(Debug, Clone)]
pub struct Document {
    /// Root element of the snapshot (normally `<body>`)
    pub root: ElementNode,

    /// URL of the page the snapshot was taken from
    pub url: Option<String>,
}

impl Document {
    /// Create a document from an element tree (test fixtures, mostly)
    pub fn from_root(root: ElementNode) -> Self {
        Self { root, url: None }
    }

    /// Builder method: set the source URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Snapshot the DOM of a browser tab.
    ///
    /// Evaluates an injected serializer script which returns the element
    /// tree as a JSON string, then deserializes it. Descends into the EC2
    /// `#compute-react-frame` iframe when present.
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        let js_code = include_str!("snapshot.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| HarvestError::EvalFailed(format!("snapshot script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| HarvestError::DomParseFailed("snapshot returned no value".to_string()))?;

        // The script returns a JSON string, not a JSON object
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| HarvestError::DomParseFailed(format!("snapshot not a string: {}", e)))?;

        let root: ElementNode = serde_json::from_str(&json_str)
            .map_err(|e| HarvestError::DomParseFailed(format!("snapshot tree: {}", e)))?;

        let url = tab.get_url();

        Ok(Self { root, url: Some(url) })
    }

    /// Full visible text of the page, used by the pattern scanners
    pub fn visible_text(&self) -> String {
        self.root.deep_text()
    }

    /// All tables in the document, lifted into header/row views
    pub fn tables(&self) -> Vec<TableView> {
        self.root
            .find_all(|n| n.is_tag("table"))
            .into_iter()
            .filter_map(TableView::from_element)
            .collect()
    }

    /// First element matching the predicate
    pub fn find_first<P>(&self, pred: P) -> Option<&ElementNode>
    where
        P: Fn(&ElementNode) -> bool,
    {
        self.root.find_first(pred)
    }

    /// All elements matching the predicate
    pub fn find_all<P>(&self, pred: P) -> Vec<&ElementNode>
    where
        P: Fn(&ElementNode) -> bool,
    {
        self.root.find_all(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_table() -> Document {
        let table = ElementNode::new("table").with_child(
            ElementNode::new("tbody").with_child(
                ElementNode::new("tr")
                    .with_child(ElementNode::new("td").with_text("Name"))
                    .with_child(ElementNode::new("td").with_text("web-1")),
            ),
        );
        let root = ElementNode::new("body")
            .with_child(ElementNode::new("h1").with_text("Instance summary"))
            .with_child(table);
        Document::from_root(root)
    }

    #[test]
    fn test_visible_text() {
        let doc = doc_with_table();
        assert_eq!(doc.visible_text(), "Instance summary Name web-1");
    }

    #[test]
    fn test_tables_discovered() {
        let doc = doc_with_table();
        let tables = doc.tables();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 1);
    }

    #[test]
    fn test_with_url() {
        let doc = doc_with_table().with_url("https://console.aws.amazon.com/ec2/home");
        assert!(doc.url.unwrap().contains("console.aws.amazon.com"));
    }

    #[test]
    fn test_snapshot_json_shape() {
        // Matches what snapshot.js emits
        let json = r#"{
            "tag_name": "body",
            "attributes": {"class": "awsui"},
            "children": [
                {"tag_name": "span", "attributes": {}, "text": "running"}
            ]
        }"#;
        let root: ElementNode = serde_json::from_str(json).unwrap();
        let doc = Document::from_root(root);
        assert_eq!(doc.visible_text(), "running");
    }
}
