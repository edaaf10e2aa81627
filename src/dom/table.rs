use crate::dom::element::ElementNode;

/// A `<table>` subtree lifted into plain header and cell texts.
///
/// Console tables put the real cell value inside a `body-cell-content`
/// div, but deep text per cell captures it either way.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    /// Lowercased header cell texts (thead row, else a leading `<th>` row)
    pub headers: Vec<String>,

    /// Body rows
    pub rows: Vec<TableRow>,
}

/// One body row of a table
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Cell texts in column order
    pub cells: Vec<String>,

    /// Full row text, for regex scans across cells
    pub text: String,
}

impl TableRow {
    /// Heuristic for "no data" placeholder rows: a first cell containing
    /// "no " (case-insensitive), or no cells at all
    pub fn is_placeholder(&self) -> bool {
        match self.cells.first() {
            None => true,
            Some(first) => first.to_lowercase().contains("no "),
        }
    }

    /// Cell text by index, empty string when out of range
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }
}

impl TableView {
    /// Lift a `<table>` element into a view. Returns `None` when the
    /// element is not a table.
    pub fn from_element(table: &ElementNode) -> Option<Self> {
        if !table.is_tag("table") {
            return None;
        }

        let all_rows = table.find_all(|n| n.is_tag("tr"));
        if all_rows.is_empty() {
            return Some(Self { headers: Vec::new(), rows: Vec::new() });
        }

        // Header: the row under <thead> when present, else the first row
        let thead_rows: Vec<&ElementNode> = table
            .find_all(|n| n.is_tag("thead"))
            .into_iter()
            .flat_map(|head| head.find_all(|n| n.is_tag("tr")))
            .collect();

        // Without a thead, the first row is a header only when it uses
        // <th> cells; a bare <td> row is data
        let first_is_header = all_rows
            .first()
            .map(|row| !row.find_all(|n| n.is_tag("th")).is_empty())
            .unwrap_or(false);

        let (header_row, body_rows): (Option<&ElementNode>, Vec<&ElementNode>) =
            if let Some(first_head) = thead_rows.first() {
                let body = all_rows
                    .iter()
                    .copied()
                    .filter(|r| !thead_rows.iter().any(|h| std::ptr::eq(*h, *r)))
                    .collect();
                (Some(first_head), body)
            } else if first_is_header {
                (all_rows.first().copied(), all_rows.iter().copied().skip(1).collect())
            } else {
                (None, all_rows)
            };

        let headers = header_row
            .map(|row| {
                row.find_all(|n| n.is_tag("th") || n.is_tag("td"))
                    .into_iter()
                    .map(|cell| cell.deep_text().to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        let rows = body_rows
            .into_iter()
            .map(|row| TableRow {
                cells: row
                    .find_all(|n| n.is_tag("td"))
                    .into_iter()
                    .map(|cell| cell.deep_text())
                    .collect(),
                text: row.deep_text(),
            })
            .collect();

        Some(Self { headers, rows })
    }

    /// True when any header cell contains the given substring
    pub fn header_contains(&self, needle: &str) -> bool {
        self.headers.iter().any(|h| h.contains(needle))
    }

    /// Body rows with "no data" placeholders filtered out
    pub fn data_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|row| !row.is_placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(tag: &str, text: &str) -> ElementNode {
        ElementNode::new(tag).with_text(text)
    }

    fn rules_table() -> ElementNode {
        ElementNode::new("table")
            .with_child(ElementNode::new("thead").with_child(
                ElementNode::new("tr")
                    .with_child(cell("th", "Type"))
                    .with_child(cell("th", "Protocol"))
                    .with_child(cell("th", "Source")),
            ))
            .with_child(
                ElementNode::new("tbody")
                    .with_child(
                        ElementNode::new("tr")
                            .with_child(cell("td", "SSH"))
                            .with_child(cell("td", "TCP"))
                            .with_child(cell("td", "0.0.0.0/0")),
                    )
                    .with_child(
                        ElementNode::new("tr")
                            .with_child(cell("td", "No rules to display")),
                    ),
            )
    }

    #[test]
    fn test_thead_headers_lowercased() {
        let view = TableView::from_element(&rules_table()).unwrap();
        assert_eq!(view.headers, vec!["type", "protocol", "source"]);
        assert!(view.header_contains("source"));
        assert!(!view.header_contains("destination"));
    }

    #[test]
    fn test_placeholder_rows_filtered() {
        let view = TableView::from_element(&rules_table()).unwrap();
        assert_eq!(view.rows.len(), 2);
        let data: Vec<_> = view.data_rows().collect();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].cell(0), "SSH");
    }

    #[test]
    fn test_first_row_headers_without_thead() {
        let table = ElementNode::new("table")
            .with_child(
                ElementNode::new("tr")
                    .with_child(cell("th", "Key"))
                    .with_child(cell("th", "Value")),
            )
            .with_child(
                ElementNode::new("tr")
                    .with_child(cell("td", "Name"))
                    .with_child(cell("td", "web-1")),
            );
        let view = TableView::from_element(&table).unwrap();
        assert_eq!(view.headers, vec!["key", "value"]);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].cell(1), "web-1");
    }

    #[test]
    fn test_td_only_table_keeps_every_row() {
        let table = ElementNode::new("table").with_child(
            ElementNode::new("tr").with_child(cell("td", "vol-0a1b2c3d")),
        );
        let view = TableView::from_element(&table).unwrap();
        assert!(view.headers.is_empty());
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].cell(0), "vol-0a1b2c3d");
    }

    #[test]
    fn test_cell_out_of_range() {
        let view = TableView::from_element(&rules_table()).unwrap();
        assert_eq!(view.rows[0].cell(99), "");
    }

    #[test]
    fn test_non_table_rejected() {
        let div = ElementNode::new("div");
        assert!(TableView::from_element(&div).is_none());
    }

    #[test]
    fn test_nested_cell_content_div() {
        let table = ElementNode::new("table").with_child(
            ElementNode::new("tbody").with_child(
                ElementNode::new("tr").with_child(
                    ElementNode::new("td").with_child(
                        ElementNode::new("div")
                            .with_attr("class", "awsui_body-cell-content_c6tup_1wfrk_160")
                            .with_text("vol-0a1b2c3d"),
                    ),
                ),
            ),
        );
        let view = TableView::from_element(&table).unwrap();
        assert_eq!(view.rows[0].cell(0), "vol-0a1b2c3d");
    }
}
