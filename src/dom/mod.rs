//! Rendered-page snapshots and traversal.
//!
//! This module provides the element tree extractors work on:
//! - ElementNode: one element with attributes, own text, and children
//! - Document: a whole-page snapshot taken from a browser tab
//! - TableView: a table subtree lifted into header and cell texts

pub mod document;
pub mod element;
pub mod table;

pub use document::Document;
pub use element::ElementNode;
pub use table::{TableRow, TableView};
