//! The live document the editor manipulates.
//!
//! Markup is parsed with html5ever into an arena [`Document`]. The editing
//! root is the `<body>` element; everything the editor addresses lives under
//! it.
//!
//! ```
//! use vitrine::dom::{Document, SerializeOptions};
//!
//! let doc = Document::parse("<h1>Spring</h1><p>New arrivals</p>");
//! let body = doc.body().unwrap();
//! assert_eq!(doc.element_children(body).count(), 2);
//! assert_eq!(doc.inner_html(body, SerializeOptions::CLEAN), "<h1>Spring</h1><p>New arrivals</p>");
//! ```

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, Document, Node, NodeData, NodeId};
pub use serialize::{SerializeOptions, escape_attr, escape_text, inner_html, outer_html};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::DocumentSink;

/// Prefix shared by every attribute the editor writes for its own
/// bookkeeping. These never reach persisted or exported markup.
pub const BOOKKEEPING_PREFIX: &str = "data-vt-";

/// Stable per-element identifier assigned after every rebuild.
pub const NODE_ID_ATTR: &str = "data-vt-id";

/// Present on the element under the pointer.
pub const HOVERED_ATTR: &str = "data-vt-hovered";

/// Present on the selected element.
pub const SELECTED_ATTR: &str = "data-vt-selected";

/// Scopes generated `:hover` rules to one element.
pub const HOVER_KEY_ATTR: &str = "data-vt-hover-key";

/// Marks the `<style>` element holding the generated hover rules.
pub const HOVER_SHEET_ATTR: &str = "data-vt-hover-sheet";

pub fn is_bookkeeping_attr(name: &str) -> bool {
    name.starts_with(BOOKKEEPING_PREFIX)
}

impl Document {
    /// Parse a full HTML document or a body fragment. Fragments are placed
    /// inside a synthesized `<body>` by the HTML tree builder.
    pub fn parse(html: &str) -> Document {
        let sink = DocumentSink::new();
        parse_document(sink, ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
            .into_document()
    }

    /// Replace the children of `parent` with the nodes parsed from `html`.
    ///
    /// The fragment is parsed as a body so that `<tr>` and friends follow
    /// the usual recovery rules.
    pub fn set_inner_html(&mut self, parent: NodeId, html: &str) {
        let parsed = Document::parse(html);
        self.clear_children(parent);
        let Some(source_body) = parsed.body() else {
            return;
        };
        let children: Vec<_> = parsed.children(source_body).collect();
        for child in children {
            let copied = self.import(&parsed, child);
            self.append(parent, copied);
        }
    }

    /// Deep-copy `node` from another document into this one, detached.
    pub fn import(&mut self, other: &Document, node: NodeId) -> NodeId {
        let data = match other.get(node) {
            Some(n) => n.data.clone(),
            None => return NodeId::NONE,
        };
        let copied = match data {
            NodeData::Element { name, attrs, .. } => self.create_element(name, attrs),
            NodeData::Text(text) => self.create_text(text),
            NodeData::Comment(text) => self.create_comment(text),
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => self.create_doctype(name, public_id, system_id),
            NodeData::Document => return NodeId::NONE,
        };
        let children: Vec<_> = other.children(node).collect();
        for child in children {
            let child_copy = self.import(other, child);
            if child_copy.is_some() {
                self.append(copied, child_copy);
            }
        }
        copied
    }

    /// Give every element under `root` lacking one a unique
    /// [`NODE_ID_ATTR`]. `next` is the counter shared across rebuilds;
    /// returns how many ids were assigned.
    pub fn assign_node_ids(&mut self, root: NodeId, next: &mut u64) -> usize {
        let mut assigned = 0;
        for id in self.descendants(root) {
            if self.is_element(id) && self.attr(id, NODE_ID_ATTR).is_none() {
                *next += 1;
                let value = format!("vt-{next}");
                self.set_attr(id, NODE_ID_ATTR, &value);
                assigned += 1;
            }
        }
        assigned
    }

    /// Look an element up by its [`NODE_ID_ATTR`].
    pub fn find_by_node_key(&self, root: NodeId, key: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.attr(id, NODE_ID_ATTR) == Some(key))
    }

    pub fn inner_html(&self, node: NodeId, options: SerializeOptions) -> String {
        inner_html(self, node, options)
    }

    pub fn outer_html(&self, node: NodeId, options: SerializeOptions) -> String {
        outer_html(self, node, options)
    }
}
